//! Per-document room index
//!
//! Wraps a `DashMap` so that every mutation of one document's membership,
//! locks, and typing state runs under that document's exclusive entry guard.
//! That guard is the single dispatch point per document: two users racing to
//! acquire the same field lock are serialized here and yield exactly one
//! winner, and events published while the guard is held reach subscribers in
//! publish order.

use super::RoomState;
use collab_core::{DocumentId, UserId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Index of all rooms with per-document exclusion
pub struct RoomIndex {
    rooms: DashMap<DocumentId, RoomState>,
}

impl RoomIndex {
    /// Create an empty index
    #[must_use]
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Run a mutation under the document's entry guard, creating the room on
    /// first use and pruning it when the mutation leaves it empty
    pub fn with_room<R>(
        &self,
        doc: &DocumentId,
        f: impl FnOnce(&mut RoomState) -> R,
    ) -> R {
        match self.rooms.entry(doc.clone()) {
            Entry::Occupied(mut occupied) => {
                let result = f(occupied.get_mut());
                if occupied.get().is_empty() {
                    occupied.remove();
                }
                result
            }
            Entry::Vacant(vacant) => {
                let mut room = RoomState::new();
                let result = f(&mut room);
                if !room.is_empty() {
                    vacant.insert(room);
                }
                result
            }
        }
    }

    /// Run a mutation only if the room exists (never creates), pruning after
    pub fn with_existing_room<R>(
        &self,
        doc: &DocumentId,
        f: impl FnOnce(&mut RoomState) -> R,
    ) -> Option<R> {
        match self.rooms.entry(doc.clone()) {
            Entry::Occupied(mut occupied) => {
                let result = f(occupied.get_mut());
                if occupied.get().is_empty() {
                    occupied.remove();
                }
                Some(result)
            }
            Entry::Vacant(_) => None,
        }
    }

    /// Read-only access to a room's state
    pub fn read_room<R>(&self, doc: &DocumentId, f: impl FnOnce(&RoomState) -> R) -> Option<R> {
        self.rooms.get(doc).map(|room| f(&room))
    }

    /// Visit every room mutably (reaper sweep), pruning emptied rooms after
    pub fn for_each_room(&self, mut f: impl FnMut(&DocumentId, &mut RoomState)) {
        for mut entry in self.rooms.iter_mut() {
            let doc = entry.key().clone();
            f(&doc, entry.value_mut());
        }
        self.rooms.retain(|_, room| !room.is_empty());
    }

    /// Documents where the user is currently a member
    pub fn documents_of(&self, user_id: UserId) -> Vec<DocumentId> {
        self.rooms
            .iter()
            .filter(|entry| entry.value().contains(user_id))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Number of live rooms
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for RoomIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RoomIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomIndex")
            .field("rooms", &self.rooms.len())
            .finish()
    }
}
