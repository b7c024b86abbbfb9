//! State of a single document's room
//!
//! All expiry here is timestamp-based: entries store an `expires_at` deadline
//! and are reclaimed lazily on the next access and by the periodic reaper.
//! No per-entry timer handles exist to leak on rapid refresh.

use chrono::{DateTime, Utc};
use collab_core::{FieldName, UserId};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// An exclusive, TTL-bound claim on a document field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLock {
    pub holder: UserId,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl FieldLock {
    /// Whether the lock has passed its deadline
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// An ephemeral typing flag with an auto-clear deadline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingState {
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TypingState {
    /// Whether the auto-clear window has elapsed
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Outcome of a lock acquisition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockAttempt {
    /// Lock granted; `refreshed` is true when the caller already held it
    Granted { refreshed: bool },
    /// An unexpired lock is held by someone else
    Denied { holder: UserId },
}

/// Outcome of a lock release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The caller held the lock and it was removed
    Released,
    /// The lock had already expired; it was reclaimed on this access
    Expired,
    /// No lock, or held by someone else (benign no-op, not an error)
    Noop,
}

/// Expired entries found by a sweep
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RoomSweep {
    pub expired_locks: Vec<FieldName>,
    pub expired_typing: Vec<UserId>,
}

/// Membership, locks, and typing state for one document
///
/// Mutated only through the per-document exclusion of [`super::RoomIndex`],
/// so every method here can assume it is the sole writer.
#[derive(Debug, Default)]
pub struct RoomState {
    members: HashSet<UserId>,
    locks: HashMap<FieldName, FieldLock>,
    typing: HashMap<UserId, TypingState>,
}

impl RoomState {
    /// Create an empty room
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- membership ---

    /// Add a member; returns false if already present
    pub fn insert_member(&mut self, user_id: UserId) -> bool {
        self.members.insert(user_id)
    }

    /// Remove a member; returns false if not present (idempotent)
    pub fn remove_member(&mut self, user_id: UserId) -> bool {
        self.members.remove(&user_id)
    }

    /// Whether the user is a member
    #[must_use]
    pub fn contains(&self, user_id: UserId) -> bool {
        self.members.contains(&user_id)
    }

    /// Unordered member snapshot
    #[must_use]
    pub fn members(&self) -> Vec<UserId> {
        self.members.iter().copied().collect()
    }

    /// Number of members
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    // --- field locks ---

    /// Try to acquire an exclusive lock on a field
    ///
    /// Succeeds when no unexpired lock exists or when the caller already
    /// holds it (idempotent TTL refresh, never a duplicate record). An
    /// expired lock found here is dropped before the grant (lazy expiry).
    pub fn acquire_lock(
        &mut self,
        field: &FieldName,
        user_id: UserId,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> LockAttempt {
        if let Some(existing) = self.locks.get(field) {
            if !existing.is_expired(now) {
                if existing.holder == user_id {
                    let acquired_at = existing.acquired_at;
                    self.locks.insert(
                        field.clone(),
                        FieldLock {
                            holder: user_id,
                            acquired_at,
                            expires_at: now + ttl,
                        },
                    );
                    return LockAttempt::Granted { refreshed: true };
                }
                return LockAttempt::Denied {
                    holder: existing.holder,
                };
            }
        }

        self.locks.insert(
            field.clone(),
            FieldLock {
                holder: user_id,
                acquired_at: now,
                expires_at: now + ttl,
            },
        );
        LockAttempt::Granted { refreshed: false }
    }

    /// Release a lock; only the current holder's release has effect
    pub fn release_lock(
        &mut self,
        field: &FieldName,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> ReleaseOutcome {
        match self.locks.get(field) {
            Some(lock) if lock.is_expired(now) => {
                self.locks.remove(field);
                ReleaseOutcome::Expired
            }
            Some(lock) if lock.holder == user_id => {
                self.locks.remove(field);
                ReleaseOutcome::Released
            }
            _ => ReleaseOutcome::Noop,
        }
    }

    /// Drop every lock a user holds, returning the affected fields
    pub fn release_locks_of(&mut self, user_id: UserId) -> Vec<FieldName> {
        let fields: Vec<FieldName> = self
            .locks
            .iter()
            .filter(|(_, lock)| lock.holder == user_id)
            .map(|(field, _)| field.clone())
            .collect();

        for field in &fields {
            self.locks.remove(field);
        }
        fields
    }

    /// Current unexpired lock on a field
    #[must_use]
    pub fn lock_on(&self, field: &FieldName, now: DateTime<Utc>) -> Option<&FieldLock> {
        self.locks.get(field).filter(|lock| !lock.is_expired(now))
    }

    /// Snapshot of all unexpired locks
    #[must_use]
    pub fn active_locks(&self, now: DateTime<Utc>) -> Vec<(FieldName, FieldLock)> {
        self.locks
            .iter()
            .filter(|(_, lock)| !lock.is_expired(now))
            .map(|(field, lock)| (field.clone(), lock.clone()))
            .collect()
    }

    // --- typing ---

    /// Create or refresh a typing flag; refreshing replaces the deadline
    /// rather than stacking a second one
    pub fn start_typing(&mut self, user_id: UserId, ttl: Duration, now: DateTime<Utc>) -> bool {
        let previous = self.typing.insert(
            user_id,
            TypingState {
                started_at: now,
                expires_at: now + ttl,
            },
        );
        // true when this is a fresh start (or the previous flag had lapsed)
        previous.is_none_or(|t| t.is_expired(now))
    }

    /// Explicitly clear a typing flag; returns true if an unexpired flag
    /// was present
    pub fn stop_typing(&mut self, user_id: UserId, now: DateTime<Utc>) -> bool {
        self.typing
            .remove(&user_id)
            .is_some_and(|t| !t.is_expired(now))
    }

    /// Users with an unexpired typing flag
    #[must_use]
    pub fn typing_users(&self, now: DateTime<Utc>) -> Vec<UserId> {
        self.typing
            .iter()
            .filter(|(_, t)| !t.is_expired(now))
            .map(|(user, _)| *user)
            .collect()
    }

    /// Drop a user's typing flag without caring about expiry
    pub fn clear_typing(&mut self, user_id: UserId) -> bool {
        self.typing.remove(&user_id).is_some()
    }

    // --- sweep ---

    /// Remove every expired lock and typing flag, reporting what was
    /// reclaimed (reaper backstop)
    pub fn sweep(&mut self, now: DateTime<Utc>) -> RoomSweep {
        let expired_locks: Vec<FieldName> = self
            .locks
            .iter()
            .filter(|(_, lock)| lock.is_expired(now))
            .map(|(field, _)| field.clone())
            .collect();
        for field in &expired_locks {
            self.locks.remove(field);
        }

        let expired_typing: Vec<UserId> = self
            .typing
            .iter()
            .filter(|(_, t)| t.is_expired(now))
            .map(|(user, _)| *user)
            .collect();
        for user in &expired_typing {
            self.typing.remove(user);
        }

        RoomSweep {
            expired_locks,
            expired_typing,
        }
    }

    /// Whether the room holds no state at all and can be pruned
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.locks.is_empty() && self.typing.is_empty()
    }
}
