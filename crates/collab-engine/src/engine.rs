//! Collaboration engine facade
//!
//! The single coordinator over sessions, presence, rooms, and fan-out. All
//! shared maps stay encapsulated here; callers only see the atomic
//! operations below. Every mutation of one document's membership, locks, or
//! typing state runs (and publishes its events) under that document's entry
//! guard in the room index.
//!
//! This engine is single-process by design. Running more than one instance
//! requires moving room and lock state into a shared store with atomic
//! conditional set/delete, at which point unreachable state maps to
//! `CollabError::ServiceUnavailable`.

use crate::dispatch::Dispatcher;
use crate::presence::PresenceTracker;
use crate::room::{LockAttempt, ReleaseOutcome, RoomIndex};
use crate::session::{Session, SessionRegistry};
use chrono::{DateTime, Utc};
use collab_common::{CollabConfig, LockConfig, PresenceConfig, TypingConfig};
use collab_core::{
    CollabError, CollabEventType, CollabResult, DocumentId, DocumentMutatedPayload,
    FieldLockDeniedPayload, FieldLockPayload, FieldName, FieldPayload, PresenceChangedPayload,
    PresenceStatus, RosterEntry, TypingPayload, UserId, UserJoinedPayload, UserLeftPayload,
    UserProfile,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Engine tuning: idle thresholds, TTLs, and policy flags
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineConfig {
    pub presence: PresenceConfig,
    pub locks: LockConfig,
    pub typing: TypingConfig,
}

impl From<&CollabConfig> for EngineConfig {
    fn from(config: &CollabConfig) -> Self {
        Self {
            presence: config.presence,
            locks: config.locks,
            typing: config.typing,
        }
    }
}

/// Response to a successful join: who is here and what is locked
#[derive(Debug, Clone, Serialize)]
pub struct JoinInfo {
    pub document: DocumentId,
    pub roster: Vec<RosterEntry>,
    pub locks: Vec<ActiveLock>,
}

/// One unexpired lock in a join snapshot
#[derive(Debug, Clone, Serialize)]
pub struct ActiveLock {
    pub field: FieldName,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

/// A document mutation request; `changes` is opaque to this subsystem
#[derive(Debug, Clone)]
pub struct MutationSpec {
    /// Field the mutation claims to edit, checked against lock ownership
    pub field: Option<FieldName>,
    pub changes: serde_json::Value,
}

/// The collaboration engine
pub struct CollabEngine {
    registry: Arc<SessionRegistry>,
    presence: PresenceTracker,
    rooms: RoomIndex,
    dispatcher: Dispatcher,
    config: EngineConfig,
}

impl CollabEngine {
    /// Create an engine with the given configuration
    #[must_use]
    pub fn new(config: EngineConfig) -> Arc<Self> {
        let registry = Arc::new(SessionRegistry::new());
        let dispatcher = Dispatcher::new(registry.clone());

        Arc::new(Self {
            registry,
            presence: PresenceTracker::new(config.presence.activity_clears_busy),
            rooms: RoomIndex::new(),
            dispatcher,
            config,
        })
    }

    // --- session lifecycle ---

    /// Register an authenticated connection and bring the user online
    pub fn connect(
        &self,
        user_id: UserId,
        profile: UserProfile,
        sender: mpsc::Sender<collab_core::CollabEvent>,
    ) -> Arc<Session> {
        let session = Session::new(user_id, profile.clone(), sender);
        self.registry.add(session.clone());

        if let Some(change) = self.presence.set_online(user_id, profile, Utc::now()) {
            self.broadcast_presence(user_id, change.to);
        }

        tracing::info!(
            session_id = %session.session_id(),
            user_id = %user_id,
            "Session connected"
        );

        session
    }

    /// Tear down a session, synchronously cleaning presence, membership, and
    /// locks before the connection is considered closed
    pub fn disconnect(&self, session_id: &str) {
        let Some(session) = self.registry.remove(session_id) else {
            return;
        };
        let user_id = session.user_id();

        // The room this session was joined to loses the user unless another
        // of their sessions is still there
        if let Some(doc) = session.joined_document() {
            if !self.registry.user_joined_to(user_id, &doc) {
                self.evict_from_room(&doc, user_id);
            }
        }

        let last_session = self.registry.user_session_count(user_id) == 0;
        if last_session || self.config.presence.presence_per_connection {
            self.set_offline(user_id);
        }

        tracing::info!(
            session_id = %session_id,
            user_id = %user_id,
            last_session = last_session,
            "Session disconnected"
        );
    }

    // --- presence ---

    /// Record client activity, restoring `Online` per policy
    pub fn record_activity(&self, user_id: UserId) {
        if let Some(change) = self.presence.record_activity(user_id, Utc::now()) {
            self.broadcast_presence(user_id, change.to);
        }
    }

    /// Explicitly set a presence status; `Offline` runs the full cleanup
    pub fn set_status(&self, user_id: UserId, status: PresenceStatus) {
        if status == PresenceStatus::Offline {
            self.set_offline(user_id);
            return;
        }

        if let Some(change) = self.presence.set_status(user_id, status, Utc::now()) {
            self.broadcast_presence(user_id, change.to);
        }
    }

    /// Cleanup entry point: remove the user from every room they belong to,
    /// reclaim their locks, and drop the presence record
    pub fn set_offline(&self, user_id: UserId) {
        for doc in self.rooms.documents_of(user_id) {
            self.evict_from_room(&doc, user_id);
        }

        // Detach surviving sessions so stale membership cannot be rebuilt
        // from the document index; clients re-join explicitly
        for session in self.registry.sessions_for_user(user_id) {
            self.registry.detach_document(&session);
        }

        if self.presence.remove(user_id).is_some() {
            tracing::debug!(user_id = %user_id, "User offline, state reclaimed");
        }
    }

    /// Current presence status of a user
    pub fn presence_of(&self, user_id: UserId) -> PresenceStatus {
        self.presence.status_of(user_id)
    }

    // --- rooms ---

    /// Join a document's room, returning the roster and lock snapshot
    pub fn join_document(&self, session: &Session, doc: &DocumentId) -> CollabResult<JoinInfo> {
        let user_id = session.user_id();
        let now = Utc::now();
        self.record_activity(user_id);

        // A user reaped offline while the connection stayed open recovers
        // presence by re-joining; activity alone cannot revive a removed
        // record
        if self.presence.get(user_id).is_none() {
            if let Some(change) = self.presence.set_online(user_id, session.profile().clone(), now)
            {
                self.broadcast_presence(user_id, change.to);
            }
        }

        // A session is in at most one room; joining elsewhere leaves first
        if let Some(previous) = session.joined_document() {
            if previous != *doc {
                self.leave_document(session, &previous)?;
            }
        }

        self.registry.attach_document(session, doc);

        let info = self.rooms.with_room(doc, |room| {
            let newly_joined = room.insert_member(user_id);

            if newly_joined {
                self.dispatcher.publish(
                    doc,
                    CollabEventType::UserJoined,
                    &UserJoinedPayload {
                        user_id,
                        profile: session.profile().clone(),
                    },
                    Some(user_id),
                );
            }

            let roster = room
                .members()
                .into_iter()
                .map(|member| RosterEntry {
                    user_id: member,
                    profile: self
                        .presence
                        .get(member)
                        .map(|record| record.profile)
                        .unwrap_or_default(),
                    status: self.presence.status_of(member),
                })
                .collect();

            let locks = room
                .active_locks(now)
                .into_iter()
                .map(|(field, lock)| ActiveLock {
                    field,
                    user_id: lock.holder,
                    expires_at: lock.expires_at,
                })
                .collect();

            JoinInfo {
                document: doc.clone(),
                roster,
                locks,
            }
        });

        tracing::debug!(
            session_id = %session.session_id(),
            user_id = %user_id,
            document = %doc,
            "Joined document"
        );

        Ok(info)
    }

    /// Leave a document's room; a no-op if the session never joined
    pub fn leave_document(&self, session: &Session, doc: &DocumentId) -> CollabResult<()> {
        let user_id = session.user_id();
        self.record_activity(user_id);

        if !session.is_joined_to(doc) {
            return Ok(());
        }
        self.registry.detach_document(session);

        // Membership follows sessions: another tab may still be in the room
        if !self.registry.user_joined_to(user_id, doc) {
            self.rooms.with_existing_room(doc, |room| {
                if room.remove_member(user_id) {
                    // A voluntary leave releases the user's locks cleanly
                    for field in room.release_locks_of(user_id) {
                        self.dispatcher.publish(
                            doc,
                            CollabEventType::FieldUnlocked,
                            &FieldPayload { field },
                            None,
                        );
                    }
                    if room.clear_typing(user_id) {
                        self.dispatcher.publish(
                            doc,
                            CollabEventType::TypingStopped,
                            &TypingPayload { user_id },
                            Some(user_id),
                        );
                    }
                    self.dispatcher.publish(
                        doc,
                        CollabEventType::UserLeft,
                        &UserLeftPayload { user_id },
                        Some(user_id),
                    );
                }
            });
        }

        Ok(())
    }

    /// Unordered membership snapshot
    pub fn members(&self, doc: &DocumentId) -> Vec<UserId> {
        self.rooms
            .read_room(doc, crate::room::RoomState::members)
            .unwrap_or_default()
    }

    // --- field locks ---

    /// Acquire (or heartbeat-refresh) an exclusive lock on a field
    pub fn lock_field(
        &self,
        session: &Session,
        doc: &DocumentId,
        field: &FieldName,
    ) -> CollabResult<()> {
        let user_id = session.user_id();
        self.record_activity(user_id);
        let now = Utc::now();

        let attempt = self
            .rooms
            .with_existing_room(doc, |room| {
                if !room.contains(user_id) {
                    return Err(CollabError::NotInRoom(doc.clone()));
                }

                let attempt = room.acquire_lock(field, user_id, self.config.locks.ttl(), now);
                match &attempt {
                    LockAttempt::Granted { refreshed } => {
                        // A refresh extends the TTL without re-announcing
                        if !refreshed {
                            self.dispatcher.publish(
                                doc,
                                CollabEventType::FieldLocked,
                                &FieldLockPayload {
                                    field: field.clone(),
                                    user_id,
                                },
                                Some(user_id),
                            );
                        }
                    }
                    LockAttempt::Denied { holder } => {
                        self.dispatcher.publish_to_user(
                            doc,
                            CollabEventType::FieldLockDenied,
                            &FieldLockDeniedPayload {
                                field: field.clone(),
                                holder: *holder,
                            },
                            user_id,
                        );
                    }
                }
                Ok(attempt)
            })
            .ok_or_else(|| CollabError::NotInRoom(doc.clone()))??;

        match attempt {
            LockAttempt::Granted { .. } => Ok(()),
            LockAttempt::Denied { holder } => Err(CollabError::LockHeld {
                field: field.clone(),
                holder,
            }),
        }
    }

    /// Release a lock; releasing a lock you do not hold is a benign no-op
    pub fn unlock_field(
        &self,
        session: &Session,
        doc: &DocumentId,
        field: &FieldName,
    ) -> CollabResult<()> {
        let user_id = session.user_id();
        self.record_activity(user_id);
        let now = Utc::now();

        self.rooms
            .with_existing_room(doc, |room| {
                if !room.contains(user_id) {
                    return Err(CollabError::NotInRoom(doc.clone()));
                }

                match room.release_lock(field, user_id, now) {
                    ReleaseOutcome::Released => {
                        self.dispatcher.publish(
                            doc,
                            CollabEventType::FieldUnlocked,
                            &FieldPayload {
                                field: field.clone(),
                            },
                            None,
                        );
                    }
                    ReleaseOutcome::Expired => {
                        self.dispatcher.publish(
                            doc,
                            CollabEventType::FieldLockExpired,
                            &FieldPayload {
                                field: field.clone(),
                            },
                            None,
                        );
                    }
                    ReleaseOutcome::Noop => {}
                }
                Ok(())
            })
            .ok_or_else(|| CollabError::NotInRoom(doc.clone()))?
    }

    // --- typing ---

    /// Set or clear a typing indicator
    pub fn set_typing(
        &self,
        session: &Session,
        doc: &DocumentId,
        is_typing: bool,
    ) -> CollabResult<()> {
        let user_id = session.user_id();
        self.record_activity(user_id);
        let now = Utc::now();

        self.rooms
            .with_existing_room(doc, |room| {
                if !room.contains(user_id) {
                    return Err(CollabError::NotInRoom(doc.clone()));
                }

                if is_typing {
                    // Fresh starts broadcast; in-window refreshes only move
                    // the deadline
                    if room.start_typing(user_id, self.config.typing.ttl(), now) {
                        self.dispatcher.publish(
                            doc,
                            CollabEventType::TypingStarted,
                            &TypingPayload { user_id },
                            Some(user_id),
                        );
                    }
                } else if room.stop_typing(user_id, now) {
                    self.dispatcher.publish(
                        doc,
                        CollabEventType::TypingStopped,
                        &TypingPayload { user_id },
                        Some(user_id),
                    );
                }
                Ok(())
            })
            .ok_or_else(|| CollabError::NotInRoom(doc.clone()))?
    }

    /// Users currently typing in a document
    pub fn typing_users(&self, doc: &DocumentId) -> Vec<UserId> {
        let now = Utc::now();
        self.rooms
            .read_room(doc, |room| room.typing_users(now))
            .unwrap_or_default()
    }

    // --- mutations ---

    /// Relay an opaque document mutation, enforcing lock ownership when the
    /// caller names a field
    pub fn mutate_document(
        &self,
        session: &Session,
        doc: &DocumentId,
        mutation: MutationSpec,
    ) -> CollabResult<()> {
        let user_id = session.user_id();
        self.record_activity(user_id);
        let now = Utc::now();

        self.rooms
            .with_existing_room(doc, |room| {
                if !room.contains(user_id) {
                    return Err(CollabError::NotInRoom(doc.clone()));
                }

                if let Some(field) = &mutation.field {
                    if let Some(lock) = room.lock_on(field, now) {
                        if lock.holder != user_id {
                            return Err(CollabError::LockHeld {
                                field: field.clone(),
                                holder: lock.holder,
                            });
                        }
                    }
                }

                self.dispatcher.publish(
                    doc,
                    CollabEventType::DocumentMutated,
                    &DocumentMutatedPayload {
                        changes: mutation.changes.clone(),
                        author_user_id: user_id,
                    },
                    Some(user_id),
                );
                Ok(())
            })
            .ok_or_else(|| CollabError::NotInRoom(doc.clone()))?
    }

    // --- reaper entry points ---

    /// One sweep pass at an explicit instant (deterministic for tests)
    pub fn sweep_at(&self, now: DateTime<Utc>) {
        // Backstop for connections that vanished without a clean close
        for session_id in self.registry.closed_sessions() {
            self.disconnect(&session_id);
        }

        // Presence decay
        let (to_away, to_offline) = self.presence.decay(
            now,
            self.config.presence.away_after(),
            self.config.presence.offline_after(),
        );
        for user_id in to_away {
            self.broadcast_presence(user_id, PresenceStatus::Away);
        }
        for user_id in to_offline {
            tracing::debug!(user_id = %user_id, "Idle past offline threshold");
            self.set_offline(user_id);
        }

        // Expired locks and typing flags
        self.rooms.for_each_room(|doc, room| {
            let sweep = room.sweep(now);
            for field in sweep.expired_locks {
                tracing::debug!(document = %doc, field = %field, "Lock expired");
                self.dispatcher.publish(
                    doc,
                    CollabEventType::FieldLockExpired,
                    &FieldPayload { field },
                    None,
                );
            }
            for user_id in sweep.expired_typing {
                self.dispatcher.publish(
                    doc,
                    CollabEventType::TypingStopped,
                    &TypingPayload { user_id },
                    None,
                );
            }
        });
    }

    /// One sweep pass at the current instant
    pub fn sweep(&self) {
        self.sweep_at(Utc::now());
    }

    // --- counters ---

    /// Total live sessions
    pub fn session_count(&self) -> usize {
        self.registry.session_count()
    }

    /// Distinct users with live sessions
    pub fn user_count(&self) -> usize {
        self.registry.user_count()
    }

    /// Live rooms
    pub fn room_count(&self) -> usize {
        self.rooms.room_count()
    }

    /// The engine's configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- internals ---

    /// Remove a user from one room with lock and typing reclamation
    /// (disconnect/offline path, so locks expire rather than unlock)
    fn evict_from_room(&self, doc: &DocumentId, user_id: UserId) {
        self.rooms.with_existing_room(doc, |room| {
            if room.remove_member(user_id) {
                for field in room.release_locks_of(user_id) {
                    self.dispatcher.publish(
                        doc,
                        CollabEventType::FieldLockExpired,
                        &FieldPayload { field },
                        None,
                    );
                }
                if room.clear_typing(user_id) {
                    self.dispatcher.publish(
                        doc,
                        CollabEventType::TypingStopped,
                        &TypingPayload { user_id },
                        None,
                    );
                }
                self.dispatcher.publish(
                    doc,
                    CollabEventType::UserLeft,
                    &UserLeftPayload { user_id },
                    None,
                );
            }
        });
    }

    /// Announce a presence change to every room the user belongs to
    fn broadcast_presence(&self, user_id: UserId, status: PresenceStatus) {
        for doc in self.rooms.documents_of(user_id) {
            self.dispatcher.publish(
                &doc,
                CollabEventType::PresenceChanged,
                &PresenceChangedPayload { user_id, status },
                Some(user_id),
            );
        }
    }
}

impl std::fmt::Debug for CollabEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollabEngine")
            .field("sessions", &self.registry.session_count())
            .field("rooms", &self.rooms.room_count())
            .finish()
    }
}
