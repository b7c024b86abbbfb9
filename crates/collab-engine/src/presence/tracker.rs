//! Per-user presence records and transitions
//!
//! Status decays downward through idle time (enforced by the reaper, not by
//! per-user timers) and returns to `Online` only via recorded activity.
//! `Busy` is entered only by explicit call; whether activity clears it is a
//! policy flag.

use chrono::{DateTime, Utc};
use collab_core::{PresenceStatus, UserId, UserProfile};
use dashmap::DashMap;
use std::time::Duration;

/// One user's presence state
#[derive(Debug, Clone)]
pub struct PresenceRecord {
    pub user_id: UserId,
    pub profile: UserProfile,
    pub status: PresenceStatus,
    pub last_activity: DateTime<Utc>,
}

impl PresenceRecord {
    fn new(user_id: UserId, profile: UserProfile, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            profile,
            status: PresenceStatus::Online,
            last_activity: now,
        }
    }

    /// Idle time relative to `now`
    #[must_use]
    pub fn idle(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_activity).to_std().unwrap_or(Duration::ZERO)
    }
}

/// An observed status transition, for `presence-changed` broadcasts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: PresenceStatus,
    pub to: PresenceStatus,
}

/// Tracks presence for all users with at least one live session
///
/// One record per user id, not per session. Created on the first online
/// transition; removed on offline.
pub struct PresenceTracker {
    records: DashMap<UserId, PresenceRecord>,
    /// Whether recorded activity resets an explicitly-set `Busy`
    activity_clears_busy: bool,
}

impl PresenceTracker {
    /// Create a tracker with the given busy policy
    #[must_use]
    pub fn new(activity_clears_busy: bool) -> Self {
        Self {
            records: DashMap::new(),
            activity_clears_busy,
        }
    }

    /// Transition a user to `Online`, creating the record on first sight
    ///
    /// Returns the change if the visible status actually moved.
    pub fn set_online(
        &self,
        user_id: UserId,
        profile: UserProfile,
        now: DateTime<Utc>,
    ) -> Option<StatusChange> {
        let mut change = None;

        self.records
            .entry(user_id)
            .and_modify(|record| {
                record.last_activity = now;
                if record.status != PresenceStatus::Online {
                    change = Some(StatusChange {
                        from: record.status,
                        to: PresenceStatus::Online,
                    });
                    record.status = PresenceStatus::Online;
                }
            })
            .or_insert_with(|| {
                change = Some(StatusChange {
                    from: PresenceStatus::Offline,
                    to: PresenceStatus::Online,
                });
                PresenceRecord::new(user_id, profile, now)
            });

        if change.is_some() {
            tracing::debug!(user_id = %user_id, "User online");
        }

        change
    }

    /// Record activity, forcing status back to `Online` unless the record is
    /// an activity-immune `Busy`
    pub fn record_activity(&self, user_id: UserId, now: DateTime<Utc>) -> Option<StatusChange> {
        let mut change = None;

        self.records.alter(&user_id, |_, mut record| {
            record.last_activity = now;

            let immune = record.status == PresenceStatus::Busy && !self.activity_clears_busy;
            if !immune && record.status != PresenceStatus::Online {
                change = Some(StatusChange {
                    from: record.status,
                    to: PresenceStatus::Online,
                });
                record.status = PresenceStatus::Online;
            }

            record
        });

        change
    }

    /// Explicitly set a status (the only way to enter `Busy`)
    pub fn set_status(
        &self,
        user_id: UserId,
        status: PresenceStatus,
        now: DateTime<Utc>,
    ) -> Option<StatusChange> {
        let mut change = None;

        self.records.alter(&user_id, |_, mut record| {
            record.last_activity = now;
            if record.status != status {
                change = Some(StatusChange {
                    from: record.status,
                    to: status,
                });
                record.status = status;
            }
            record
        });

        change
    }

    /// Drop the record entirely (offline is terminal until the next
    /// `set_online`)
    pub fn remove(&self, user_id: UserId) -> Option<PresenceRecord> {
        self.records.remove(&user_id).map(|(_, record)| record)
    }

    /// Current status, `Offline` if no record exists
    pub fn status_of(&self, user_id: UserId) -> PresenceStatus {
        self.records
            .get(&user_id)
            .map_or(PresenceStatus::Offline, |r| r.status)
    }

    /// Snapshot of one record
    pub fn get(&self, user_id: UserId) -> Option<PresenceRecord> {
        self.records.get(&user_id).map(|r| r.clone())
    }

    /// Number of tracked (non-offline) users
    pub fn tracked_count(&self) -> usize {
        self.records.len()
    }

    /// Idle-time decay pass, driven by the reaper
    ///
    /// Returns users demoted to `Away` and users past the offline threshold.
    /// The caller runs full offline cleanup for the latter; this method does
    /// not remove their records. `Busy` never decays to `Away` (it was set
    /// explicitly) but is still reclaimed at the offline threshold, which is
    /// the backstop for clients that vanish without a clean close.
    pub fn decay(
        &self,
        now: DateTime<Utc>,
        away_after: Duration,
        offline_after: Duration,
    ) -> (Vec<UserId>, Vec<UserId>) {
        let mut to_away = Vec::new();
        let mut to_offline = Vec::new();

        // Collect first; callers take other locks while acting on the result
        let snapshot: Vec<(UserId, PresenceStatus, DateTime<Utc>)> = self
            .records
            .iter()
            .map(|r| (r.user_id, r.status, r.last_activity))
            .collect();

        for (user_id, status, last_activity) in snapshot {
            let idle = (now - last_activity).to_std().unwrap_or(Duration::ZERO);

            if idle > offline_after {
                to_offline.push(user_id);
            } else if idle > away_after && status == PresenceStatus::Online {
                self.records.alter(&user_id, |_, mut record| {
                    // Re-check: activity may have arrived since the snapshot
                    if record.status == PresenceStatus::Online && record.last_activity == last_activity {
                        record.status = PresenceStatus::Away;
                        to_away.push(user_id);
                    }
                    record
                });
            }
        }

        (to_away, to_offline)
    }
}
