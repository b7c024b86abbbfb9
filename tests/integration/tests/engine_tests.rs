//! End-to-end engine scenarios
//!
//! Drives the engine through multi-user flows and asserts on the event
//! frames each connection receives. Time-dependent behavior is exercised
//! through explicit sweep instants, never by sleeping.

use chrono::{TimeDelta, Utc};
use collab_core::{CollabError, CollabEventType, FieldName, PresenceStatus, UserId};
use collab_engine::{CollabEngine, MutationSpec};
use integration_tests::{
    activity_clears_busy, connect, default_engine, doc, per_connection_presence,
};

fn field(name: &str) -> FieldName {
    FieldName::from(name)
}

#[tokio::test]
async fn test_join_roster_and_lock_snapshot() {
    let engine = default_engine();
    let mut alice = connect(&engine, 1, "Alice");
    let bob = connect(&engine, 2, "Bob");

    let info = engine.join_document(&alice.session, &doc("C1")).unwrap();
    assert_eq!(info.roster.len(), 1);
    assert_eq!(info.roster[0].user_id, UserId::new(1));
    assert_eq!(info.roster[0].status, PresenceStatus::Online);
    assert!(info.locks.is_empty());

    let info = engine.join_document(&bob.session, &doc("C1")).unwrap();
    assert_eq!(info.roster.len(), 2);

    // The incumbent is told about the newcomer, not the other way round
    let event = alice.expect_event(CollabEventType::UserJoined);
    assert_eq!(event.data["user_id"], "2");
    assert_eq!(event.data["profile"]["display_name"], "Bob");

    // A later joiner sees the held lock in the snapshot
    engine
        .lock_field(&alice.session, &doc("C1"), &field("payment_terms"))
        .unwrap();
    let carol = connect(&engine, 3, "Carol");
    let info = engine.join_document(&carol.session, &doc("C1")).unwrap();
    assert_eq!(info.locks.len(), 1);
    assert_eq!(info.locks[0].field, field("payment_terms"));
    assert_eq!(info.locks[0].user_id, UserId::new(1));
}

#[tokio::test]
async fn test_lock_conflict_and_retry_after_release() {
    let engine = default_engine();
    let mut alice = connect(&engine, 1, "Alice");
    let mut bob = connect(&engine, 2, "Bob");

    engine.join_document(&alice.session, &doc("C1")).unwrap();
    engine.join_document(&bob.session, &doc("C1")).unwrap();
    alice.drain();

    engine
        .lock_field(&alice.session, &doc("C1"), &field("payment_terms"))
        .unwrap();
    let event = bob.expect_event(CollabEventType::FieldLocked);
    assert_eq!(event.data["user_id"], "1");

    // Second acquirer loses and is told who holds the lock
    let err = engine
        .lock_field(&bob.session, &doc("C1"), &field("payment_terms"))
        .unwrap_err();
    match err {
        CollabError::LockHeld { holder, .. } => assert_eq!(holder, UserId::new(1)),
        other => panic!("unexpected error: {other}"),
    }
    let denied = bob.expect_event(CollabEventType::FieldLockDenied);
    assert_eq!(denied.data["holder"], "1");
    alice.expect_silence();

    // Voluntary release announces to the whole room
    engine
        .unlock_field(&alice.session, &doc("C1"), &field("payment_terms"))
        .unwrap();
    alice.expect_event(CollabEventType::FieldUnlocked);
    bob.expect_event(CollabEventType::FieldUnlocked);

    // Retry now wins
    engine
        .lock_field(&bob.session, &doc("C1"), &field("payment_terms"))
        .unwrap();
    alice.expect_event(CollabEventType::FieldLocked);
    bob.expect_silence();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_lock_acquires_have_single_winner() {
    let engine = default_engine();
    let clients: Vec<_> = (1..=8).map(|i| connect(&engine, i, "editor")).collect();
    for client in &clients {
        engine.join_document(&client.session, &doc("C1")).unwrap();
    }
    let sessions: Vec<_> = clients.iter().map(|c| c.session.clone()).collect();

    for _ in 0..50 {
        let mut handles = Vec::new();
        for session in &sessions {
            let engine = engine.clone();
            let session = session.clone();
            handles.push(tokio::spawn(async move {
                let outcome = engine.lock_field(&session, &doc("C1"), &field("payment_terms"));
                (session.user_id(), outcome)
            }));
        }

        let mut winner = None;
        let mut named_holders = Vec::new();
        for handle in handles {
            let (user, outcome) = handle.await.unwrap();
            match outcome {
                Ok(()) => {
                    assert!(winner.is_none(), "two acquires won the same race");
                    winner = Some(user);
                }
                Err(CollabError::LockHeld { holder, .. }) => named_holders.push(holder),
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        // Exactly one winner, and every loser was told who it is
        let winner = winner.expect("no acquire won");
        assert_eq!(named_holders.len(), sessions.len() - 1);
        assert!(named_holders.iter().all(|holder| *holder == winner));

        let winner_session = sessions
            .iter()
            .find(|s| s.user_id() == winner)
            .expect("winner session");
        engine
            .unlock_field(winner_session, &doc("C1"), &field("payment_terms"))
            .unwrap();
    }
}

#[tokio::test]
async fn test_lock_requires_membership() {
    let engine = default_engine();
    let alice = connect(&engine, 1, "Alice");

    let err = engine
        .lock_field(&alice.session, &doc("C1"), &field("payment_terms"))
        .unwrap_err();
    assert!(matches!(err, CollabError::NotInRoom(_)));
}

#[tokio::test]
async fn test_presence_decays_away_then_offline() {
    let engine = default_engine();
    let mut alice = connect(&engine, 1, "Alice");
    let mut bob = connect(&engine, 2, "Bob");

    engine.join_document(&alice.session, &doc("C1")).unwrap();
    engine.join_document(&bob.session, &doc("C1")).unwrap();
    alice.drain();
    bob.drain();

    // Past the away threshold both idle users decay and each is told
    // about the other
    engine.sweep_at(Utc::now() + TimeDelta::minutes(6));
    assert_eq!(engine.presence_of(UserId::new(1)), PresenceStatus::Away);
    assert_eq!(engine.presence_of(UserId::new(2)), PresenceStatus::Away);
    let event = alice.expect_event(CollabEventType::PresenceChanged);
    assert_eq!(event.data["status"], "away");
    bob.expect_event(CollabEventType::PresenceChanged);

    // Past the offline threshold their room state is fully reclaimed
    engine.sweep_at(Utc::now() + TimeDelta::minutes(16));
    assert_eq!(engine.presence_of(UserId::new(1)), PresenceStatus::Offline);
    assert_eq!(engine.presence_of(UserId::new(2)), PresenceStatus::Offline);
    assert_eq!(engine.room_count(), 0);
    assert!(engine.members(&doc("C1")).is_empty());
    assert!(bob.drain_types().contains(&CollabEventType::UserLeft));

    // Connections survive; clients re-join explicitly
    assert_eq!(engine.session_count(), 2);
}

#[tokio::test]
async fn test_rejoin_after_reap_restores_presence() {
    let engine = default_engine();
    let alice = connect(&engine, 1, "Alice");
    engine.join_document(&alice.session, &doc("C1")).unwrap();

    // Reaped past the offline threshold with the connection still open
    engine.sweep_at(Utc::now() + TimeDelta::minutes(16));
    assert_eq!(engine.presence_of(UserId::new(1)), PresenceStatus::Offline);
    assert_eq!(engine.session_count(), 1);

    // Activity alone does not revive a reclaimed record
    engine.record_activity(UserId::new(1));
    assert_eq!(engine.presence_of(UserId::new(1)), PresenceStatus::Offline);

    // Re-joining does
    let info = engine.join_document(&alice.session, &doc("C1")).unwrap();
    assert_eq!(engine.presence_of(UserId::new(1)), PresenceStatus::Online);
    assert_eq!(info.roster[0].status, PresenceStatus::Online);
    assert_eq!(engine.members(&doc("C1")), vec![UserId::new(1)]);
}

#[tokio::test]
async fn test_activity_resets_idle_decay() {
    let engine = default_engine();
    let alice = connect(&engine, 1, "Alice");
    engine.join_document(&alice.session, &doc("C1")).unwrap();

    engine.sweep_at(Utc::now() + TimeDelta::minutes(6));
    assert_eq!(engine.presence_of(UserId::new(1)), PresenceStatus::Away);

    // Activity restores online and restarts the idle clock
    engine.record_activity(UserId::new(1));
    assert_eq!(engine.presence_of(UserId::new(1)), PresenceStatus::Online);

    engine.sweep_at(Utc::now() + TimeDelta::minutes(4));
    assert_eq!(engine.presence_of(UserId::new(1)), PresenceStatus::Online);
}

#[tokio::test]
async fn test_typing_auto_clears_after_ttl() {
    let engine = default_engine();
    let mut alice = connect(&engine, 1, "Alice");
    let mut bob = connect(&engine, 2, "Bob");

    engine.join_document(&alice.session, &doc("C1")).unwrap();
    engine.join_document(&bob.session, &doc("C1")).unwrap();
    alice.drain();

    engine.set_typing(&alice.session, &doc("C1"), true).unwrap();
    let event = bob.expect_event(CollabEventType::TypingStarted);
    assert_eq!(event.data["user_id"], "1");
    assert_eq!(engine.typing_users(&doc("C1")), vec![UserId::new(1)]);

    // A refresh inside the window is silent
    engine.set_typing(&alice.session, &doc("C1"), true).unwrap();
    bob.expect_silence();

    // The reaper clears a lapsed flag and announces the stop
    engine.sweep_at(Utc::now() + TimeDelta::seconds(6));
    bob.expect_event(CollabEventType::TypingStopped);
    assert!(engine.typing_users(&doc("C1")).is_empty());
}

#[tokio::test]
async fn test_disconnect_reclaims_locks_and_membership() {
    let engine = default_engine();
    let mut alice = connect(&engine, 1, "Alice");
    let mut bob = connect(&engine, 2, "Bob");

    engine.join_document(&alice.session, &doc("C1")).unwrap();
    engine.join_document(&bob.session, &doc("C1")).unwrap();
    engine
        .lock_field(&alice.session, &doc("C1"), &field("payment_terms"))
        .unwrap();
    engine.set_typing(&alice.session, &doc("C1"), true).unwrap();
    alice.drain();
    bob.drain();

    engine.disconnect(alice.session.session_id());

    // The survivor sees the holder's lock expire, typing stop, and the exit
    assert_eq!(
        bob.drain_types(),
        vec![
            CollabEventType::FieldLockExpired,
            CollabEventType::TypingStopped,
            CollabEventType::UserLeft,
        ]
    );
    assert_eq!(engine.presence_of(UserId::new(1)), PresenceStatus::Offline);
    assert_eq!(engine.members(&doc("C1")), vec![UserId::new(2)]);

    // The field is immediately lockable again
    engine
        .lock_field(&bob.session, &doc("C1"), &field("payment_terms"))
        .unwrap();
}

#[tokio::test]
async fn test_presence_is_reference_counted_across_sessions() {
    let engine = default_engine();
    let a1 = connect(&engine, 1, "Alice");
    let a2 = connect(&engine, 1, "Alice");
    let mut bob = connect(&engine, 2, "Bob");

    engine.join_document(&bob.session, &doc("C1")).unwrap();
    engine.join_document(&a1.session, &doc("C1")).unwrap();
    engine.join_document(&a2.session, &doc("C1")).unwrap();

    // Two tabs, one member: a single join announcement
    assert_eq!(bob.drain_types(), vec![CollabEventType::UserJoined]);

    // Closing one tab changes nothing for the room
    engine.disconnect(a1.session.session_id());
    bob.expect_silence();
    assert_eq!(engine.presence_of(UserId::new(1)), PresenceStatus::Online);
    assert_eq!(engine.members(&doc("C1")).len(), 2);

    // Closing the last tab runs the full cleanup
    engine.disconnect(a2.session.session_id());
    assert_eq!(bob.drain_types(), vec![CollabEventType::UserLeft]);
    assert_eq!(engine.presence_of(UserId::new(1)), PresenceStatus::Offline);
}

#[tokio::test]
async fn test_per_connection_presence_policy() {
    let engine = CollabEngine::new(per_connection_presence());
    let a1 = connect(&engine, 1, "Alice");
    let a2 = connect(&engine, 1, "Alice");
    let mut bob = connect(&engine, 2, "Bob");

    engine.join_document(&bob.session, &doc("C1")).unwrap();
    engine.join_document(&a1.session, &doc("C1")).unwrap();
    engine.join_document(&a2.session, &doc("C1")).unwrap();
    bob.drain();

    // Under this policy any disconnect takes the user fully offline,
    // even with another tab still open
    engine.disconnect(a1.session.session_id());
    assert!(bob.drain_types().contains(&CollabEventType::UserLeft));
    assert_eq!(engine.presence_of(UserId::new(1)), PresenceStatus::Offline);
    assert_eq!(engine.members(&doc("C1")), vec![UserId::new(2)]);
}

#[tokio::test]
async fn test_mutation_respects_foreign_lock() {
    let engine = default_engine();
    let mut alice = connect(&engine, 1, "Alice");
    let mut bob = connect(&engine, 2, "Bob");

    engine.join_document(&alice.session, &doc("C1")).unwrap();
    engine.join_document(&bob.session, &doc("C1")).unwrap();
    engine
        .lock_field(&bob.session, &doc("C1"), &field("payment_terms"))
        .unwrap();
    alice.drain();

    // Writing through another user's lock is refused
    let err = engine
        .mutate_document(
            &alice.session,
            &doc("C1"),
            MutationSpec {
                field: Some(field("payment_terms")),
                changes: serde_json::json!({"payment_terms": "net-60"}),
            },
        )
        .unwrap_err();
    assert!(matches!(err, CollabError::LockHeld { .. }));
    bob.expect_silence();

    // Unlocked fields and field-less mutations pass through
    engine
        .mutate_document(
            &alice.session,
            &doc("C1"),
            MutationSpec {
                field: None,
                changes: serde_json::json!({"title": "Renewal"}),
            },
        )
        .unwrap();
    let event = bob.expect_event(CollabEventType::DocumentMutated);
    assert_eq!(event.data["changes"]["title"], "Renewal");
    assert_eq!(event.data["author_user_id"], "1");

    // The lock holder can write their own field
    engine
        .mutate_document(
            &bob.session,
            &doc("C1"),
            MutationSpec {
                field: Some(field("payment_terms")),
                changes: serde_json::json!({"payment_terms": "net-30"}),
            },
        )
        .unwrap();
    alice.expect_event(CollabEventType::DocumentMutated);
}

#[tokio::test]
async fn test_busy_is_activity_immune_by_default() {
    let engine = default_engine();
    let alice = connect(&engine, 1, "Alice");
    engine.join_document(&alice.session, &doc("C1")).unwrap();

    engine.set_status(UserId::new(1), PresenceStatus::Busy);
    engine.record_activity(UserId::new(1));
    assert_eq!(engine.presence_of(UserId::new(1)), PresenceStatus::Busy);

    // Busy never decays to away
    engine.sweep_at(Utc::now() + TimeDelta::minutes(6));
    assert_eq!(engine.presence_of(UserId::new(1)), PresenceStatus::Busy);

    // But an abandoned busy session is still reclaimed at the offline
    // threshold
    engine.sweep_at(Utc::now() + TimeDelta::minutes(16));
    assert_eq!(engine.presence_of(UserId::new(1)), PresenceStatus::Offline);
}

#[tokio::test]
async fn test_busy_cleared_by_activity_when_configured() {
    let engine = CollabEngine::new(activity_clears_busy());
    let alice = connect(&engine, 1, "Alice");
    engine.join_document(&alice.session, &doc("C1")).unwrap();

    engine.set_status(UserId::new(1), PresenceStatus::Busy);
    engine.record_activity(UserId::new(1));
    assert_eq!(engine.presence_of(UserId::new(1)), PresenceStatus::Online);
}

#[tokio::test]
async fn test_switching_documents_leaves_previous_room() {
    let engine = default_engine();
    let alice = connect(&engine, 1, "Alice");
    let mut bob = connect(&engine, 2, "Bob");

    engine.join_document(&bob.session, &doc("C1")).unwrap();
    engine.join_document(&alice.session, &doc("C1")).unwrap();
    bob.drain();

    engine.join_document(&alice.session, &doc("C2")).unwrap();
    assert_eq!(bob.drain_types(), vec![CollabEventType::UserLeft]);
    assert_eq!(engine.members(&doc("C1")), vec![UserId::new(2)]);
    assert_eq!(engine.members(&doc("C2")), vec![UserId::new(1)]);
}

#[tokio::test]
async fn test_sweep_disconnects_vanished_connections() {
    let engine = default_engine();
    let alice = connect(&engine, 1, "Alice");
    let mut bob = connect(&engine, 2, "Bob");

    engine.join_document(&alice.session, &doc("C1")).unwrap();
    engine.join_document(&bob.session, &doc("C1")).unwrap();
    bob.drain();

    // Drop the receiving end without a clean disconnect
    drop(alice.events);

    engine.sweep_at(Utc::now());
    assert_eq!(engine.session_count(), 1);
    assert_eq!(engine.presence_of(UserId::new(1)), PresenceStatus::Offline);
    assert!(bob.drain_types().contains(&CollabEventType::UserLeft));
}
