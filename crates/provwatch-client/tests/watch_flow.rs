//! End-to-end watch-session scenarios over recorded transports.

use provwatch_client::{
    ChannelKey, Phase, Polled, RecordedFetchClient, RecordedFrame, ScriptedEventSource,
    SessionOptions, WatchError, WatchSession,
};
use provwatch_core::{Operation, ResourceStatus, StateSnapshot, StateUpdateEvent};

fn operation(status: &str) -> Operation {
    serde_json::from_str(&format!(
        r#"{{"id":"op-1","type":"create","status":"{status}","last_updated":"2024-03-01T10:00:00Z"}}"#
    ))
    .expect("operation fixture")
}

fn snapshot_with_planned(resource_id: &str) -> StateSnapshot {
    serde_json::from_str(&format!(
        r#"{{
            "last_updated": "2024-03-01T10:00:00Z",
            "operation_id": "op-1",
            "status": "creating",
            "resources": {{
                "{resource_id}": {{"id":"{resource_id}","status":"planned_create","error":null}}
            }}
        }}"#
    ))
    .expect("snapshot fixture")
}

fn key() -> ChannelKey {
    ChannelKey::new(12, 34, "op-1")
}

#[test]
fn happy_path_settles_with_created_resource() {
    let fetcher = RecordedFetchClient::new(snapshot_with_planned("r1"), operation("starting"));
    let mut source = ScriptedEventSource::new(vec![
        StateUpdateEvent::new("r1", "creating"),
        StateUpdateEvent::new("r1", "created"),
    ]);

    let mut session =
        WatchSession::open(&fetcher, &mut source, key(), SessionOptions::default()).unwrap();
    assert_eq!(session.phase(), Phase::Loading);
    assert_eq!(source.subscriptions(), 1);
    assert_eq!(
        source.last_key().unwrap().channel_path(),
        "projects/12/infras/34/operations/op-1/state"
    );

    session.fetch_initial_state(&fetcher);
    assert_eq!(session.phase(), Phase::Subscribed);

    assert_eq!(session.poll().unwrap(), Polled::Applied(2));
    assert_eq!(session.phase(), Phase::Settled);

    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.resources["r1"].status, ResourceStatus::Created);
    assert_eq!(snapshot.operation_id, "op-1");

    let buckets = session.buckets();
    assert_eq!(buckets.created.len(), 1);
    assert!(buckets.planned.is_empty());
    assert!(buckets.errored.is_empty());

    let progress = session.progress();
    assert_eq!(progress.caption(), "1 / 1 Created");

    assert_eq!(session.poll().unwrap(), Polled::Closed);
    assert_eq!(session.stats().applied, 2);
}

#[test]
fn events_before_snapshot_are_queued_then_drained_in_order() {
    let fetcher = RecordedFetchClient::new(snapshot_with_planned("r1"), operation("starting"));
    let mut source = ScriptedEventSource::new(vec![
        StateUpdateEvent::new("r1", "creating"),
        StateUpdateEvent::new("r1", "errored").with_error("quota"),
    ]);

    let mut session =
        WatchSession::open(&fetcher, &mut source, key(), SessionOptions::default()).unwrap();

    // Poll while still loading: both events buffer, nothing applies yet.
    assert_eq!(session.poll().unwrap(), Polled::Queued(2));
    assert_eq!(session.phase(), Phase::Loading);
    assert!(session.snapshot().is_none());
    assert_eq!(session.stats().queued, 2);

    // Installing the snapshot replays the queue through the reconciler.
    session.fetch_initial_state(&fetcher);
    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.resources["r1"].status, ResourceStatus::Errored);
    assert_eq!(snapshot.resources["r1"].error.as_deref(), Some("quota"));
    assert_eq!(session.stats().applied, 2);
}

#[test]
fn loading_queue_is_bounded_and_drops_oldest() {
    let fetcher = RecordedFetchClient::new(snapshot_with_planned("r1"), operation("starting"));
    let mut source = ScriptedEventSource::new(vec![
        StateUpdateEvent::new("a", "created"),
        StateUpdateEvent::new("b", "created"),
        StateUpdateEvent::new("c", "created"),
    ]);

    let mut session = WatchSession::open(
        &fetcher,
        &mut source,
        key(),
        SessionOptions { queue_cap: 2 },
    )
    .unwrap();

    assert_eq!(session.poll().unwrap(), Polled::Queued(3));
    assert_eq!(session.stats().overflowed, 1);

    session.fetch_initial_state(&fetcher);
    let snapshot = session.snapshot().unwrap();
    // "a" overflowed out of the queue; "b" and "c" survived.
    assert!(!snapshot.resources.contains_key("a"));
    assert!(snapshot.resources.contains_key("b"));
    assert!(snapshot.resources.contains_key("c"));
}

#[test]
fn state_fetch_failure_degrades_to_placeholder() {
    let fetcher = RecordedFetchClient::new(snapshot_with_planned("r1"), operation("starting"))
        .with_state_failure();
    let mut source = ScriptedEventSource::new(vec![StateUpdateEvent::new("r9", "created")]);

    let mut session =
        WatchSession::open(&fetcher, &mut source, key(), SessionOptions::default()).unwrap();
    session.fetch_initial_state(&fetcher);

    // Placeholder: empty resources, status "creating", operation id carried.
    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.status, "creating");
    assert_eq!(snapshot.operation_id, "op-1");
    assert!(snapshot.is_empty());
    assert_eq!(session.phase(), Phase::Subscribed);

    // Events still apply against the placeholder.
    assert_eq!(session.poll().unwrap(), Polled::Applied(1));
    assert_eq!(session.snapshot().unwrap().len(), 1);
}

#[test]
fn operation_fetch_failure_is_terminal() {
    let fetcher = RecordedFetchClient::new(snapshot_with_planned("r1"), operation("starting"))
        .with_operation_failure();
    let mut source = ScriptedEventSource::new(vec![]);

    let err = WatchSession::open(&fetcher, &mut source, key(), SessionOptions::default())
        .expect_err("metadata fetch failure must not open a session");
    assert!(matches!(err, WatchError::OperationFetch { .. }));
    assert_eq!(err.error_code().code(), "E3001");
    // No subscription may be opened for a session that failed to start.
    assert_eq!(source.subscriptions(), 0);
}

#[test]
fn terminal_operation_never_subscribes() {
    let fetcher = RecordedFetchClient::new(snapshot_with_planned("r1"), operation("completed"));
    let mut source = ScriptedEventSource::new(vec![StateUpdateEvent::new("r1", "created")]);

    let mut session =
        WatchSession::open(&fetcher, &mut source, key(), SessionOptions::default()).unwrap();
    assert_eq!(source.subscriptions(), 0);

    session.fetch_initial_state(&fetcher);
    assert_eq!(session.phase(), Phase::Settled);
    assert_eq!(session.poll().unwrap(), Polled::Closed);

    // The snapshot is still the fetched one; no events were consumed.
    assert_eq!(session.buckets().planned.len(), 1);
}

#[test]
fn subscription_error_closes_and_surfaces() {
    let fetcher = RecordedFetchClient::new(snapshot_with_planned("r1"), operation("starting"));
    let mut source = ScriptedEventSource::from_frames(vec![
        RecordedFrame::Event(StateUpdateEvent::new("r1", "created")),
        RecordedFrame::Error("stream reset".into()),
    ]);

    let mut session =
        WatchSession::open(&fetcher, &mut source, key(), SessionOptions::default()).unwrap();
    session.fetch_initial_state(&fetcher);

    let err = session.poll().expect_err("scripted stream error");
    assert!(matches!(err, WatchError::Subscription { .. }));
    assert_eq!(err.error_code().code(), "E3003");
    assert_eq!(session.phase(), Phase::Settled);

    // The event before the failure was applied and the snapshot survives.
    assert_eq!(
        session.snapshot().unwrap().resources["r1"].status,
        ResourceStatus::Created
    );
    assert_eq!(session.poll().unwrap(), Polled::Closed);
}

#[test]
fn heartbeats_and_partial_frames_are_dropped() {
    let fetcher = RecordedFetchClient::new(snapshot_with_planned("r1"), operation("starting"));
    let mut source = ScriptedEventSource::from_frames(vec![
        RecordedFrame::Event(StateUpdateEvent::default()),
        RecordedFrame::Pending,
        RecordedFrame::Event(StateUpdateEvent {
            status: Some("created".into()),
            resource_id: None,
            error: None,
        }),
    ]);

    let mut session =
        WatchSession::open(&fetcher, &mut source, key(), SessionOptions::default()).unwrap();
    session.fetch_initial_state(&fetcher);

    // First poll stops at the Pending tick having dropped one heartbeat.
    assert_eq!(session.poll().unwrap(), Polled::Idle);
    // Second poll drops the partial frame and observes end of stream.
    assert_eq!(session.poll().unwrap(), Polled::Closed);

    assert_eq!(session.stats().dropped, 2);
    assert_eq!(session.stats().applied, 0);
    assert_eq!(
        session.snapshot().unwrap().resources["r1"].status,
        ResourceStatus::PlannedCreate
    );
}

#[test]
fn close_is_idempotent_and_settles() {
    let fetcher = RecordedFetchClient::new(snapshot_with_planned("r1"), operation("starting"));
    let mut source = ScriptedEventSource::new(vec![StateUpdateEvent::new("r1", "created")]);

    let mut session =
        WatchSession::open(&fetcher, &mut source, key(), SessionOptions::default()).unwrap();
    session.fetch_initial_state(&fetcher);

    session.close();
    session.close();
    assert_eq!(session.phase(), Phase::Settled);
    assert_eq!(session.poll().unwrap(), Polled::Closed);
}
