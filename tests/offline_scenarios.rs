mod common;

use common::{spawn_mock_api, test_config, wait_for, SwitchableTransport};
use field_sync::application::ports::MutationQueue;
use field_sync::application::services::interceptor::ResponseSource;
use field_sync::domain::entities::PunchInRecord;
use field_sync::domain::value_objects::Photo;
use field_sync::{
    AppError, AppState, FieldRecord, InterceptedRequest, ReconcileOutcome, SyncReport, SyncTrigger,
};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

fn punch_in(location: &str) -> FieldRecord {
    let mut record = PunchInRecord::new("Ravi Kumar", location);
    record.status = Some("punched_in".to_string());
    record.punch_in_time = Some("2025-06-01T08:00:00Z".to_string());
    FieldRecord::PunchIn(record)
}

fn punch_out(location: &str) -> FieldRecord {
    let mut record = PunchInRecord::new("Ravi Kumar", location);
    record.status = Some("punched_out".to_string());
    record.punch_out_time = Some("2025-06-01T17:30:00Z".to_string());
    FieldRecord::PunchIn(record)
}

async fn sync_now(state: &AppState) -> SyncReport {
    match state
        .reconciler
        .reconcile(SyncTrigger::Manual)
        .await
        .expect("reconcile")
    {
        ReconcileOutcome::Completed(report) => report,
        other => panic!("expected a completed pass, got {other:?}"),
    }
}

#[tokio::test]
async fn offline_punch_in_is_delivered_after_reconnect() {
    let api = spawn_mock_api().await;
    let dir = tempfile::tempdir().unwrap();
    let transport = SwitchableTransport::new(false);
    let state = AppState::with_transport(
        test_config(&api.base_url, &dir.path().join("offline.db")),
        transport.clone(),
    )
    .await
    .expect("state");

    let record = punch_in("GP Kondapur");
    let outcome = state.records.save(&record).await.expect("offline save");
    assert!(outcome.success);
    assert!(outcome.offline);
    assert!(!state.monitor.is_online());
    assert_eq!(state.records.pending_count().await.unwrap(), 1);
    assert!(api.state.received().is_empty());

    transport.set_online(true);
    state.monitor.set_online(true);
    let report = sync_now(&state).await;
    assert_eq!(report.synced, 1);
    assert!(report.is_clean());

    let received = api.state.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].method, "POST");
    assert_eq!(received[0].body, record.to_value().unwrap());
    assert_eq!(state.records.pending_count().await.unwrap(), 0);

    let fetched = state.records.fetch_all(None).await.expect("fetch");
    assert!(!fetched.offline);
    assert_eq!(fetched.records.len(), 1);
    assert_eq!(fetched.records[0]["location"], "GP Kondapur");
}

#[tokio::test]
async fn punch_in_and_out_replay_in_submission_order() {
    let api = spawn_mock_api().await;
    let dir = tempfile::tempdir().unwrap();
    let transport = SwitchableTransport::new(false);
    let state = AppState::with_transport(
        test_config(&api.base_url, &dir.path().join("offline.db")),
        transport.clone(),
    )
    .await
    .expect("state");

    state.records.save(&punch_in("GP Kondapur")).await.unwrap();
    state.records.save(&punch_out("GP Kondapur")).await.unwrap();
    assert_eq!(state.records.pending_count().await.unwrap(), 2);

    let shutdown = CancellationToken::new();
    let tasks = state.start_background(shutdown.clone());
    transport.set_online(true);
    state.monitor.set_online(true);

    let records = state.records.clone();
    wait_for(|| {
        let records = records.clone();
        async move { records.pending_count().await.unwrap() == 0 }
    })
    .await;

    let statuses: Vec<Value> = api
        .state
        .received()
        .into_iter()
        .map(|request| request.body["status"].clone())
        .collect();
    assert_eq!(statuses, vec![json!("punched_in"), json!("punched_out")]);

    shutdown.cancel();
    for handle in tasks.handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn replayed_writes_carry_their_queued_id_as_idempotency_key() {
    let api = spawn_mock_api().await;
    let dir = tempfile::tempdir().unwrap();
    let transport = SwitchableTransport::new(false);
    let state = AppState::with_transport(
        test_config(&api.base_url, &dir.path().join("offline.db")),
        transport.clone(),
    )
    .await
    .expect("state");

    let outcome = state.records.save(&punch_in("GP Medak")).await.unwrap();
    let queued_id = outcome.queued_id.expect("queued id");

    transport.set_online(true);
    state.monitor.set_online(true);
    sync_now(&state).await;

    let received = api.state.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].idempotency_key.as_deref(), Some(queued_id.as_str()));
}

#[tokio::test]
async fn save_fails_with_storage_full_once_quota_is_spent() {
    let api = spawn_mock_api().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&api.base_url, &dir.path().join("quota.db"));
    config.storage.max_queue_bytes = Some(64 * 1024);
    let state = AppState::with_transport(config, SwitchableTransport::new(false))
        .await
        .expect("state");

    let photo = Photo::new("A".repeat(16 * 1024)).unwrap();
    let mut failure = None;
    for _ in 0..64 {
        let mut record = PunchInRecord::new("Ravi Kumar", "GP Siddipet");
        record.photos = vec![photo.clone()];
        if let Err(err) = state.records.save(&FieldRecord::PunchIn(record)).await {
            failure = Some(err);
            break;
        }
    }

    let err = failure.expect("quota should be exhausted");
    assert!(matches!(err, AppError::StorageFull(_)), "unexpected error: {err:?}");
    assert!(state.records.pending_count().await.unwrap() > 0);
}

#[tokio::test]
async fn cached_read_is_served_byte_for_byte_when_offline() {
    let api = spawn_mock_api().await;
    let dir = tempfile::tempdir().unwrap();
    let transport = SwitchableTransport::new(true);
    let state = AppState::with_transport(
        test_config(&api.base_url, &dir.path().join("offline.db")),
        transport.clone(),
    )
    .await
    .expect("state");

    state.records.save(&punch_in("GP Kondapur")).await.unwrap();
    let url = format!("{}?type=punch_in", state.interceptor.records_url());
    let live = state
        .interceptor
        .handle(InterceptedRequest::get(url.clone()))
        .await
        .unwrap();
    assert_eq!(live.source, ResponseSource::Network);

    transport.set_online(false);
    let cached = state
        .interceptor
        .handle(InterceptedRequest::get(url))
        .await
        .unwrap();
    assert_eq!(cached.source, ResponseSource::Cache);
    assert_eq!(cached.status, live.status);
    assert_eq!(cached.body, live.body);

    let uncached = state.records.fetch_all(None).await.unwrap();
    assert!(uncached.offline);
    assert!(uncached.records.is_empty());
}

#[tokio::test]
async fn pending_entries_survive_a_restart() {
    let api = spawn_mock_api().await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&api.base_url, &dir.path().join("offline.db"));

    let first = AppState::with_transport(config.clone(), SwitchableTransport::new(false))
        .await
        .expect("first state");
    first.records.save(&punch_in("GP Gajwel")).await.unwrap();
    first.store.close().await;
    drop(first);

    let transport = SwitchableTransport::new(true);
    let second = AppState::with_transport(config, transport)
        .await
        .expect("second state");
    let pending = second.store.queue.list_pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].payload.as_json()["location"], "GP Gajwel");

    let report = sync_now(&second).await;
    assert_eq!(report.synced, 1);
    assert_eq!(api.state.received().len(), 1);
}

#[tokio::test]
async fn unavailable_storage_rejects_offline_writes() {
    let api = spawn_mock_api().await;
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();
    let state = AppState::with_transport(
        test_config(&api.base_url, &blocker.join("offline.db")),
        SwitchableTransport::new(false),
    )
    .await
    .expect("state");
    assert!(!state.store.is_durable());

    let err = state.records.save(&punch_in("GP Kondapur")).await.unwrap_err();
    assert!(matches!(err, AppError::StorageUnavailable(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn rejected_replay_stays_pending() {
    let api = spawn_mock_api().await;
    let dir = tempfile::tempdir().unwrap();
    let transport = SwitchableTransport::new(false);
    let state = AppState::with_transport(
        test_config(&api.base_url, &dir.path().join("offline.db")),
        transport.clone(),
    )
    .await
    .expect("state");

    let url = format!("{}/missing", state.interceptor.records_url());
    let request = InterceptedRequest::json(
        reqwest::Method::PUT,
        url,
        &json!({"status": "completed"}),
    )
    .unwrap();
    let queued = state.interceptor.handle(request).await.unwrap();
    assert_eq!(queued.source, ResponseSource::Queued);

    transport.set_online(true);
    state.monitor.set_online(true);
    let report = sync_now(&state).await;
    assert_eq!(report.synced, 0);
    assert_eq!(report.failed, 1);

    let pending = state.store.queue.list_pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].attempts, 1);
    assert!(pending[0].last_error.is_some());
}

#[tokio::test]
async fn queued_write_replays_its_authorization_header() {
    let api = spawn_mock_api().await;
    let dir = tempfile::tempdir().unwrap();
    let transport = SwitchableTransport::new(false);
    let state = AppState::with_transport(
        test_config(&api.base_url, &dir.path().join("offline.db")),
        transport.clone(),
    )
    .await
    .expect("state");

    let record = punch_in("GP Narsapur").to_value().unwrap();
    let request = InterceptedRequest::json(
        reqwest::Method::POST,
        state.interceptor.records_url(),
        &record,
    )
    .unwrap()
    .with_header("Authorization", "Bearer field-token");
    let queued = state.interceptor.handle(request).await.unwrap();
    assert_eq!(queued.source, ResponseSource::Queued);

    transport.set_online(true);
    state.monitor.set_online(true);
    let report = sync_now(&state).await;
    assert_eq!(report.synced, 1);

    let received = api.state.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].authorization.as_deref(), Some("Bearer field-token"));
}
