//! Two table stores sharing a coordination service behave like one
//! registry cluster: mutations on one node are observed by watchers on the
//! other.

use std::sync::Arc;

use tempfile::TempDir;
use tokio::time::timeout;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use tickstore::CoordClient;
use tickstore::MemCoordService;
use tickstore::OptionalVal;
use tickstore::SchedPolicyType;
use tickstore::TableTimerStore;
use tickstore::TimerRecord;
use tickstore::TimerSpec;
use tickstore::TimerStore;
use tickstore::TimerUpdate;
use tickstore::WatchTimerEventType;

const WAIT: Duration = Duration::from_secs(10);

fn record(namespace: &str, key: &str) -> TimerRecord {
    TimerRecord {
        spec: TimerSpec {
            namespace: namespace.to_string(),
            key: key.to_string(),
            sched_policy_type: SchedPolicyType::Interval,
            sched_policy_expr: "1h".to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn test_watch_across_store_instances() {
    let dir = TempDir::new().expect("create temp dir");
    let db = sled::open(dir.path().join("db")).expect("open db");
    let coord: Arc<dyn CoordClient> = Arc::new(MemCoordService::new());

    // same table, same instance id, same coordination service: one cluster
    let writer = TableTimerStore::with_db(db.clone(), 7, Some(Arc::clone(&coord)))
        .expect("open writer store");
    let observer =
        TableTimerStore::with_db(db, 7, Some(coord)).expect("open observer store");

    let cancel = CancellationToken::new();
    let mut watcher = observer.watch(cancel.clone());

    let id = writer.create(&record("n1", "/k1")).await.expect("create");
    let response = timeout(WAIT, watcher.recv())
        .await
        .expect("no create event")
        .expect("watch closed");
    assert_eq!(response.events.len(), 1);
    assert_eq!(response.events[0].tp, WatchTimerEventType::Create);
    assert_eq!(response.events[0].timer_id, id);

    // the row the event points at is readable on the observing node
    let seen = observer.get_by_id(&id).await.expect("get on observer");
    assert_eq!(seen.spec.namespace, "n1");
    assert_eq!(seen.spec.key, "/k1");

    writer
        .update(
            &id,
            &TimerUpdate {
                tags: OptionalVal::Set(vec!["moved".to_string()]),
                ..Default::default()
            },
        )
        .await
        .expect("update");
    let response = timeout(WAIT, watcher.recv())
        .await
        .expect("no update event")
        .expect("watch closed");
    assert_eq!(response.events[0].tp, WatchTimerEventType::Update);

    assert!(writer.delete(&id).await.expect("delete"));
    let response = timeout(WAIT, watcher.recv())
        .await
        .expect("no delete event")
        .expect("watch closed");
    assert_eq!(response.events[0].tp, WatchTimerEventType::Delete);
    assert_eq!(response.events[0].timer_id, id);

    cancel.cancel();
    assert!(timeout(WAIT, watcher.recv()).await.expect("closed").is_none());

    writer.close().await;
    observer.close().await;
}

#[tokio::test]
async fn test_instance_ids_isolate_registries() {
    let dir = TempDir::new().expect("create temp dir");
    let coord: Arc<dyn CoordClient> = Arc::new(MemCoordService::new());

    let writer = TableTimerStore::open(dir.path().join("writer"), 1, Some(Arc::clone(&coord)))
        .expect("open writer store");
    let unrelated = TableTimerStore::open(dir.path().join("unrelated"), 2, Some(coord))
        .expect("open unrelated store");

    let cancel = CancellationToken::new();
    let mut watcher = unrelated.watch(cancel.clone());

    writer.create(&record("n1", "/k1")).await.expect("create");

    // a registry with a different instance id must not observe the event
    assert!(timeout(Duration::from_millis(500), watcher.recv())
        .await
        .is_err());

    cancel.cancel();
    writer.close().await;
    unrelated.close().await;
}
