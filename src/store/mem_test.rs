use std::sync::Arc;

use async_trait::async_trait;
use tracing_test::traced_test;

use crate::api::OptionalVal;
use crate::api::SchedPolicyType;
use crate::api::TimerRecord;
use crate::api::TimerSpec;
use crate::api::TimerStore;
use crate::api::TimerUpdate;
use crate::errors::Result;
use crate::store::store_test::TimerStoreBuilder;
use crate::store::store_test::TimerStoreTestSuite;
use crate::store::MemTimerStore;

struct MemStoreBuilder;

#[async_trait]
impl TimerStoreBuilder for MemStoreBuilder {
    type Store = MemTimerStore;

    async fn build(&self) -> Result<Arc<Self::Store>> {
        Ok(Arc::new(MemTimerStore::new()))
    }

    async fn cleanup(&self) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
#[traced_test]
async fn test_mem_timer_store_crud() -> Result<()> {
    TimerStoreTestSuite::run_crud_tests(&MemStoreBuilder).await
}

#[tokio::test]
#[traced_test]
async fn test_mem_timer_store_watch() -> Result<()> {
    TimerStoreTestSuite::run_watch_tests(&MemStoreBuilder).await
}

#[tokio::test]
async fn test_returned_records_are_snapshots() -> Result<()> {
    let store = MemTimerStore::new();
    let id = store
        .create(&TimerRecord {
            spec: TimerSpec {
                namespace: "n1".to_string(),
                key: "/k".to_string(),
                sched_policy_type: SchedPolicyType::Interval,
                sched_policy_expr: "1h".to_string(),
                ..Default::default()
            },
            ..Default::default()
        })
        .await?;

    let mut snapshot = store.get_by_id(&id).await?;
    snapshot.spec.tags.push("mutated".to_string());
    snapshot.event_id = "mutated".to_string();

    let fresh = store.get_by_id(&id).await?;
    assert!(fresh.spec.tags.is_empty());
    assert!(fresh.event_id.is_empty());

    store.close().await;
    Ok(())
}

#[tokio::test]
async fn test_version_strictly_increases() -> Result<()> {
    let store = MemTimerStore::new();
    let id = store
        .create(&TimerRecord {
            spec: TimerSpec {
                namespace: "n1".to_string(),
                key: "/k".to_string(),
                sched_policy_type: SchedPolicyType::Interval,
                sched_policy_expr: "1h".to_string(),
                ..Default::default()
            },
            ..Default::default()
        })
        .await?;

    let mut last = store.get_by_id(&id).await?.version;
    for i in 0..5u64 {
        store
            .update(
                &id,
                &TimerUpdate {
                    event_id: OptionalVal::Set(format!("evt{i}")),
                    ..Default::default()
                },
            )
            .await?;
        let version = store.get_by_id(&id).await?.version;
        assert_eq!(version, last + 1);
        last = version;
    }

    store.close().await;
    Ok(())
}
