use std::collections::HashMap;
use std::time::SystemTime;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::api::validate_timer_spec;
use crate::api::Cond;
use crate::api::SchedEventStatus;
use crate::api::TimerRecord;
use crate::api::TimerStore;
use crate::api::TimerUpdate;
use crate::api::WatchTimerChan;
use crate::api::WatchTimerEventType;
use crate::api::INITIAL_TIMER_VERSION;
use crate::errors::Result;
use crate::errors::TimerError;
use crate::notifier::MemWatchNotifier;
use crate::notifier::TimerWatchEventNotifier;

/// In-process, authoritative timer store.
///
/// One mutex guards the record map and the `(namespace, key)` index; every
/// operation runs under it and watch events are emitted only after the
/// guard is released, so subscriber backpressure never holds the write
/// path.
pub struct MemTimerStore {
    core: Mutex<MemStoreCore>,
    notifier: MemWatchNotifier,
}

#[derive(Default)]
struct MemStoreCore {
    /// id -> record
    timers: HashMap<String, TimerRecord>,
    /// (namespace, key) -> id
    key_index: HashMap<(String, String), String>,
}

impl MemTimerStore {
    pub fn new() -> Self {
        Self {
            core: Mutex::new(MemStoreCore::default()),
            notifier: MemWatchNotifier::new(),
        }
    }
}

impl Default for MemTimerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TimerStore for MemTimerStore {
    async fn create(&self, record: &TimerRecord) -> Result<String> {
        validate_timer_spec(&record.spec)?;

        let id = Uuid::new_v4().to_string();
        {
            let mut core = self.core.lock();
            let index_key = (record.spec.namespace.clone(), record.spec.key.clone());
            if core.key_index.contains_key(&index_key) {
                return Err(TimerError::AlreadyExists.into());
            }

            let mut stored = record.clone();
            stored.id = id.clone();
            stored.version = INITIAL_TIMER_VERSION;
            stored.create_time = Some(SystemTime::now());
            stored.event_status = SchedEventStatus::Idle;

            core.key_index.insert(index_key, id.clone());
            core.timers.insert(id.clone(), stored);
        }

        debug!(timer_id = %id, "timer created");
        self.notifier.notify(WatchTimerEventType::Create, &id);
        Ok(id)
    }

    async fn get_by_id(&self, id: &str) -> Result<TimerRecord> {
        let core = self.core.lock();
        core.timers
            .get(id)
            .cloned()
            .ok_or_else(|| TimerError::NotExist.into())
    }

    async fn get_by_key(&self, namespace: &str, key: &str) -> Result<TimerRecord> {
        let core = self.core.lock();
        let index_key = (namespace.to_string(), key.to_string());
        core.key_index
            .get(&index_key)
            .and_then(|id| core.timers.get(id))
            .cloned()
            .ok_or_else(|| TimerError::NotExist.into())
    }

    async fn list(&self, cond: Option<&Cond>) -> Result<Vec<TimerRecord>> {
        let core = self.core.lock();
        Ok(core
            .timers
            .values()
            .filter(|r| cond.map_or(true, |c| c.evaluate(r)))
            .cloned()
            .collect())
    }

    async fn update(&self, id: &str, update: &TimerUpdate) -> Result<()> {
        {
            let mut core = self.core.lock();
            let current = core.timers.get(id).ok_or(TimerError::NotExist)?;
            let mut updated = update.apply(current)?;
            updated.version = current.version + 1;
            core.timers.insert(id.to_string(), updated);
        }

        self.notifier.notify(WatchTimerEventType::Update, id);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let existed = {
            let mut core = self.core.lock();
            match core.timers.remove(id) {
                Some(record) => {
                    core.key_index
                        .remove(&(record.spec.namespace, record.spec.key));
                    true
                }
                None => false,
            }
        };

        if existed {
            self.notifier.notify(WatchTimerEventType::Delete, id);
        }
        Ok(existed)
    }

    fn watch_supported(&self) -> bool {
        true
    }

    fn watch(&self, cancel: CancellationToken) -> WatchTimerChan {
        self.notifier.watch(cancel)
    }

    async fn close(&self) {
        self.notifier.close().await;
    }
}
