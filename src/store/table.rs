use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use sled::transaction::ConflictableTransactionError;
use sled::transaction::TransactionError;
use sled::transaction::Transactional;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;
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
use crate::coord::CoordClient;
use crate::errors::Error;
use crate::errors::Result;
use crate::errors::StorageError;
use crate::errors::TimerError;
use crate::notifier::closed_watch_chan;
use crate::notifier::CoordWatchNotifier;
use crate::notifier::TimerWatchEventNotifier;

// Sled tree namespaces
const TIMER_TREE: &str = "timers";
const INDEX_TREE: &str = "timers_idx";

/// Durable timer store over an embedded transactional table engine.
///
/// Every logical operation is one multi-tree transaction: read the current
/// row, check preconditions, write, commit. The `Version` check inside the
/// transaction is the authoritative arbiter for concurrent updates.
///
/// Change notifications ride over an external coordination service; when
/// no [`CoordClient`] is supplied at construction, the store works but
/// [`watch_supported`](TimerStore::watch_supported) is false.
pub struct TableTimerStore {
    db: sled::Db,
    timers: sled::Tree,
    key_index: sled::Tree,
    notifier: Option<CoordWatchNotifier>,
}

impl TableTimerStore {
    /// Opens (or creates) the store at `path`.
    pub fn open(
        path: impl AsRef<Path>,
        instance_id: u64,
        coord: Option<Arc<dyn CoordClient>>,
    ) -> Result<Self> {
        let db = sled::Config::default().path(path).open()?;
        Self::with_db(db, instance_id, coord)
    }

    /// Wraps an already-open database handle.
    pub fn with_db(
        db: sled::Db,
        instance_id: u64,
        coord: Option<Arc<dyn CoordClient>>,
    ) -> Result<Self> {
        let timers = db.open_tree(TIMER_TREE)?;
        let key_index = db.open_tree(INDEX_TREE)?;
        let notifier = coord.map(|client| CoordWatchNotifier::new(instance_id, client));
        debug!(instance_id, watch = notifier.is_some(), "table timer store opened");
        Ok(Self {
            db,
            timers,
            key_index,
            notifier,
        })
    }

    fn notify(&self, tp: WatchTimerEventType, timer_id: &str) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(tp, timer_id);
        }
    }
}

/// Unique-index key: length-prefixed namespace followed by the timer key,
/// so `("ab", "c")` and `("a", "bc")` cannot collide.
fn index_key(namespace: &str, key: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + namespace.len() + key.len());
    buf.extend_from_slice(&(namespace.len() as u32).to_be_bytes());
    buf.extend_from_slice(namespace.as_bytes());
    buf.extend_from_slice(key.as_bytes());
    buf
}

fn abort(err: impl Into<Error>) -> ConflictableTransactionError<Error> {
    ConflictableTransactionError::Abort(err.into())
}

fn unpack<T>(result: std::result::Result<T, TransactionError<Error>>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(TransactionError::Abort(err)) => Err(err),
        Err(TransactionError::Storage(err)) => Err(StorageError::Db(err).into()),
    }
}

#[async_trait]
impl TimerStore for TableTimerStore {
    async fn create(&self, record: &TimerRecord) -> Result<String> {
        validate_timer_spec(&record.spec)?;

        let mut stored = record.clone();
        stored.id = Uuid::new_v4().to_string();
        stored.version = INITIAL_TIMER_VERSION;
        stored.create_time = Some(SystemTime::now());
        stored.event_status = SchedEventStatus::Idle;

        let id = stored.id.clone();
        let idx = index_key(&stored.spec.namespace, &stored.spec.key);
        let row = bincode::serialize(&stored)?;

        let result = (&self.timers, &self.key_index).transaction(|(timers, key_index)| {
            if key_index.get(idx.as_slice())?.is_some() {
                return Err(abort(TimerError::AlreadyExists));
            }
            key_index.insert(idx.as_slice(), id.as_bytes())?;
            timers.insert(id.as_bytes(), row.as_slice())?;
            Ok(())
        });
        unpack(result)?;

        debug!(timer_id = %id, "timer created");
        self.notify(WatchTimerEventType::Create, &id);
        Ok(id)
    }

    async fn get_by_id(&self, id: &str) -> Result<TimerRecord> {
        match self.timers.get(id.as_bytes())? {
            Some(raw) => Ok(bincode::deserialize(&raw)?),
            None => Err(TimerError::NotExist.into()),
        }
    }

    async fn get_by_key(&self, namespace: &str, key: &str) -> Result<TimerRecord> {
        let idx = index_key(namespace, key);
        match self.key_index.get(idx)? {
            Some(id) => match self.timers.get(&id)? {
                Some(raw) => Ok(bincode::deserialize(&raw)?),
                None => Err(TimerError::NotExist.into()),
            },
            None => Err(TimerError::NotExist.into()),
        }
    }

    async fn list(&self, cond: Option<&Cond>) -> Result<Vec<TimerRecord>> {
        // a pure (namespace, key) equality condition is answered from the
        // unique index
        if let Some((namespace, key)) = cond.and_then(|c| c.as_key_lookup()) {
            return match self.get_by_key(namespace, key).await {
                Ok(record) => Ok(vec![record]),
                Err(err) if err.is_timer_not_exist() => Ok(Vec::new()),
                Err(err) => Err(err),
            };
        }

        let mut records = Vec::new();
        for item in self.timers.iter() {
            let (_, raw) = item?;
            let record: TimerRecord = bincode::deserialize(&raw)?;
            if cond.map_or(true, |c| c.evaluate(&record)) {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn update(&self, id: &str, update: &TimerUpdate) -> Result<()> {
        let result = (&self.timers, &self.key_index).transaction(|(timers, _)| {
            let raw = timers
                .get(id.as_bytes())?
                .ok_or_else(|| abort(TimerError::NotExist))?;
            let current: TimerRecord =
                bincode::deserialize(&raw).map_err(|e| abort(StorageError::Codec(e)))?;

            let mut updated = update.apply(&current).map_err(ConflictableTransactionError::Abort)?;
            updated.version = current.version + 1;

            let row = bincode::serialize(&updated).map_err(|e| abort(StorageError::Codec(e)))?;
            timers.insert(id.as_bytes(), row.as_slice())?;
            Ok(())
        });
        unpack(result)?;

        self.notify(WatchTimerEventType::Update, id);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = (&self.timers, &self.key_index).transaction(|(timers, key_index)| {
            let Some(raw) = timers.get(id.as_bytes())? else {
                return Ok(false);
            };
            let record: TimerRecord =
                bincode::deserialize(&raw).map_err(|e| abort(StorageError::Codec(e)))?;

            timers.remove(id.as_bytes())?;
            key_index.remove(index_key(&record.spec.namespace, &record.spec.key))?;
            Ok(true)
        });
        let existed = unpack(result)?;

        if existed {
            self.notify(WatchTimerEventType::Delete, id);
        }
        Ok(existed)
    }

    fn watch_supported(&self) -> bool {
        self.notifier.is_some()
    }

    fn watch(&self, cancel: CancellationToken) -> WatchTimerChan {
        match &self.notifier {
            Some(notifier) => notifier.watch(cancel),
            None => closed_watch_chan(),
        }
    }

    async fn close(&self) {
        if let Some(notifier) = &self.notifier {
            notifier.close().await;
        }
        if let Err(err) = self.db.flush() {
            warn!(%err, "flush on close failed");
        }
    }
}
