use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::cond::Cond;
use crate::api::record::TimerRecord;
use crate::api::update::TimerUpdate;
use crate::errors::Result;

/// Lifecycle transition kind carried by watch events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchTimerEventType {
    Create,
    Update,
    Delete,
}

impl WatchTimerEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchTimerEventType::Create => "create",
            WatchTimerEventType::Update => "update",
            WatchTimerEventType::Delete => "delete",
        }
    }

    /// Inverse of [`as_str`](Self::as_str), used when decoding events off
    /// the coordination service.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "create" => Some(WatchTimerEventType::Create),
            "update" => Some(WatchTimerEventType::Update),
            "delete" => Some(WatchTimerEventType::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for WatchTimerEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lifecycle transition of one timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTimerEvent {
    pub tp: WatchTimerEventType,
    pub timer_id: String,
}

/// A batch of watch events. Responses may carry several events but each
/// event stands alone semantically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchTimerResponse {
    pub events: Vec<WatchTimerEvent>,
}

/// Subscriber end of a watch. The channel closes when the subscription is
/// cancelled, the subscriber is dropped for slowness, or the source closes.
pub type WatchTimerChan = mpsc::Receiver<WatchTimerResponse>;

/// A registry of timer records with optimistic-concurrency updates,
/// compound query filtering, and a best-effort live tail of lifecycle
/// events.
#[async_trait]
pub trait TimerStore: Send + Sync {
    /// Validates and stores a new record, assigning its id, version and
    /// create time. The caller's record is not mutated. Fails with
    /// `timer already exists` when the `(namespace, key)` pair is taken.
    async fn create(&self, record: &TimerRecord) -> Result<String>;

    /// Returns a fresh snapshot of the record with the given id.
    async fn get_by_id(&self, id: &str) -> Result<TimerRecord>;

    /// Returns a fresh snapshot of the record with the given
    /// `(namespace, key)`.
    async fn get_by_key(&self, namespace: &str, key: &str) -> Result<TimerRecord>;

    /// Returns every record matching `cond`; `None` matches all. Order is
    /// unspecified and the returned snapshots are independent.
    async fn list(&self, cond: Option<&Cond>) -> Result<Vec<TimerRecord>>;

    /// Applies a partial update under its preconditions and bumps the
    /// version by one. On any failure the record is unchanged.
    async fn update(&self, id: &str, update: &TimerUpdate) -> Result<()>;

    /// Removes the record if present, reporting whether it existed.
    /// Deleting a missing id is not an error.
    async fn delete(&self, id: &str) -> Result<bool>;

    fn watch_supported(&self) -> bool;

    /// Subscribes to lifecycle events. Cancelling the token closes the
    /// channel. Only meaningful when [`watch_supported`](Self::watch_supported)
    /// returns true; otherwise the channel is already closed.
    fn watch(&self, cancel: CancellationToken) -> WatchTimerChan;

    /// Releases all resources. Idempotent; pending watchers are closed and
    /// subsequent [`watch`](Self::watch) calls return a closed channel.
    async fn close(&self);
}
