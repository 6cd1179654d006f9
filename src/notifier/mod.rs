//! Watch fan-out: single producer, many subscribers.

mod coord;
mod mem;

pub use coord::*;
pub use mem::*;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::WatchTimerChan;
use crate::api::WatchTimerEventType;


/// Broadcast source of timer lifecycle events.
///
/// Delivery is a best-effort live tail: within one subscriber events
/// arrive in publication order, there is no cross-subscriber ordering, and
/// nothing is replayed across notifier restarts.
#[async_trait]
pub trait TimerWatchEventNotifier: Send + Sync {
    /// Fans the event out to all live subscribers. Never blocks on a slow
    /// subscriber. A no-op after [`close`](Self::close).
    fn notify(&self, tp: WatchTimerEventType, timer_id: &str);

    /// Registers a subscriber. Cancelling the token removes it and closes
    /// its channel. After [`close`](Self::close) the returned channel is
    /// already closed.
    fn watch(&self, cancel: CancellationToken) -> WatchTimerChan;

    /// Terminal and idempotent. Closes every live subscriber channel and
    /// stops background work before returning.
    async fn close(&self);
}

/// An already-closed subscriber channel.
pub(crate) fn closed_watch_chan() -> WatchTimerChan {
    let (_, rx) = mpsc::channel(1);
    rx
}
