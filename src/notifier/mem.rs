use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::api::WatchTimerChan;
use crate::api::WatchTimerEvent;
use crate::api::WatchTimerEventType;
use crate::api::WatchTimerResponse;
use crate::notifier::closed_watch_chan;
use crate::notifier::TimerWatchEventNotifier;

/// Default per-subscriber buffer.
const DEFAULT_SUBSCRIBER_BUF: usize = 128;

type SubscriberMap = HashMap<u64, mpsc::Sender<WatchTimerResponse>>;

/// In-process broadcast notifier.
///
/// Each subscriber owns a bounded buffer; `notify` enqueues without ever
/// waiting. A subscriber whose buffer is full is dropped and its channel
/// closed, leaving the producer and the other subscribers unaffected.
pub struct MemWatchNotifier {
    /// `None` once closed.
    subscribers: Arc<Mutex<Option<SubscriberMap>>>,
    next_id: AtomicU64,
    buf_size: usize,
    shutdown: CancellationToken,
}

impl MemWatchNotifier {
    pub fn new() -> Self {
        Self::with_buffer_size(DEFAULT_SUBSCRIBER_BUF)
    }

    /// `buf_size` bounds how many undelivered responses one subscriber may
    /// accumulate before it is dropped.
    pub fn with_buffer_size(buf_size: usize) -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Some(HashMap::new()))),
            next_id: AtomicU64::new(1),
            buf_size,
            shutdown: CancellationToken::new(),
        }
    }
}

impl Default for MemWatchNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TimerWatchEventNotifier for MemWatchNotifier {
    fn notify(&self, tp: WatchTimerEventType, timer_id: &str) {
        let response = WatchTimerResponse {
            events: vec![WatchTimerEvent {
                tp,
                timer_id: timer_id.to_string(),
            }],
        };

        let mut guard = self.subscribers.lock();
        let Some(subscribers) = guard.as_mut() else {
            return;
        };

        let mut dead = Vec::new();
        for (id, sender) in subscribers.iter() {
            match sender.try_send(response.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(subscriber = *id, "watch subscriber buffer full, dropping subscriber");
                    dead.push(*id);
                }
                Err(TrySendError::Closed(_)) => dead.push(*id),
            }
        }
        for id in dead {
            subscribers.remove(&id);
        }
    }

    fn watch(&self, cancel: CancellationToken) -> WatchTimerChan {
        let (sender, receiver) = mpsc::channel(self.buf_size);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        {
            let mut guard = self.subscribers.lock();
            let Some(subscribers) = guard.as_mut() else {
                return closed_watch_chan();
            };
            subscribers.insert(id, sender);
        }
        trace!(subscriber = id, "watch subscriber registered");

        let subscribers = Arc::clone(&self.subscribers);
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    if let Some(subscribers) = subscribers.lock().as_mut() {
                        subscribers.remove(&id);
                    }
                    trace!(subscriber = id, "watch subscriber unregistered");
                }
                _ = shutdown.cancelled() => {}
            }
        });

        receiver
    }

    async fn close(&self) {
        let removed = self.subscribers.lock().take();
        self.shutdown.cancel();
        if let Some(subscribers) = removed {
            debug!(count = subscribers.len(), "watch notifier closed");
        }
    }
}
