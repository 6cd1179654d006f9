use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::api::WatchTimerChan;
use crate::api::WatchTimerEvent;
use crate::api::WatchTimerEventType;
use crate::api::WatchTimerResponse;
use crate::coord::CoordClient;
use crate::coord::CoordEvent;
use crate::notifier::closed_watch_chan;
use crate::notifier::TimerWatchEventNotifier;

/// Root of the key namespace events are published under.
pub const NOTIFY_KEY_PREFIX: &str = "/tickstore/notify";

/// Per-subscriber response buffer.
const WATCH_RESPONSE_BUF: usize = 128;

/// Notifier bridged over the external coordination service.
///
/// `notify` hands the event to a background publisher that writes
/// `<prefix>/<instance-id>/<sequence>` keys in publication order with the
/// value `<event-type>:<timer-id>`; `watch` tails the same range. Two
/// instances interoperate only when they deliberately share an
/// `instance_id` (and the same coordination service); the id keeps
/// unrelated registries on a shared cluster from cross-talking.
pub struct CoordWatchNotifier {
    client: Arc<dyn CoordClient>,
    prefix: String,
    queue: mpsc::UnboundedSender<WatchTimerEvent>,
    publisher: Mutex<Option<JoinHandle<()>>>,
    shutdown: CancellationToken,
}

impl CoordWatchNotifier {
    pub fn new(instance_id: u64, client: Arc<dyn CoordClient>) -> Self {
        let prefix = format!("{NOTIFY_KEY_PREFIX}/{instance_id}");
        let (queue, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let publisher = tokio::spawn(Self::publish_loop(
            Arc::clone(&client),
            prefix.clone(),
            rx,
            shutdown.clone(),
        ));

        Self {
            client,
            prefix,
            queue,
            publisher: Mutex::new(Some(publisher)),
            shutdown,
        }
    }

    async fn publish_loop(
        client: Arc<dyn CoordClient>,
        prefix: String,
        mut rx: mpsc::UnboundedReceiver<WatchTimerEvent>,
        shutdown: CancellationToken,
    ) {
        let mut sequence = 0u64;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = rx.recv() => {
                    let Some(event) = event else { break };
                    let key = format!("{prefix}/{sequence}");
                    sequence += 1;
                    let value = Bytes::from(format!("{}:{}", event.tp, event.timer_id));
                    if let Err(err) = client.put(&key, value).await {
                        warn!(%err, %key, "failed to publish watch event");
                    }
                }
            }
        }
        trace!(%prefix, "watch event publisher stopped");
    }
}

fn decode_event(value: &Bytes) -> Option<WatchTimerEvent> {
    let text = std::str::from_utf8(value).ok()?;
    let (label, timer_id) = text.split_once(':')?;
    Some(WatchTimerEvent {
        tp: WatchTimerEventType::from_label(label)?,
        timer_id: timer_id.to_string(),
    })
}

#[async_trait]
impl TimerWatchEventNotifier for CoordWatchNotifier {
    fn notify(&self, tp: WatchTimerEventType, timer_id: &str) {
        if self.shutdown.is_cancelled() {
            return;
        }
        let _ = self.queue.send(WatchTimerEvent {
            tp,
            timer_id: timer_id.to_string(),
        });
    }

    fn watch(&self, cancel: CancellationToken) -> WatchTimerChan {
        if self.shutdown.is_cancelled() {
            return closed_watch_chan();
        }

        let (tx, rx) = mpsc::channel(WATCH_RESPONSE_BUF);
        // trailing slash so instance 7 never tails instance 70
        let mut events = self
            .client
            .watch_prefix(&format!("{}/", self.prefix), cancel.clone());
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = cancel.cancelled() => break,
                    event = events.recv() => {
                        let Some(CoordEvent { key, value }) = event else { break };
                        let Some(event) = decode_event(&value) else {
                            warn!(%key, "malformed watch event value");
                            continue;
                        };
                        let response = WatchTimerResponse { events: vec![event] };
                        if tx.send(response).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        rx
    }

    async fn close(&self) {
        let publisher = self.publisher.lock().take();
        self.shutdown.cancel();
        if let Some(publisher) = publisher {
            if let Err(err) = publisher.await {
                warn!(%err, "watch event publisher task failed");
            }
            debug!(prefix = %self.prefix, "coordination notifier closed");
        }
    }
}
