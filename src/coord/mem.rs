use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;
use tracing::warn;

use crate::coord::CoordClient;
use crate::coord::CoordEvent;
use crate::errors::Result;

/// Ring capacity shared by all watchers of one hub.
const HUB_EVENT_CAPACITY: usize = 1024;

/// Per-watcher delivery buffer.
const WATCH_CHAN_CAPACITY: usize = 256;

/// In-process coordination service for single-process deployments and
/// tests.
///
/// Cloned handles share one hub, so components holding different clones
/// still observe each other's writes. A watcher that falls behind the hub
/// ring loses the overwritten events with a logged warning.
#[derive(Debug, Clone)]
pub struct MemCoordService {
    events: broadcast::Sender<CoordEvent>,
}

impl MemCoordService {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(HUB_EVENT_CAPACITY);
        Self { events }
    }
}

impl Default for MemCoordService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CoordClient for MemCoordService {
    async fn put(&self, key: &str, value: Bytes) -> Result<()> {
        trace!(%key, "coord put");
        // send only errors when no watcher is subscribed
        let _ = self.events.send(CoordEvent {
            key: key.to_string(),
            value,
        });
        Ok(())
    }

    fn watch_prefix(&self, prefix: &str, cancel: CancellationToken) -> mpsc::Receiver<CoordEvent> {
        let mut sub = self.events.subscribe();
        let prefix = prefix.to_string();
        let (tx, rx) = mpsc::channel(WATCH_CHAN_CAPACITY);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    received = sub.recv() => match received {
                        Ok(event) => {
                            if !event.key.starts_with(&prefix) {
                                continue;
                            }
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            warn!(missed, %prefix, "coordination watcher lagged, events lost");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            trace!(%prefix, "coordination watcher stopped");
        });

        rx
    }
}
