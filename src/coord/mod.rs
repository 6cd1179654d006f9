//! Boundary to the external coordination service.
//!
//! Only two capabilities of the service matter to the registry: writing a
//! key and watching a key range. Everything else (leases, elections,
//! transactions) stays on the other side of this seam.

mod mem;

pub use mem::*;

use async_trait::async_trait;
use bytes::Bytes;
#[cfg(test)]
use mockall::automock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::errors::Result;


/// A key write observed by a prefix watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordEvent {
    pub key: String,
    pub value: Bytes,
}

/// Client handle to a coordination service supporting key writes and
/// ranged watches.
///
/// Watches are a live tail: only writes made after the watch was opened
/// are observed, and a watcher that cannot keep up loses events rather
/// than stalling writers.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CoordClient: Send + Sync + 'static {
    /// Writes a key. Keys are opaque slash-separated paths.
    async fn put(&self, key: &str, value: Bytes) -> Result<()>;

    /// Streams every subsequent write under `prefix` until `cancel` fires.
    fn watch_prefix(&self, prefix: &str, cancel: CancellationToken) -> mpsc::Receiver<CoordEvent>;
}
