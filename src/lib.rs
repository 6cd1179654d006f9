//! # tickstore
//!
//! A distributed timer registry: a persistent store of named timer records
//! with optimistic-concurrency updates, compound query filtering, and a
//! watch channel that broadcasts create/update/delete events to any number
//! of concurrent subscribers. It is the coordination layer that lets a
//! cluster of workers agree on which timers exist, observe lifecycle
//! transitions in near-real time, and perform CAS-style mutations without
//! losing updates.
//!
//! ## Features
//! - **Pluggable Storage**: in-memory (leader-local, authoritative) and
//!   table-backed (durable via an embedded transactional engine)
//! - **Optimistic Concurrency**: version and event-id preconditions checked
//!   atomically with every write
//! - **Query Algebra**: atomic predicates composed with and/or/not, prefix
//!   and tag-subset matching
//! - **Watch Fan-out**: per-subscriber bounded buffers, slow-consumer drop,
//!   cluster-wide bridging over an external coordination service
//!
//! ## Quick Start
//! ```no_run
//! use tickstore::{
//!     MemTimerStore, OptionalVal, SchedPolicyType, TimerRecord, TimerSpec, TimerStore,
//!     TimerUpdate,
//! };
//!
//! #[tokio::main]
//! async fn main() -> tickstore::Result<()> {
//!     let store = MemTimerStore::new();
//!
//!     let id = store
//!         .create(&TimerRecord {
//!             spec: TimerSpec {
//!                 namespace: "jobs".to_string(),
//!                 key: "/backup/daily".to_string(),
//!                 sched_policy_type: SchedPolicyType::Interval,
//!                 sched_policy_expr: "24h".to_string(),
//!                 ..Default::default()
//!             },
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     let record = store.get_by_id(&id).await?;
//!     store
//!         .update(
//!             &id,
//!             &TimerUpdate {
//!                 tags: OptionalVal::Set(vec!["nightly".to_string()]),
//!                 check_version: OptionalVal::Set(record.version),
//!                 ..Default::default()
//!             },
//!         )
//!         .await?;
//!
//!     store.close().await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod coord;
pub mod notifier;
pub mod store;

mod errors;

pub use api::*;
pub use coord::*;
pub use errors::*;
pub use notifier::*;
pub use store::*;
