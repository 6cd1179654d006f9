use std::fmt;
use std::time::SystemTime;

use serde::Deserialize;
use serde::Serialize;

/// Version assigned to a record on creation. Every successful update bumps
/// the version by exactly one.
pub const INITIAL_TIMER_VERSION: u64 = 1;

/// Three-state field carrier distinguishing "field omitted" from "field set
/// to its zero value".
///
/// Both [`TimerUpdate`](crate::TimerUpdate) (which fields to change) and
/// [`TimerCond`](crate::TimerCond) (which predicates to apply) need the
/// distinction, so plain `Option` semantics are given a dedicated name.
/// Clearable values nest an inner `Option`: `Set(None)` clears, `Absent`
/// leaves the field alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionalVal<T> {
    Absent,
    Set(T),
}

impl<T> OptionalVal<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, OptionalVal::Set(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            OptionalVal::Set(v) => Some(v),
            OptionalVal::Absent => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            OptionalVal::Set(v) => Some(v),
            OptionalVal::Absent => None,
        }
    }
}

impl<T> Default for OptionalVal<T> {
    fn default() -> Self {
        OptionalVal::Absent
    }
}

impl<T> From<T> for OptionalVal<T> {
    fn from(value: T) -> Self {
        OptionalVal::Set(value)
    }
}

/// Schedule policy tag. `Unspecified` is the zero variant and fails
/// required-field validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SchedPolicyType {
    #[default]
    Unspecified,
    /// Fixed-interval firing, expression is a duration literal like `1h`.
    Interval,
}

impl fmt::Display for SchedPolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedPolicyType::Unspecified => f.write_str(""),
            SchedPolicyType::Interval => f.write_str("INTERVAL"),
        }
    }
}

/// Whether the most recent firing of a timer is still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SchedEventStatus {
    #[default]
    Idle,
    Trigger,
}

/// User-authored part of a timer, mutable through updates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimerSpec {
    /// Logical tenant, non-empty.
    pub namespace: String,
    /// Unique within a namespace. Path-like but opaque to the store.
    pub key: String,
    pub tags: Vec<String>,
    /// Opaque payload handed to whatever fires the timer.
    pub data: Vec<u8>,
    pub sched_policy_type: SchedPolicyType,
    pub sched_policy_expr: String,
}

/// A full timer record: the user spec plus store-managed fields.
///
/// Records returned by a store are snapshots; mutating one never affects
/// the stored state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimerRecord {
    pub spec: TimerSpec,

    /// Globally unique, assigned at creation, immutable afterwards.
    pub id: String,

    /// Bumped by exactly one on every successful update, never reused.
    pub version: u64,

    /// Set at creation, immutable afterwards.
    pub create_time: Option<SystemTime>,

    pub event_status: SchedEventStatus,

    /// Identifier of the in-flight event. The store keeps no consistency
    /// between this and `event_status` across independent updates; that is
    /// the caller's contract.
    pub event_id: String,
    pub event_data: Vec<u8>,
    pub event_start: Option<SystemTime>,

    /// Timestamp of the last acknowledged progress.
    pub watermark: Option<SystemTime>,

    pub summary_data: Vec<u8>,
}
