use std::time::SystemTime;

use crate::api::record::OptionalVal;
use crate::api::record::SchedEventStatus;
use crate::api::record::SchedPolicyType;
use crate::api::record::TimerRecord;
use crate::api::validate::validate_sched_event;
use crate::errors::Result;
use crate::errors::TimerError;

/// Partial-field mutation set with optional preconditions.
///
/// Absent fields are left untouched; `Set` fields take the given value even
/// when it is zero or empty. Preconditions are evaluated atomically with
/// the write: on failure the record is unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerUpdate {
    /// Replaces the whole tag list.
    pub tags: OptionalVal<Vec<String>>,
    pub sched_policy_type: OptionalVal<SchedPolicyType>,
    pub sched_policy_expr: OptionalVal<String>,
    pub event_status: OptionalVal<SchedEventStatus>,
    /// Empty string is a legal value.
    pub event_id: OptionalVal<String>,
    pub event_data: OptionalVal<Vec<u8>>,
    pub event_start: OptionalVal<Option<SystemTime>>,
    pub watermark: OptionalVal<Option<SystemTime>>,
    pub summary_data: OptionalVal<Vec<u8>>,

    /// Require the current version to equal this value.
    pub check_version: OptionalVal<u64>,
    /// Require the current event id to equal this value.
    pub check_event_id: OptionalVal<String>,
}

impl TimerUpdate {
    /// Checks preconditions against `record` and produces the updated
    /// snapshot. Re-validates the schedule expression when either policy
    /// field is touched. Does not bump the version; the store owns that.
    pub fn apply(&self, record: &TimerRecord) -> Result<TimerRecord> {
        if let OptionalVal::Set(version) = self.check_version {
            if record.version != version {
                return Err(TimerError::VersionNotMatch.into());
            }
        }

        if let OptionalVal::Set(event_id) = &self.check_event_id {
            if record.event_id != *event_id {
                return Err(TimerError::EventIdNotMatch.into());
            }
        }

        let mut updated = record.clone();

        if let OptionalVal::Set(tags) = &self.tags {
            updated.spec.tags = tags.clone();
        }
        if let OptionalVal::Set(tp) = self.sched_policy_type {
            updated.spec.sched_policy_type = tp;
        }
        if let OptionalVal::Set(expr) = &self.sched_policy_expr {
            updated.spec.sched_policy_expr = expr.clone();
        }
        if self.sched_policy_type.is_set() || self.sched_policy_expr.is_set() {
            validate_sched_event(
                updated.spec.sched_policy_type,
                &updated.spec.sched_policy_expr,
            )?;
        }

        if let OptionalVal::Set(status) = self.event_status {
            updated.event_status = status;
        }
        if let OptionalVal::Set(event_id) = &self.event_id {
            updated.event_id = event_id.clone();
        }
        if let OptionalVal::Set(event_data) = &self.event_data {
            updated.event_data = event_data.clone();
        }
        if let OptionalVal::Set(event_start) = self.event_start {
            updated.event_start = event_start;
        }
        if let OptionalVal::Set(watermark) = self.watermark {
            updated.watermark = watermark;
        }
        if let OptionalVal::Set(summary_data) = &self.summary_data {
            updated.summary_data = summary_data.clone();
        }

        Ok(updated)
    }
}
