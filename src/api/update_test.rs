use std::time::Duration;
use std::time::SystemTime;

use crate::api::record::OptionalVal;
use crate::api::record::SchedEventStatus;
use crate::api::record::SchedPolicyType;
use crate::api::record::TimerRecord;
use crate::api::record::TimerSpec;
use crate::api::update::TimerUpdate;

fn base_record() -> TimerRecord {
    TimerRecord {
        spec: TimerSpec {
            namespace: "n1".to_string(),
            key: "/path/to/key".to_string(),
            sched_policy_type: SchedPolicyType::Interval,
            sched_policy_expr: "1h".to_string(),
            ..Default::default()
        },
        id: "id1".to_string(),
        version: 7,
        event_id: "evt1".to_string(),
        ..Default::default()
    }
}

fn unix(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

#[test]
fn test_empty_update_changes_nothing() {
    let record = base_record();
    let updated = TimerUpdate::default().apply(&record).unwrap();
    assert_eq!(updated, record);
}

#[test]
fn test_partial_update_touches_named_fields_only() {
    let record = base_record();
    let update = TimerUpdate {
        tags: OptionalVal::Set(vec!["l1".to_string(), "l2".to_string()]),
        event_status: OptionalVal::Set(SchedEventStatus::Trigger),
        event_start: OptionalVal::Set(Some(unix(1234567))),
        watermark: OptionalVal::Set(Some(unix(7890123))),
        ..Default::default()
    };

    let updated = update.apply(&record).unwrap();
    assert_eq!(updated.spec.tags, vec!["l1".to_string(), "l2".to_string()]);
    assert_eq!(updated.event_status, SchedEventStatus::Trigger);
    assert_eq!(updated.event_start, Some(unix(1234567)));
    assert_eq!(updated.watermark, Some(unix(7890123)));

    // untouched fields survive, including the version
    assert_eq!(updated.spec.sched_policy_expr, "1h");
    assert_eq!(updated.event_id, "evt1");
    assert_eq!(updated.version, record.version);
}

#[test]
fn test_set_fields_to_zero_values() {
    let mut record = base_record();
    record.spec.tags = vec!["l1".to_string()];
    record.event_data = b"payload".to_vec();
    record.event_start = Some(unix(1));

    let update = TimerUpdate {
        tags: OptionalVal::Set(Vec::new()),
        event_id: OptionalVal::Set(String::new()),
        event_data: OptionalVal::Set(Vec::new()),
        event_start: OptionalVal::Set(None),
        event_status: OptionalVal::Set(SchedEventStatus::Idle),
        ..Default::default()
    };

    let updated = update.apply(&record).unwrap();
    assert!(updated.spec.tags.is_empty());
    assert!(updated.event_id.is_empty());
    assert!(updated.event_data.is_empty());
    assert_eq!(updated.event_start, None);
    assert_eq!(updated.event_status, SchedEventStatus::Idle);
}

#[test]
fn test_check_version_precondition() {
    let record = base_record();

    let ok = TimerUpdate {
        check_version: OptionalVal::Set(7),
        event_id: OptionalVal::Set("evt2".to_string()),
        ..Default::default()
    };
    assert!(ok.apply(&record).is_ok());

    let stale = TimerUpdate {
        check_version: OptionalVal::Set(8),
        event_id: OptionalVal::Set("evt2".to_string()),
        ..Default::default()
    };
    let err = stale.apply(&record).unwrap_err();
    assert!(err.is_version_not_match());
    assert_eq!(err.to_string(), "timer version not match");
}

#[test]
fn test_check_event_id_precondition() {
    let record = base_record();

    let ok = TimerUpdate {
        check_event_id: OptionalVal::Set("evt1".to_string()),
        ..Default::default()
    };
    assert!(ok.apply(&record).is_ok());

    let mismatch = TimerUpdate {
        check_event_id: OptionalVal::Set("aabb".to_string()),
        ..Default::default()
    };
    let err = mismatch.apply(&record).unwrap_err();
    assert!(err.is_event_id_not_match());
    assert_eq!(err.to_string(), "timer event id not match");
}

#[test]
fn test_sched_expr_revalidated_when_touched() {
    let record = base_record();

    let bad = TimerUpdate {
        sched_policy_expr: OptionalVal::Set("2x".to_string()),
        ..Default::default()
    };
    let err = bad.apply(&record).unwrap_err();
    assert_eq!(
        err.to_string(),
        "schedule event configuration is not valid: invalid schedule event expr '2x': unknown unit x"
    );

    // an illegal stored expr is not re-checked when the update leaves the
    // policy alone
    let mut stale = record.clone();
    stale.spec.sched_policy_expr = "2x".to_string();
    let unrelated = TimerUpdate {
        event_id: OptionalVal::Set("evt2".to_string()),
        ..Default::default()
    };
    assert!(unrelated.apply(&stale).is_ok());
}
