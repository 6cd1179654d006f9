use std::time::Duration;

use crate::api::record::SchedPolicyType;
use crate::api::record::TimerSpec;
use crate::errors::Result;
use crate::errors::SchedExprError;
use crate::errors::ValidationError;

/// Checks the required fields of a user-authored spec and validates the
/// schedule expression against the policy type.
pub fn validate_timer_spec(spec: &TimerSpec) -> Result<()> {
    if spec.namespace.is_empty() {
        return Err(ValidationError::EmptyField("Namespace").into());
    }
    if spec.key.is_empty() {
        return Err(ValidationError::EmptyField("Key").into());
    }
    if spec.sched_policy_type == SchedPolicyType::Unspecified {
        return Err(ValidationError::EmptyField("SchedPolicyType").into());
    }
    validate_sched_event(spec.sched_policy_type, &spec.sched_policy_expr)
}

/// Validates that `expr` is legal for the given policy type.
pub fn validate_sched_event(tp: SchedPolicyType, expr: &str) -> Result<()> {
    match tp {
        SchedPolicyType::Unspecified => Err(ValidationError::EmptyField("SchedPolicyType").into()),
        SchedPolicyType::Interval => {
            parse_interval_expr(expr)?;
            Ok(())
        }
    }
}

/// Parses an interval expression into a duration.
///
/// An expression is one or more `<integer><unit>` segments, e.g. `1h`,
/// `30m`, `1h30m`. Recognized units: `ns`, `us`, `ms`, `s`, `m`, `h`, `d`.
pub fn parse_interval_expr(expr: &str) -> std::result::Result<Duration, SchedExprError> {
    if expr.is_empty() {
        return Err(SchedExprError::Empty {
            expr: expr.to_string(),
        });
    }

    let mut total = Duration::ZERO;
    let mut rest = expr;
    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(SchedExprError::MissingValue {
                expr: expr.to_string(),
            });
        }
        let value: u64 = rest[..digits_end]
            .parse()
            .map_err(|_| SchedExprError::MissingValue {
                expr: expr.to_string(),
            })?;
        rest = &rest[digits_end..];

        let unit_end = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        let segment = match unit {
            "ns" => Duration::from_nanos(value),
            "us" => Duration::from_micros(value),
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.saturating_mul(60)),
            "h" => Duration::from_secs(value.saturating_mul(3600)),
            "d" => Duration::from_secs(value.saturating_mul(86400)),
            "" => {
                return Err(SchedExprError::MissingUnit {
                    expr: expr.to_string(),
                })
            }
            _ => {
                return Err(SchedExprError::UnknownUnit {
                    expr: expr.to_string(),
                    unit: unit.to_string(),
                })
            }
        };
        total = total.saturating_add(segment);
        rest = &rest[unit_end..];
    }

    Ok(total)
}
