use crate::api::record::OptionalVal;
use crate::api::record::TimerRecord;

/// Atomic query predicate. Absent fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerCond {
    /// Namespace equality.
    pub namespace: OptionalVal<String>,
    /// Key equality, or prefix match when `key_prefix` is set.
    pub key: OptionalVal<String>,
    pub key_prefix: bool,
    /// Subset match: every listed tag must appear on the record,
    /// order-insensitive. An empty set matches every record.
    pub tags: OptionalVal<Vec<String>>,
}

impl TimerCond {
    pub fn matches(&self, record: &TimerRecord) -> bool {
        if let OptionalVal::Set(namespace) = &self.namespace {
            if record.spec.namespace != *namespace {
                return false;
            }
        }

        if let OptionalVal::Set(key) = &self.key {
            if self.key_prefix {
                if !record.spec.key.starts_with(key.as_str()) {
                    return false;
                }
            } else if record.spec.key != *key {
                return false;
            }
        }

        if let OptionalVal::Set(tags) = &self.tags {
            if !tags
                .iter()
                .all(|t| record.spec.tags.iter().any(|rt| rt == t))
            {
                return false;
            }
        }

        true
    }
}

/// Boolean combination of atomic predicates. Compound nodes short-circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cond {
    Atom(TimerCond),
    And(Vec<Cond>),
    Or(Vec<Cond>),
    Not(Box<Cond>),
}

impl Cond {
    pub fn and(conds: impl IntoIterator<Item = Cond>) -> Self {
        Cond::And(conds.into_iter().collect())
    }

    pub fn or(conds: impl IntoIterator<Item = Cond>) -> Self {
        Cond::Or(conds.into_iter().collect())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(cond: Cond) -> Self {
        Cond::Not(Box::new(cond))
    }

    pub fn evaluate(&self, record: &TimerRecord) -> bool {
        match self {
            Cond::Atom(cond) => cond.matches(record),
            Cond::And(conds) => conds.iter().all(|c| c.evaluate(record)),
            Cond::Or(conds) => conds.iter().any(|c| c.evaluate(record)),
            Cond::Not(cond) => !cond.evaluate(record),
        }
    }

    /// Returns `(namespace, key)` when this condition is a pure equality on
    /// both, so a backend can satisfy it from the unique index instead of a
    /// scan.
    pub(crate) fn as_key_lookup(&self) -> Option<(&str, &str)> {
        match self {
            Cond::Atom(cond) if !cond.key_prefix && !cond.tags.is_set() => {
                match (cond.namespace.get(), cond.key.get()) {
                    (Some(namespace), Some(key)) => Some((namespace, key)),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl From<TimerCond> for Cond {
    fn from(cond: TimerCond) -> Self {
        Cond::Atom(cond)
    }
}
