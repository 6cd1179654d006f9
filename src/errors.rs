//! Timer Registry Error Hierarchy
//!
//! Defines error types for the timer registry, categorized by concern:
//! domain errors (lookups and optimistic-concurrency preconditions),
//! validation errors with fixed caller-facing messages, and storage
//! transport failures surfaced from the embedded engine unchanged.

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Lookup and optimistic-concurrency failures
    #[error(transparent)]
    Timer(#[from] TimerError),

    /// Field and schedule-expression validation failures
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Underlying engine failures (disk, serialization)
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl Error {
    /// Whether this error means the requested timer does not exist.
    pub fn is_timer_not_exist(&self) -> bool {
        matches!(self, Error::Timer(TimerError::NotExist))
    }

    /// Whether this error means a `(namespace, key)` pair is already taken.
    pub fn is_timer_exists(&self) -> bool {
        matches!(self, Error::Timer(TimerError::AlreadyExists))
    }

    /// Whether a `check_version` precondition failed.
    pub fn is_version_not_match(&self) -> bool {
        matches!(self, Error::Timer(TimerError::VersionNotMatch))
    }

    /// Whether a `check_event_id` precondition failed.
    pub fn is_event_id_not_match(&self) -> bool {
        matches!(self, Error::Timer(TimerError::EventIdNotMatch))
    }
}

/// Domain errors. Distinct and comparable so callers can branch on them;
/// none of these are retried by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimerError {
    #[error("timer not exist")]
    NotExist,

    #[error("timer already exists")]
    AlreadyExists,

    #[error("timer version not match")]
    VersionNotMatch,

    #[error("timer event id not match")]
    EventIdNotMatch,
}

/// Validation failures for user-authored timer specs.
///
/// Message texts are part of the API surface and must stay stable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("field '{0}' should not be empty")]
    EmptyField(&'static str),

    #[error("schedule event configuration is not valid: {0}")]
    SchedEvent(#[from] SchedExprError),
}

/// Schedule expression parse failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedExprError {
    #[error("invalid schedule event expr '{expr}': unknown unit {unit}")]
    UnknownUnit { expr: String, unit: String },

    #[error("invalid schedule event expr '{expr}': missing unit")]
    MissingUnit { expr: String },

    #[error("invalid schedule event expr '{expr}': missing value")]
    MissingValue { expr: String },

    #[error("invalid schedule event expr '{expr}': empty expression")]
    Empty { expr: String },
}

/// Embedded engine failures, surfaced unchanged.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Embedded database errors
    #[error(transparent)]
    Db(#[from] sled::Error),

    /// Serialization failures for persisted rows
    #[error(transparent)]
    Codec(#[from] bincode::Error),
}

impl From<sled::Error> for Error {
    fn from(err: sled::Error) -> Self {
        Error::Storage(StorageError::Db(err))
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Storage(StorageError::Codec(err))
    }
}

impl From<SchedExprError> for Error {
    fn from(err: SchedExprError) -> Self {
        Error::Validation(ValidationError::SchedEvent(err))
    }
}
