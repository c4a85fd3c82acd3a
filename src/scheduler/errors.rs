//! # Scheduler Errors

use thiserror::Error;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler errors
///
/// The initiator never swallows these; they propagate out of
/// `start()`, `stop()` and `invoke()` unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("Trigger already exists: {group}.{name}")]
    TriggerExists { name: String, group: String },

    #[error("Job already exists: {group}.{name}")]
    JobExists { name: String, group: String },

    #[error("Job not found: {group}.{name}")]
    JobNotFound { name: String, group: String },

    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidCron { expression: String, reason: String },

    #[error("Scheduler has been shut down")]
    Shutdown,

    #[error("Trigger store error: {0}")]
    Store(String),

    #[error("Scheduler unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SchedulerError {
    /// Create a lock-poisoned internal error
    pub fn poisoned() -> Self {
        SchedulerError::Internal("Lock poisoned".into())
    }

    /// Whether retrying the same call could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, SchedulerError::Unavailable(_) | SchedulerError::Store(_))
    }
}
