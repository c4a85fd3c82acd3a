//! Initiator Error Types

use thiserror::Error;

use crate::event::SourceError;
use crate::exception::ExceptionActionType;
use crate::scheduler::SchedulerError;

/// Result type for initiator operations
pub type InitiatorResult<T> = Result<T, InitiatorError>;

/// Initiator errors
///
/// `AbortTransaction` is expected control flow, not a defect: it tells
/// the caller that the unit of work must not be committed or
/// acknowledged.
#[derive(Debug, Error)]
pub enum InitiatorError {
    #[error("Initiator '{0}' is not running")]
    NotRunning(String),

    #[error("Transaction aborted by initiator '{initiator}' on {action} (retry count {retry_count:?})")]
    AbortTransaction {
        initiator: String,
        action: ExceptionActionType,
        retry_count: Option<u32>,
    },

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Event source error: {0}")]
    Source(#[from] SourceError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl InitiatorError {
    /// True for the rollback signal raised on retry and stop outcomes
    pub fn is_abort_transaction(&self) -> bool {
        matches!(self, InitiatorError::AbortTransaction { .. })
    }

    /// Action behind an abort signal
    pub fn aborted_action(&self) -> Option<ExceptionActionType> {
        match self {
            InitiatorError::AbortTransaction { action, .. } => Some(*action),
            _ => None,
        }
    }
}

/// Initiator configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for InitiatorError {
    fn from(err: ConfigError) -> Self {
        InitiatorError::Configuration(err.to_string())
    }
}
