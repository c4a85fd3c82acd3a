//! Exception Policy Errors

use thiserror::Error;

/// Result type for exception policy operations
pub type ExceptionResult<T> = Result<T, ExceptionError>;

/// Exception policy errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExceptionError {
    #[error("Invalid exception action: {0}")]
    InvalidAction(String),

    #[error("Failed to parse exception rules: {0}")]
    Parse(String),
}
