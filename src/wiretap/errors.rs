//! Wiretap Error Types

use thiserror::Error;

/// Result type for wiretap operations
pub type WiretapResult<T> = Result<T, WiretapError>;

/// Wiretap errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WiretapError {
    #[error("Wiretap serialiser is not set")]
    MissingSerialiser,

    #[error("Failed to serialise wiretap payload: {0}")]
    Serialisation(String),
}
