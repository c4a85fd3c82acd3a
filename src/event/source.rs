//! # Event Sources

use thiserror::Error;

use super::Event;

/// Result type for event source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Event source errors. Never caught by the initiator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("Resource error: {0}")]
    Resource(String),

    #[error("Message conversion failed: {0}")]
    Conversion(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Pull-model supplier of events.
///
/// `get_events` is called once per invocation. `None` or an empty batch
/// ends the invocation as a success.
pub trait EventSource: Send {
    /// Next batch of events, in processing order
    fn get_events(&mut self) -> SourceResult<Option<Vec<Event>>>;

    /// The first `consumed` events of the last batch are settled.
    ///
    /// Not called when the invocation aborts the transaction, so a
    /// source that only forgets acknowledged events re-presents the
    /// rolled-back batch on the next call.
    fn acknowledge(&mut self, _consumed: usize) {}
}

impl<F> EventSource for F
where
    F: FnMut() -> SourceResult<Option<Vec<Event>>> + Send,
{
    fn get_events(&mut self) -> SourceResult<Option<Vec<Event>>> {
        self()
    }
}
