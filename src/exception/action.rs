//! # Exception Actions

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{ExceptionError, ExceptionResult};

/// Longest retry delay accepted anywhere, one week
pub const MAX_RETRY_DELAY_MS: u64 = 7 * 24 * 60 * 60 * 1_000;

/// What to do with the unit of work after a flow fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionActionType {
    /// Treat the fault as handled and carry on
    Continue,
    /// Roll back and retry later from a recovery cycle
    RollbackRetry,
    /// Roll back and put the initiator into error
    RollbackStop,
    /// Keep the work done so far and put the initiator into error
    RollforwardStop,
}

impl ExceptionActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExceptionActionType::Continue => "CONTINUE",
            ExceptionActionType::RollbackRetry => "ROLLBACK_RETRY",
            ExceptionActionType::RollbackStop => "ROLLBACK_STOP",
            ExceptionActionType::RollforwardStop => "ROLLFORWARD_STOP",
        }
    }

    /// Any `*_STOP` action
    pub fn is_stop(&self) -> bool {
        matches!(
            self,
            ExceptionActionType::RollbackStop | ExceptionActionType::RollforwardStop
        )
    }

    pub fn is_retry(&self) -> bool {
        matches!(self, ExceptionActionType::RollbackRetry)
    }
}

impl fmt::Display for ExceptionActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A resolved exception action. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionAction {
    action_type: ExceptionActionType,

    /// Delay before each retry; the initiator's policy applies when unset
    #[serde(default)]
    delay_ms: Option<u64>,

    /// Retries allowed before escalating to stop; unbounded when unset
    #[serde(default)]
    max_retries: Option<u32>,
}

impl ExceptionAction {
    pub fn new(action_type: ExceptionActionType) -> Self {
        Self {
            action_type,
            delay_ms: None,
            max_retries: None,
        }
    }

    pub fn continue_processing() -> Self {
        Self::new(ExceptionActionType::Continue)
    }

    pub fn rollback_retry() -> Self {
        Self::new(ExceptionActionType::RollbackRetry)
    }

    pub fn rollback_stop() -> Self {
        Self::new(ExceptionActionType::RollbackStop)
    }

    pub fn rollforward_stop() -> Self {
        Self::new(ExceptionActionType::RollforwardStop)
    }

    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn action_type(&self) -> ExceptionActionType {
        self.action_type
    }

    pub fn delay_ms(&self) -> Option<u64> {
        self.delay_ms
    }

    pub fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }

    /// A carried delay must be positive and at most [`MAX_RETRY_DELAY_MS`]
    pub fn validate(&self) -> ExceptionResult<()> {
        match self.delay_ms {
            Some(0) => Err(ExceptionError::InvalidAction(
                "retry delay must be positive".into(),
            )),
            Some(delay_ms) if delay_ms > MAX_RETRY_DELAY_MS => {
                Err(ExceptionError::InvalidAction(format!(
                    "retry delay {} ms exceeds {} ms",
                    delay_ms, MAX_RETRY_DELAY_MS
                )))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ExceptionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.action_type)
    }
}
