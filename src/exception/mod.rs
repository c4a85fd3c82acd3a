//! # Exception Resolution
//!
//! Policy applied to flow faults: continue, roll back and retry, or roll
//! back and stop.

pub mod action;
pub mod errors;
pub mod resolver;

pub use action::{ExceptionAction, ExceptionActionType, MAX_RETRY_DELAY_MS};
pub use errors::{ExceptionError, ExceptionResult};
pub use resolver::{ExceptionResolver, ExceptionRule, MatchingExceptionResolver};
