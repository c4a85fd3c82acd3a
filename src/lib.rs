//! initiator-runtime - Initiators for an enterprise integration runtime
//!
//! An initiator pulls or receives events, drives them through a flow,
//! and recovers from flow faults through its scheduler job group.

pub mod dispatch;
pub mod event;
pub mod exception;
pub mod flow;
pub mod initiator;
pub mod observability;
pub mod scheduler;
pub mod wiretap;

pub use dispatch::{DispatchOutcome, TriggerDispatcher};
pub use initiator::{Initiator, InitiatorConfig, InitiatorError, InitiatorResult, InitiatorStatus};
