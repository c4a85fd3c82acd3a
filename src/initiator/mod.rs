//! # Initiator
//!
//! Drives a flow from an event source and owns recovery.
//!
//! - State is RUNNING, STOPPED or ERROR
//! - RECOVERING is never stored: it holds exactly while the scheduler
//!   has a `retry_trigger` in the initiator's job group
//! - Flow faults are resolved to an action; retry and stop outcomes
//!   always end in an abort-transaction error
//! - Scheduler and event source errors propagate untouched

pub mod config;
pub mod errors;
pub mod listener;
mod machine;
mod recovery;
pub mod state;

pub use config::{InitiatorConfig, RetryPolicy, TriggerConfig, DEFAULT_RETRY_DELAY_MS};
pub use errors::{ConfigError, InitiatorError, InitiatorResult};
pub use listener::LifecycleListener;
pub use machine::{Initiator, InitiatorBuilder, InvocationOutcome};
pub use state::{InitiatorState, InitiatorStatus};

/// Name of the job all of an initiator's triggers fire
pub const JOB_NAME: &str = "initiatorJob";

/// Name of the recovery trigger within a job group
pub const RETRY_TRIGGER_NAME: &str = "retry_trigger";

/// Scheduler job group for an initiator
pub fn job_group_key(module_name: &str, initiator_name: &str) -> String {
    format!("{}-{}", module_name, initiator_name)
}
