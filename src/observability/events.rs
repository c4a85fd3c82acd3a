//! Observable initiator events
//!
//! Events are explicit and typed. Each log record carries the event name
//! as its `event` field.

use std::fmt;

/// Observable events in the initiator runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Business triggers registered for a job group
    TriggersRegistered,
    /// Job group resumed, initiator running
    InitiatorStarted,
    /// Job group paused, initiator stopped
    InitiatorStopped,
    /// Initiator moved to ERROR
    InitiatorError,

    // Invocation
    /// Invocation refused because the initiator is not running
    InvocationRejected,
    /// Flow raised a fault
    FlowFault,
    /// Flow fault resolved as CONTINUE
    FaultContinued,

    // Recovery
    /// First rollback-retry: job group paused, retry trigger scheduled
    RetryCycleStarted,
    /// Rollback-retry while already recovering
    RetryAttemptFailed,
    /// Retry bound exceeded, escalating to stop
    RetryLimitExceeded,
    /// Retry trigger unscheduled
    RetryCycleCancelled,
    /// Successful invocation ended a recovery cycle
    RecoveryResumed,

    // Dispatch
    /// Scheduler trigger fired into an initiator
    TriggerFired,
    /// Dispatched invocation failed outside the rollback protocol
    DispatchFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::TriggersRegistered => "TRIGGERS_REGISTERED",
            Event::InitiatorStarted => "INITIATOR_STARTED",
            Event::InitiatorStopped => "INITIATOR_STOPPED",
            Event::InitiatorError => "INITIATOR_ERROR",

            Event::InvocationRejected => "INVOCATION_REJECTED",
            Event::FlowFault => "FLOW_FAULT",
            Event::FaultContinued => "FAULT_CONTINUED",

            Event::RetryCycleStarted => "RETRY_CYCLE_STARTED",
            Event::RetryAttemptFailed => "RETRY_ATTEMPT_FAILED",
            Event::RetryLimitExceeded => "RETRY_LIMIT_EXCEEDED",
            Event::RetryCycleCancelled => "RETRY_CYCLE_CANCELLED",
            Event::RecoveryResumed => "RECOVERY_RESUMED",

            Event::TriggerFired => "TRIGGER_FIRED",
            Event::DispatchFailed => "DISPATCH_FAILED",
        }
    }

    /// Returns true if this event reports a failure
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Event::InitiatorError
                | Event::InvocationRejected
                | Event::FlowFault
                | Event::RetryAttemptFailed
                | Event::RetryLimitExceeded
                | Event::DispatchFailed
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
