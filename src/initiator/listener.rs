//! Lifecycle listeners

use super::state::InitiatorStatus;

/// Observer of initiator lifecycle transitions.
///
/// Called synchronously, in registration order, when a recovery cycle
/// starts, when the initiator stops on error, and when a recovery cycle
/// ends in a resume. Not called for repeat failures within a cycle.
pub trait LifecycleListener: Send + Sync {
    fn notify(&self, initiator_name: &str, status: InitiatorStatus);
}

impl<F> LifecycleListener for F
where
    F: Fn(&str, InitiatorStatus) + Send + Sync,
{
    fn notify(&self, initiator_name: &str, status: InitiatorStatus) {
        self(initiator_name, status)
    }
}
