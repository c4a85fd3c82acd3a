//! # Trigger Dispatch
//!
//! Trigger source for scheduled initiators: takes due triggers from a
//! [`LocalScheduler`] and invokes the initiator that owns each job group.
//!
//! Jobs are non-concurrent. Each initiator sits behind its own mutex and
//! is invoked at most once per tick, however many of its triggers are
//! due.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::exception::ExceptionActionType;
use crate::initiator::{Initiator, InitiatorError, InvocationOutcome};
use crate::observability::{log_event_with_detail, Event};
use crate::scheduler::{LocalScheduler, SchedulerError};

/// Result type for dispatch operations
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Dispatch errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Job group already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// How one fired invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Invocation returned normally
    Completed(InvocationOutcome),

    /// Invocation raised the abort-transaction signal
    RolledBack(ExceptionActionType),

    /// Invocation failed outside the rollback protocol
    Failed(String),
}

/// One trigger fire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRecord {
    pub job_group: String,
    pub trigger_name: String,
    pub outcome: DispatchOutcome,
}

/// Shared handle on a registered initiator
pub type InitiatorHandle = Arc<Mutex<Initiator>>;

/// Fires due scheduler triggers into registered initiators
#[derive(Debug)]
pub struct TriggerDispatcher {
    scheduler: Arc<LocalScheduler>,
    initiators: RwLock<BTreeMap<String, InitiatorHandle>>,
}

impl TriggerDispatcher {
    pub fn new(scheduler: Arc<LocalScheduler>) -> Self {
        Self {
            scheduler,
            initiators: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn scheduler(&self) -> &Arc<LocalScheduler> {
        &self.scheduler
    }

    /// Register an initiator under its job group
    pub fn register(&self, initiator: Initiator) -> DispatchResult<InitiatorHandle> {
        let job_group = initiator.job_group().to_string();
        let mut initiators = self
            .initiators
            .write()
            .map_err(|_| DispatchError::Internal("Lock poisoned".into()))?;

        if initiators.contains_key(&job_group) {
            return Err(DispatchError::AlreadyRegistered(job_group));
        }

        let handle = Arc::new(Mutex::new(initiator));
        initiators.insert(job_group, Arc::clone(&handle));
        Ok(handle)
    }

    /// Remove an initiator; its triggers stay in the scheduler
    pub fn unregister(&self, job_group: &str) -> Option<InitiatorHandle> {
        self.initiators
            .write()
            .ok()
            .and_then(|mut initiators| initiators.remove(job_group))
    }

    pub fn get(&self, job_group: &str) -> Option<InitiatorHandle> {
        self.initiators
            .read()
            .ok()
            .and_then(|initiators| initiators.get(job_group).cloned())
    }

    /// Registered job groups, sorted
    pub fn job_groups(&self) -> Vec<String> {
        self.initiators
            .read()
            .map(|initiators| initiators.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Fire every trigger due at `now`.
    ///
    /// Triggers of unregistered job groups are consumed without effect.
    /// Every fired group gets a record, failed ones included.
    pub fn tick(&self, now: DateTime<Utc>) -> DispatchResult<Vec<DispatchRecord>> {
        let due = self.scheduler.acquire_due(now)?;
        let mut fired = BTreeSet::new();
        let mut records = Vec::new();

        for trigger in due {
            let job_group = trigger.job_group;
            if fired.contains(&job_group) {
                continue;
            }
            let Some(handle) = self.get(&job_group) else {
                continue;
            };
            fired.insert(job_group.clone());

            log_event_with_detail(Event::TriggerFired, &job_group, &trigger.name);

            // A poisoned initiator is reported; the rest of the tick still fires
            let outcome = match handle.lock() {
                Ok(mut initiator) => Self::fire(&mut initiator),
                Err(_) => DispatchOutcome::Failed("Initiator lock poisoned".into()),
            };

            if let DispatchOutcome::Failed(reason) = &outcome {
                log_event_with_detail(Event::DispatchFailed, &job_group, reason);
            }

            records.push(DispatchRecord {
                job_group,
                trigger_name: trigger.name,
                outcome,
            });
        }

        Ok(records)
    }

    fn fire(initiator: &mut Initiator) -> DispatchOutcome {
        match initiator.invoke() {
            Ok(outcome) => DispatchOutcome::Completed(outcome),
            Err(InitiatorError::AbortTransaction { action, .. }) => DispatchOutcome::RolledBack(action),
            Err(err) => DispatchOutcome::Failed(err.to_string()),
        }
    }
}
