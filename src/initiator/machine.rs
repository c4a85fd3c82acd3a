//! Initiator state machine
//!
//! Transitions:
//! - STOPPED/ERROR --start--> RUNNING
//! - any --stop--> STOPPED
//! - RUNNING --invoke, stop action--> ERROR
//!
//! At most one `invoke` runs per initiator at a time. `&mut self`
//! enforces that within a process; across fires it is the scheduler's
//! non-concurrent job setting.

use std::fmt;
use std::sync::Arc;

use super::config::InitiatorConfig;
use super::errors::{InitiatorError, InitiatorResult};
use super::listener::LifecycleListener;
use super::state::{InitiatorState, InitiatorStatus};
use super::{JOB_NAME, RETRY_TRIGGER_NAME};
use crate::event::EventSource;
use crate::exception::{ExceptionActionType, ExceptionResolver};
use crate::flow::{Flow, FlowInvocationContext};
use crate::observability::{log_event, log_event_with_detail, Event, InitiatorMetrics};
use crate::scheduler::{JobDetail, SchedulerBinding, SchedulerError, TriggerState};

/// Result of an invocation that did not abort
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationOutcome {
    /// Events handed over by the source
    pub events_received: usize,

    /// Events the flow completed
    pub events_processed: usize,

    /// Fault resolved as CONTINUE, which ended the batch
    pub continued_fault: Option<String>,

    /// A recovery cycle ended with this invocation
    pub resumed: bool,
}

impl InvocationOutcome {
    /// True if the source had nothing to process
    pub fn is_idle(&self) -> bool {
        self.events_received == 0
    }
}

/// Triggers flow processing and manages recovery for one event source
pub struct Initiator {
    pub(super) config: InitiatorConfig,
    pub(super) job_group: String,
    pub(super) state: InitiatorState,
    pub(super) retry_count: Option<u32>,
    pub(super) flow: Arc<dyn Flow>,
    pub(super) source: Box<dyn EventSource>,
    pub(super) resolver: Arc<dyn ExceptionResolver>,
    pub(super) scheduler: Arc<dyn SchedulerBinding>,
    pub(super) listeners: Vec<Arc<dyn LifecycleListener>>,
    pub(super) metrics: Arc<InitiatorMetrics>,
}

impl fmt::Debug for Initiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Initiator")
            .field("job_group", &self.job_group)
            .field("flow", &self.flow.name())
            .field("state", &self.state)
            .field("retry_count", &self.retry_count)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Initiator {
    /// Start building an initiator from its configuration
    pub fn builder(config: InitiatorConfig) -> InitiatorBuilder {
        InitiatorBuilder::new(config)
    }

    pub fn name(&self) -> &str {
        &self.config.initiator_name
    }

    pub fn module_name(&self) -> &str {
        &self.config.module_name
    }

    pub fn flow_name(&self) -> &str {
        self.flow.name()
    }

    /// Scheduler job group, `module-initiator`
    pub fn job_group(&self) -> &str {
        &self.job_group
    }

    pub fn config(&self) -> &InitiatorConfig {
        &self.config
    }

    pub fn state(&self) -> InitiatorState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == InitiatorState::Running
    }

    pub fn is_stopped(&self) -> bool {
        self.state == InitiatorState::Stopped
    }

    pub fn is_error(&self) -> bool {
        self.state == InitiatorState::Error
    }

    /// Retry counter of the active recovery cycle
    pub fn retry_count(&self) -> Option<u32> {
        self.retry_count
    }

    pub fn metrics(&self) -> &InitiatorMetrics {
        &self.metrics
    }

    /// Shared handle on the metrics registry
    pub fn metrics_handle(&self) -> Arc<InitiatorMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Register a lifecycle listener
    pub fn add_listener(&mut self, listener: Arc<dyn LifecycleListener>) {
        self.listeners.push(listener);
    }

    /// True while the scheduler holds this job group's retry trigger
    pub fn is_recovering(&self) -> InitiatorResult<bool> {
        Ok(self
            .scheduler
            .get_trigger(RETRY_TRIGGER_NAME, &self.job_group)?
            .is_some())
    }

    /// Status as reported to operators.
    ///
    /// ERROR and STOPPED come from the stored state. A running initiator
    /// reports STOPPED when the scheduler is shut down or in standby, or
    /// when every business trigger of its job is paused; RECOVERING while
    /// the retry trigger exists.
    pub fn status(&self) -> InitiatorResult<InitiatorStatus> {
        match self.state {
            InitiatorState::Error => return Ok(InitiatorStatus::Error),
            InitiatorState::Stopped => return Ok(InitiatorStatus::Stopped),
            InitiatorState::Running => {}
        }

        if self.scheduler.is_shutdown()? || self.scheduler.is_in_standby_mode()? {
            return Ok(InitiatorStatus::Stopped);
        }
        if self.is_recovering()? {
            return Ok(InitiatorStatus::Recovering);
        }

        let business: Vec<_> = self
            .scheduler
            .get_triggers_of_job(JOB_NAME, &self.job_group)?
            .into_iter()
            .filter(|t| t.name != RETRY_TRIGGER_NAME)
            .collect();

        let mut all_paused = !business.is_empty();
        for trigger in &business {
            if self.scheduler.get_trigger_state(&trigger.name, &trigger.group)? != TriggerState::Paused {
                all_paused = false;
                break;
            }
        }

        if all_paused {
            Ok(InitiatorStatus::Stopped)
        } else {
            Ok(InitiatorStatus::Running)
        }
    }

    /// Register business triggers if the job has none, then resume the
    /// job group. Returns immediately if already running.
    pub fn start(&mut self) -> InitiatorResult<()> {
        if self.is_running() {
            return Ok(());
        }

        let existing = self
            .scheduler
            .get_triggers_of_job(JOB_NAME, &self.job_group)?;
        if existing.is_empty() {
            self.register_triggers()?;
        }

        self.scheduler.resume_job_group(&self.job_group)?;
        self.state = InitiatorState::Running;
        log_event(Event::InitiatorStarted, &self.job_group);
        Ok(())
    }

    /// Cancel any recovery cycle, pause the job group and stop
    pub fn stop(&mut self) -> InitiatorResult<()> {
        if self.is_recovering()? {
            self.cancel_recovery()?;
        }

        self.scheduler.pause_job_group(&self.job_group)?;
        self.state = InitiatorState::Stopped;
        log_event(Event::InitiatorStopped, &self.job_group);
        Ok(())
    }

    /// Process the next batch from the event source.
    ///
    /// The first flow fault ends the batch. Its resolved action decides
    /// the rest: CONTINUE settles the batch up to the faulted event,
    /// ROLLBACK_RETRY and the stop actions return
    /// [`InitiatorError::AbortTransaction`] and settle nothing.
    pub fn invoke(&mut self) -> InitiatorResult<InvocationOutcome> {
        if !self.is_running() {
            self.metrics.increment_rejected_invocations();
            log_event_with_detail(Event::InvocationRejected, &self.job_group, self.state.as_str());
            return Err(InitiatorError::NotRunning(self.config.initiator_name.clone()));
        }
        self.metrics.increment_invocations();

        let events = self.source.get_events()?.unwrap_or_default();
        let mut outcome = InvocationOutcome {
            events_received: events.len(),
            ..Default::default()
        };

        for event in &events {
            let mut context = FlowInvocationContext::new(&self.config.initiator_name, event);
            let fault = match self.flow.invoke(&mut context, event) {
                Ok(()) => {
                    outcome.events_processed += 1;
                    self.metrics.increment_events_processed();
                    continue;
                }
                Err(fault) => fault,
            };

            self.metrics.increment_flow_faults();
            log_event_with_detail(Event::FlowFault, &self.job_group, &fault.to_string());

            let action = self
                .resolver
                .resolve(&self.config.initiator_name, event, &fault);

            match action.action_type() {
                ExceptionActionType::Continue => {
                    log_event_with_detail(Event::FaultContinued, &self.job_group, fault.kind());
                    outcome.continued_fault = Some(fault.to_string());
                    break;
                }
                ExceptionActionType::RollbackRetry => {
                    return Err(self.rollback_retry(&action)?);
                }
                stop => {
                    return Err(self.stop_on_error(stop)?);
                }
            }
        }

        let settled = outcome.events_processed + usize::from(outcome.continued_fault.is_some());
        if settled > 0 {
            self.source.acknowledge(settled);
        }

        if self.is_recovering()? {
            self.resume()?;
            outcome.resumed = true;
        }

        Ok(outcome)
    }

    pub(super) fn job_detail(&self) -> JobDetail {
        JobDetail::new(JOB_NAME, &self.job_group)
            .with_description(format!("Initiator {}", self.config.initiator_name))
    }

    /// First trigger goes in with the job; the rest are bound to it
    fn register_triggers(&self) -> InitiatorResult<()> {
        let triggers = self.config.business_triggers();
        let count = triggers.len();
        let mut triggers = triggers.into_iter();

        if let Some(first) = triggers.next() {
            match self
                .scheduler
                .schedule_job_with_detail(self.job_detail(), first.clone())
            {
                Err(SchedulerError::JobExists { .. }) => self.scheduler.schedule_job(first)?,
                other => other?,
            }
        }
        for trigger in triggers {
            self.scheduler.schedule_job(trigger)?;
        }

        log_event_with_detail(Event::TriggersRegistered, &self.job_group, &count.to_string());
        Ok(())
    }

    pub(super) fn notify(&self, status: InitiatorStatus) {
        for listener in &self.listeners {
            listener.notify(&self.config.initiator_name, status);
        }
    }
}

/// Assembles an [`Initiator`] from its collaborators
pub struct InitiatorBuilder {
    config: InitiatorConfig,
    flow: Option<Arc<dyn Flow>>,
    source: Option<Box<dyn EventSource>>,
    resolver: Option<Arc<dyn ExceptionResolver>>,
    scheduler: Option<Arc<dyn SchedulerBinding>>,
    listeners: Vec<Arc<dyn LifecycleListener>>,
}

impl InitiatorBuilder {
    pub fn new(config: InitiatorConfig) -> Self {
        Self {
            config,
            flow: None,
            source: None,
            resolver: None,
            scheduler: None,
            listeners: Vec::new(),
        }
    }

    pub fn with_flow(mut self, flow: Arc<dyn Flow>) -> Self {
        self.flow = Some(flow);
        self
    }

    pub fn with_source(mut self, source: impl EventSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ExceptionResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn SchedulerBinding>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn LifecycleListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Validate the configuration and check every collaborator is set.
    /// The initiator starts STOPPED.
    pub fn build(self) -> InitiatorResult<Initiator> {
        self.config.validate()?;

        let flow = self.flow.ok_or_else(|| missing("flow"))?;
        let source = self.source.ok_or_else(|| missing("event source"))?;
        let resolver = self.resolver.ok_or_else(|| missing("exception resolver"))?;
        let scheduler = self.scheduler.ok_or_else(|| missing("scheduler binding"))?;

        Ok(Initiator {
            job_group: self.config.job_group(),
            config: self.config,
            state: InitiatorState::Stopped,
            retry_count: None,
            flow,
            source,
            resolver,
            scheduler,
            listeners: self.listeners,
            metrics: Arc::new(InitiatorMetrics::new()),
        })
    }
}

fn missing(collaborator: &str) -> InitiatorError {
    InitiatorError::Configuration(format!("{} is not set", collaborator))
}
