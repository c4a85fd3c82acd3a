//! Shared fixtures for the integration suites
//!
//! - `RecordingScheduler`: a `LocalScheduler` that logs every binding call
//! - `ScriptedFlow`: faults on chosen payloads with a chosen kind
//! - `ScriptedSource`: hands out queued or repeating batches
//! - `RecordingListener`: collects lifecycle notifications

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use initiator_runtime::event::{Event, EventSource, SourceError, SourceResult};
use initiator_runtime::exception::{ExceptionAction, MatchingExceptionResolver};
use initiator_runtime::flow::{Flow, FlowFault, FlowInvocationContext};
use initiator_runtime::initiator::{
    Initiator, InitiatorConfig, InitiatorStatus, LifecycleListener, RetryPolicy,
};
use initiator_runtime::scheduler::{
    JobDetail, JobKey, LocalScheduler, SchedulerBinding, SchedulerError, SchedulerResult, Trigger,
    TriggerKey, TriggerState,
};
use uuid::Uuid;

pub const MODULE: &str = "orders";
pub const INITIATOR: &str = "orders-poller";
pub const GROUP: &str = "orders-orders-poller";
pub const FLOW: &str = "orders-to-ledger";

/// Fault kinds understood by [`resolver`]
pub const RETRYABLE: &str = "Retryable";
pub const FATAL: &str = "Fatal";
pub const IGNORABLE: &str = "Ignorable";
pub const FORWARD: &str = "Forward";

// =============================================================================
// SCHEDULER
// =============================================================================

/// One call made through the binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerCall {
    PauseJobGroup(String),
    ResumeJobGroup(String),
    ScheduleJob(TriggerKey),
    ScheduleJobWithDetail(JobKey, TriggerKey),
    UnscheduleJob(TriggerKey),
    GetTrigger(TriggerKey),
    GetTriggersOfJob(JobKey),
    GetTriggerState(TriggerKey),
    IsInStandbyMode,
    IsShutdown,
}

impl SchedulerCall {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            SchedulerCall::PauseJobGroup(_)
                | SchedulerCall::ResumeJobGroup(_)
                | SchedulerCall::ScheduleJob(_)
                | SchedulerCall::ScheduleJobWithDetail(..)
                | SchedulerCall::UnscheduleJob(_)
        )
    }
}

/// `LocalScheduler` wrapper recording calls, with one-shot failure injection
#[derive(Debug)]
pub struct RecordingScheduler {
    inner: Arc<LocalScheduler>,
    calls: Mutex<Vec<SchedulerCall>>,
    fail_next_mutation: Mutex<Option<SchedulerError>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::wrapping(Arc::new(LocalScheduler::new()))
    }

    pub fn wrapping(inner: Arc<LocalScheduler>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            fail_next_mutation: Mutex::new(None),
        }
    }

    pub fn local(&self) -> &Arc<LocalScheduler> {
        &self.inner
    }

    pub fn calls(&self) -> Vec<SchedulerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<SchedulerCall> {
        self.calls().into_iter().filter(SchedulerCall::is_mutation).collect()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// The next mutating call fails with `err` without reaching the scheduler
    pub fn fail_next_mutation(&self, err: SchedulerError) {
        *self.fail_next_mutation.lock().unwrap() = Some(err);
    }

    fn record(&self, call: SchedulerCall) -> SchedulerResult<()> {
        let mutation = call.is_mutation();
        self.calls.lock().unwrap().push(call);
        if mutation {
            if let Some(err) = self.fail_next_mutation.lock().unwrap().take() {
                return Err(err);
            }
        }
        Ok(())
    }
}

impl SchedulerBinding for RecordingScheduler {
    fn pause_job_group(&self, group: &str) -> SchedulerResult<()> {
        self.record(SchedulerCall::PauseJobGroup(group.to_string()))?;
        self.inner.pause_job_group(group)
    }

    fn resume_job_group(&self, group: &str) -> SchedulerResult<()> {
        self.record(SchedulerCall::ResumeJobGroup(group.to_string()))?;
        self.inner.resume_job_group(group)
    }

    fn schedule_job(&self, trigger: Trigger) -> SchedulerResult<()> {
        self.record(SchedulerCall::ScheduleJob(trigger.key()))?;
        self.inner.schedule_job(trigger)
    }

    fn schedule_job_with_detail(&self, job: JobDetail, trigger: Trigger) -> SchedulerResult<()> {
        self.record(SchedulerCall::ScheduleJobWithDetail(job.key(), trigger.key()))?;
        self.inner.schedule_job_with_detail(job, trigger)
    }

    fn unschedule_job(&self, trigger_name: &str, group: &str) -> SchedulerResult<bool> {
        self.record(SchedulerCall::UnscheduleJob(TriggerKey::new(trigger_name, group)))?;
        self.inner.unschedule_job(trigger_name, group)
    }

    fn get_trigger(&self, name: &str, group: &str) -> SchedulerResult<Option<Trigger>> {
        self.record(SchedulerCall::GetTrigger(TriggerKey::new(name, group)))?;
        self.inner.get_trigger(name, group)
    }

    fn get_triggers_of_job(&self, job_name: &str, group: &str) -> SchedulerResult<Vec<Trigger>> {
        self.record(SchedulerCall::GetTriggersOfJob(JobKey::new(job_name, group)))?;
        self.inner.get_triggers_of_job(job_name, group)
    }

    fn get_trigger_state(&self, name: &str, group: &str) -> SchedulerResult<TriggerState> {
        self.record(SchedulerCall::GetTriggerState(TriggerKey::new(name, group)))?;
        self.inner.get_trigger_state(name, group)
    }

    fn is_in_standby_mode(&self) -> SchedulerResult<bool> {
        self.record(SchedulerCall::IsInStandbyMode)?;
        self.inner.is_in_standby_mode()
    }

    fn is_shutdown(&self) -> SchedulerResult<bool> {
        self.record(SchedulerCall::IsShutdown)?;
        self.inner.is_shutdown()
    }
}

// =============================================================================
// FLOW
// =============================================================================

/// Flow that faults on configured payloads
#[derive(Debug, Default)]
pub struct ScriptedFlow {
    faults: Mutex<HashMap<String, String>>,
    invoked: Mutex<Vec<String>>,
    contexts: Mutex<Vec<Uuid>>,
}

impl ScriptedFlow {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fault with `kind` whenever `payload` is processed
    pub fn fail_on(&self, payload: &str, kind: &str) {
        self.faults
            .lock()
            .unwrap()
            .insert(payload.to_string(), kind.to_string());
    }

    pub fn heal(&self, payload: &str) {
        self.faults.lock().unwrap().remove(payload);
    }

    /// Payloads seen, in order, faulted ones included
    pub fn invoked(&self) -> Vec<String> {
        self.invoked.lock().unwrap().clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.invoked.lock().unwrap().len()
    }

    pub fn context_ids(&self) -> Vec<Uuid> {
        self.contexts.lock().unwrap().clone()
    }
}

impl Flow for ScriptedFlow {
    fn name(&self) -> &str {
        FLOW
    }

    fn invoke(&self, context: &mut FlowInvocationContext, event: &Event) -> Result<(), FlowFault> {
        let payload = event.payload_str().unwrap_or_default().to_string();
        self.contexts.lock().unwrap().push(context.id);
        self.invoked.lock().unwrap().push(payload.clone());
        context.record_component("writer");

        match self.faults.lock().unwrap().get(&payload) {
            Some(kind) => Err(FlowFault::new(kind.clone(), format!("cannot process {}", payload))
                .in_component("writer")),
            None => Ok(()),
        }
    }
}

// =============================================================================
// EVENT SOURCE
// =============================================================================

#[derive(Debug, Default)]
struct SourceState {
    batches: VecDeque<Vec<Event>>,
    repeating: Option<Vec<Event>>,
    calls: usize,
    acknowledged: Vec<usize>,
    fail_next: Option<SourceError>,
}

/// Pull source handing out queued batches, then a repeating one if set.
/// Clones share state, so a test can keep one to inspect.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    state: Arc<Mutex<SourceState>>,
}

pub fn events(payloads: &[&str]) -> Vec<Event> {
    payloads.iter().map(|p| Event::new(MODULE, FLOW, *p)).collect()
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch(self, payloads: &[&str]) -> Self {
        self.state.lock().unwrap().batches.push_back(events(payloads));
        self
    }

    /// Batch returned on every call once the queue is drained
    pub fn repeating(self, payloads: &[&str]) -> Self {
        self.state.lock().unwrap().repeating = Some(events(payloads));
        self
    }

    pub fn fail_next(&self, err: SourceError) {
        self.state.lock().unwrap().fail_next = Some(err);
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub fn acknowledged(&self) -> Vec<usize> {
        self.state.lock().unwrap().acknowledged.clone()
    }
}

impl EventSource for ScriptedSource {
    fn get_events(&mut self) -> SourceResult<Option<Vec<Event>>> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if let Some(err) = state.fail_next.take() {
            return Err(err);
        }
        if let Some(batch) = state.batches.pop_front() {
            return Ok(Some(batch));
        }
        Ok(state.repeating.clone())
    }

    fn acknowledge(&mut self, consumed: usize) {
        self.state.lock().unwrap().acknowledged.push(consumed);
    }
}

// =============================================================================
// LISTENER
// =============================================================================

#[derive(Debug, Default)]
pub struct RecordingListener {
    notifications: Mutex<Vec<(String, InitiatorStatus)>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notifications(&self) -> Vec<(String, InitiatorStatus)> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<InitiatorStatus> {
        self.notifications().into_iter().map(|(_, s)| s).collect()
    }

    pub fn count(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }
}

impl LifecycleListener for RecordingListener {
    fn notify(&self, initiator_name: &str, status: InitiatorStatus) {
        self.notifications
            .lock()
            .unwrap()
            .push((initiator_name.to_string(), status));
    }
}

// =============================================================================
// ASSEMBLY
// =============================================================================

/// Resolver keyed on the fault kinds above; anything else stops
pub fn resolver() -> MatchingExceptionResolver {
    MatchingExceptionResolver::new()
        .on_kind(RETRYABLE, ExceptionAction::rollback_retry())
        .on_kind(FATAL, ExceptionAction::rollback_stop())
        .on_kind(FORWARD, ExceptionAction::rollforward_stop())
        .on_kind(IGNORABLE, ExceptionAction::continue_processing())
}

pub fn config() -> InitiatorConfig {
    InitiatorConfig::new(MODULE, INITIATOR)
        .with_trigger("every-minute", "* * * * *")
        .with_trigger("nightly", "0 2 * * *")
        .with_retry(RetryPolicy {
            delay_ms: 1_000,
            max_retries: None,
        })
}

/// Everything a test needs to drive and observe one initiator
pub struct Harness {
    pub initiator: Initiator,
    pub scheduler: Arc<RecordingScheduler>,
    pub flow: Arc<ScriptedFlow>,
    pub source: ScriptedSource,
    pub listener: Arc<RecordingListener>,
}

impl Harness {
    pub fn new(source: ScriptedSource) -> Self {
        Self::with_config(config(), source)
    }

    pub fn with_config(config: InitiatorConfig, source: ScriptedSource) -> Self {
        Self::with_scheduler(config, source, Arc::new(RecordingScheduler::new()))
    }

    pub fn with_scheduler(
        config: InitiatorConfig,
        source: ScriptedSource,
        scheduler: Arc<RecordingScheduler>,
    ) -> Self {
        let flow = ScriptedFlow::new();
        let listener = RecordingListener::new();
        let initiator = Initiator::builder(config)
            .with_flow(flow.clone())
            .with_source(source.clone())
            .with_resolver(Arc::new(resolver()))
            .with_scheduler(scheduler.clone())
            .with_listener(listener.clone())
            .build()
            .unwrap();

        Self {
            initiator,
            scheduler,
            flow,
            source,
            listener,
        }
    }

    /// Started, with the start-up calls cleared from the log
    pub fn started(source: ScriptedSource) -> Self {
        let mut harness = Self::new(source);
        harness.initiator.start().unwrap();
        harness.scheduler.clear();
        harness
    }
}
