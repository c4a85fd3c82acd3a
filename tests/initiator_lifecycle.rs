//! Initiator Lifecycle Tests
//!
//! Start, stop, rejected invocations, plain batches and status reporting.
//! Every scheduler interaction is asserted through the recording binding.

mod common;

use std::io::Write;
use std::sync::Arc;

use common::*;
use initiator_runtime::event::SourceError;
use initiator_runtime::initiator::{
    Initiator, InitiatorConfig, InitiatorError, InitiatorState, InitiatorStatus, JOB_NAME,
    RETRY_TRIGGER_NAME,
};
use initiator_runtime::scheduler::{JobKey, SchedulerBinding, SchedulerError, TriggerKey};
use tempfile::NamedTempFile;

fn job() -> JobKey {
    JobKey::new(JOB_NAME, GROUP)
}

fn trigger(name: &str) -> TriggerKey {
    TriggerKey::new(name, GROUP)
}

// =============================================================================
// INVOKE WHILE NOT RUNNING
// =============================================================================

/// Test: A stopped initiator neither fetches events nor runs the flow.
#[test]
fn test_stopped_initiator_does_not_process() {
    let source = ScriptedSource::new().repeating(&["a"]);
    let mut h = Harness::new(source);

    let err = h.initiator.invoke().unwrap_err();

    assert!(matches!(err, InitiatorError::NotRunning(ref name) if name == INITIATOR));
    assert_eq!(h.source.calls(), 0);
    assert_eq!(h.flow.invocation_count(), 0);
    assert!(h.scheduler.calls().is_empty());
}

/// Test: An initiator in ERROR refuses invocations the same way.
#[test]
fn test_errored_initiator_does_not_process() {
    let source = ScriptedSource::new().with_batch(&["bad"]).repeating(&["a"]);
    let mut h = Harness::started(source);
    h.flow.fail_on("bad", FATAL);
    h.initiator.invoke().unwrap_err();
    assert!(h.initiator.is_error());

    let calls_before = h.source.calls();
    let err = h.initiator.invoke().unwrap_err();

    assert!(matches!(err, InitiatorError::NotRunning(_)));
    assert_eq!(h.source.calls(), calls_before);
    assert_eq!(h.flow.invoked(), vec!["bad".to_string()]);
}

// =============================================================================
// START
// =============================================================================

/// Test: With no triggers in the job group, start schedules every business
/// trigger (the first with the job definition) and resumes the group.
#[test]
fn test_start_registers_triggers() {
    let mut h = Harness::new(ScriptedSource::new());

    h.initiator.start().unwrap();

    assert_eq!(
        h.scheduler.calls(),
        vec![
            SchedulerCall::GetTriggersOfJob(job()),
            SchedulerCall::ScheduleJobWithDetail(job(), trigger("every-minute")),
            SchedulerCall::ScheduleJob(trigger("nightly")),
            SchedulerCall::ResumeJobGroup(GROUP.to_string()),
        ]
    );
    assert!(h.initiator.is_running());
    assert_eq!(h.scheduler.local().trigger_count().unwrap(), 2);
    assert_eq!(h.scheduler.local().job_count().unwrap(), 1);
}

/// Test: Existing triggers are reused; the group is still resumed.
#[test]
fn test_start_reuses_existing_triggers() {
    let mut h = Harness::new(ScriptedSource::new());
    h.initiator.start().unwrap();
    h.initiator.stop().unwrap();
    h.scheduler.clear();

    h.initiator.start().unwrap();

    assert_eq!(
        h.scheduler.calls(),
        vec![
            SchedulerCall::GetTriggersOfJob(job()),
            SchedulerCall::ResumeJobGroup(GROUP.to_string()),
        ]
    );
    assert_eq!(h.scheduler.local().trigger_count().unwrap(), 2);
}

/// Test: A second initiator on the same scheduler reuses the first one's triggers.
#[test]
fn test_start_reuses_triggers_across_instances() {
    let scheduler = Arc::new(RecordingScheduler::new());
    let mut first = Harness::with_scheduler(config(), ScriptedSource::new(), scheduler.clone());
    first.initiator.start().unwrap();
    scheduler.clear();

    let mut second = Harness::with_scheduler(config(), ScriptedSource::new(), scheduler.clone());
    second.initiator.start().unwrap();

    assert!(scheduler
        .mutations()
        .iter()
        .all(|call| matches!(call, SchedulerCall::ResumeJobGroup(_))));
}

/// Test: Starting a running initiator is a no-op.
#[test]
fn test_start_when_running_is_noop() {
    let mut h = Harness::started(ScriptedSource::new());

    h.initiator.start().unwrap();

    assert!(h.scheduler.calls().is_empty());
    assert!(h.initiator.is_running());
}

/// Test: Start from ERROR brings the initiator back.
#[test]
fn test_start_from_error() {
    let source = ScriptedSource::new().with_batch(&["bad"]);
    let mut h = Harness::started(source);
    h.flow.fail_on("bad", FATAL);
    h.initiator.invoke().unwrap_err();
    assert_eq!(h.initiator.state(), InitiatorState::Error);

    h.initiator.start().unwrap();

    assert!(h.initiator.is_running());
    assert_eq!(h.initiator.status().unwrap(), InitiatorStatus::Running);
}

/// Test: A scheduler failure during start propagates and leaves the initiator stopped.
#[test]
fn test_start_propagates_scheduler_error() {
    let mut h = Harness::new(ScriptedSource::new());
    h.scheduler
        .fail_next_mutation(SchedulerError::Unavailable("store offline".into()));

    let err = h.initiator.start().unwrap_err();

    assert!(matches!(
        err,
        InitiatorError::Scheduler(SchedulerError::Unavailable(_))
    ));
    assert!(h.initiator.is_stopped());
}

// =============================================================================
// STOP
// =============================================================================

/// Test: Stopping a running, non-recovering initiator pauses its group
/// and leaves the recovery trigger alone.
#[test]
fn test_stop_pauses_job_group() {
    let mut h = Harness::started(ScriptedSource::new());

    h.initiator.stop().unwrap();

    assert_eq!(
        h.scheduler.calls(),
        vec![
            SchedulerCall::GetTrigger(trigger(RETRY_TRIGGER_NAME)),
            SchedulerCall::PauseJobGroup(GROUP.to_string()),
        ]
    );
    assert!(h.initiator.is_stopped());
    assert_eq!(h.initiator.status().unwrap(), InitiatorStatus::Stopped);
}

/// Test: Stop does not notify listeners.
#[test]
fn test_start_and_stop_are_silent() {
    let mut h = Harness::new(ScriptedSource::new());
    h.initiator.start().unwrap();
    h.initiator.stop().unwrap();
    assert_eq!(h.listener.count(), 0);
}

// =============================================================================
// PLAIN INVOCATIONS
// =============================================================================

/// Test: Every event goes through the flow, in source order, and the batch is acknowledged.
#[test]
fn test_successful_batch() {
    let source = ScriptedSource::new().with_batch(&["a", "b", "c"]);
    let mut h = Harness::started(source);

    let outcome = h.initiator.invoke().unwrap();

    assert_eq!(outcome.events_received, 3);
    assert_eq!(outcome.events_processed, 3);
    assert!(!outcome.resumed);
    assert_eq!(h.flow.invoked(), vec!["a", "b", "c"]);
    assert_eq!(h.source.acknowledged(), vec![3]);
    assert!(h.scheduler.mutations().is_empty());
}

/// Test: An empty source ends the invocation normally with no scheduler mutation.
#[test]
fn test_empty_invocation() {
    let mut h = Harness::started(ScriptedSource::new());

    let outcome = h.initiator.invoke().unwrap();

    assert!(outcome.is_idle());
    assert_eq!(h.flow.invocation_count(), 0);
    assert!(h.source.acknowledged().is_empty());
    assert_eq!(
        h.scheduler.calls(),
        vec![SchedulerCall::GetTrigger(trigger(RETRY_TRIGGER_NAME))]
    );
}

/// Test: An empty batch counts as no events.
#[test]
fn test_empty_batch() {
    let mut h = Harness::started(ScriptedSource::new().with_batch(&[]));
    let outcome = h.initiator.invoke().unwrap();
    assert!(outcome.is_idle());
    assert!(h.scheduler.mutations().is_empty());
}

/// Test: Each event gets its own invocation context.
#[test]
fn test_fresh_context_per_event() {
    let mut h = Harness::started(ScriptedSource::new().with_batch(&["a", "b"]));
    h.initiator.invoke().unwrap();

    let ids = h.flow.context_ids();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
}

/// Test: Source errors propagate and nothing reaches the flow.
#[test]
fn test_source_error_propagates() {
    let mut h = Harness::started(ScriptedSource::new().repeating(&["a"]));
    h.source
        .fail_next(SourceError::Resource("queue unreachable".into()));

    let err = h.initiator.invoke().unwrap_err();

    assert!(matches!(err, InitiatorError::Source(SourceError::Resource(_))));
    assert!(!err.is_abort_transaction());
    assert_eq!(h.flow.invocation_count(), 0);
    assert!(h.initiator.is_running());
}

// =============================================================================
// STATUS
// =============================================================================

/// Test: Status follows the scheduler for a running initiator.
#[test]
fn test_status_follows_scheduler() {
    let mut h = Harness::started(ScriptedSource::new());
    assert_eq!(h.initiator.status().unwrap(), InitiatorStatus::Running);

    h.scheduler.local().pause_job_group(GROUP).unwrap();
    assert_eq!(h.initiator.status().unwrap(), InitiatorStatus::Stopped);

    h.scheduler.local().resume_job_group(GROUP).unwrap();
    assert_eq!(h.initiator.status().unwrap(), InitiatorStatus::Running);

    h.scheduler.local().standby().unwrap();
    assert_eq!(h.initiator.status().unwrap(), InitiatorStatus::Stopped);

    h.scheduler.local().start().unwrap();
    h.scheduler.local().shutdown().unwrap();
    assert_eq!(h.initiator.status().unwrap(), InitiatorStatus::Stopped);
    assert!(h.initiator.is_running());
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Test: An initiator can be built from a configuration file.
#[test]
fn test_build_from_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "module_name": "{}",
            "initiator_name": "{}",
            "triggers": [{{"name": "every-minute", "cron": "* * * * *"}}]
        }}"#,
        MODULE, INITIATOR
    )
    .unwrap();

    let config = InitiatorConfig::load(file.path()).unwrap();
    let mut h = Harness::with_config(config, ScriptedSource::new());
    h.initiator.start().unwrap();

    assert_eq!(h.initiator.job_group(), GROUP);
    assert_eq!(h.scheduler.local().trigger_count().unwrap(), 1);
}

/// Test: Missing collaborators fail at build time.
#[test]
fn test_missing_scheduler_is_configuration_error() {
    let err = Initiator::builder(config())
        .with_flow(ScriptedFlow::new())
        .with_source(ScriptedSource::new())
        .with_resolver(Arc::new(resolver()))
        .build()
        .unwrap_err();

    assert!(matches!(err, InitiatorError::Configuration(ref msg) if msg.contains("scheduler")));
}
