//! # Scheduler Binding
//!
//! The narrow surface the initiator needs from a job scheduler. Every
//! call is synchronous; implementations serialize concurrent mutations
//! of a job group's trigger set themselves.

use super::errors::SchedulerResult;
use super::trigger::{JobDetail, Trigger, TriggerState};

/// Job scheduler operations used by initiators
pub trait SchedulerBinding: Send + Sync {
    /// Pause every trigger bound to jobs in `group`
    fn pause_job_group(&self, group: &str) -> SchedulerResult<()>;

    /// Resume every trigger bound to jobs in `group`
    fn resume_job_group(&self, group: &str) -> SchedulerResult<()>;

    /// Schedule a trigger against an already registered job
    fn schedule_job(&self, trigger: Trigger) -> SchedulerResult<()>;

    /// Register `job` and schedule `trigger` against it
    fn schedule_job_with_detail(&self, job: JobDetail, trigger: Trigger) -> SchedulerResult<()>;

    /// Remove a trigger. Returns whether it existed.
    fn unschedule_job(&self, trigger_name: &str, group: &str) -> SchedulerResult<bool>;

    /// Look up a trigger
    fn get_trigger(&self, name: &str, group: &str) -> SchedulerResult<Option<Trigger>>;

    /// All triggers bound to a job
    fn get_triggers_of_job(&self, job_name: &str, group: &str) -> SchedulerResult<Vec<Trigger>>;

    /// State of a trigger, `TriggerState::None` if absent
    fn get_trigger_state(&self, name: &str, group: &str) -> SchedulerResult<TriggerState>;

    /// Whether the scheduler is temporarily not firing triggers
    fn is_in_standby_mode(&self) -> SchedulerResult<bool>;

    /// Whether the scheduler has been shut down for good
    fn is_shutdown(&self) -> SchedulerResult<bool>;
}
