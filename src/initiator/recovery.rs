//! Recovery and retry protocol
//!
//! Entered only from a flow fault inside `invoke`. Whether a cycle is
//! active is always read from the scheduler; the retry counter is the
//! only local recovery state and is cleared whenever the retry trigger
//! is unscheduled.
//!
//! Ordering: the job group is paused before the retry trigger is
//! scheduled, and the retry trigger is unscheduled before the job group
//! is paused or resumed.

use chrono::{Duration, Utc};

use super::errors::{InitiatorError, InitiatorResult};
use super::machine::Initiator;
use super::state::{InitiatorState, InitiatorStatus};
use super::{JOB_NAME, RETRY_TRIGGER_NAME};
use crate::exception::{ExceptionAction, ExceptionActionType, MAX_RETRY_DELAY_MS};
use crate::observability::{log_event, log_event_with_detail, Event};
use crate::scheduler::{SchedulerError, Trigger};

impl Initiator {
    /// ROLLBACK_RETRY. Starts a cycle, or counts another failure in the
    /// active one; escalates to the stop path once the retry bound is
    /// reached. Returns the abort signal when the protocol completes.
    pub(super) fn rollback_retry(&mut self, action: &ExceptionAction) -> InitiatorResult<InitiatorError> {
        let max_retries = action.max_retries().or(self.config.retry.max_retries);

        if self.is_recovering()? {
            // Counter is lost across restarts while the trigger survives
            let attempt = self.retry_count.unwrap_or(0) + 1;
            if max_retries.is_some_and(|max| attempt >= max) {
                return self.escalate(attempt);
            }

            self.retry_count = Some(attempt);
            self.metrics.increment_retry_attempts();
            log_event_with_detail(Event::RetryAttemptFailed, &self.job_group, &attempt.to_string());
        } else {
            if max_retries == Some(0) {
                return self.escalate(0);
            }

            let delay_ms = action.delay_ms().unwrap_or(self.config.retry.delay_ms);
            let trigger = self.retry_trigger(delay_ms)?;
            self.start_retry_cycle(trigger, delay_ms)?;
        }

        Ok(self.abort(ExceptionActionType::RollbackRetry))
    }

    /// ROLLBACK_STOP and ROLLFORWARD_STOP
    pub(super) fn stop_on_error(&mut self, action_type: ExceptionActionType) -> InitiatorResult<InitiatorError> {
        if self.is_recovering()? {
            self.cancel_recovery()?;
        }

        self.scheduler.pause_job_group(&self.job_group)?;
        self.state = InitiatorState::Error;
        self.metrics.increment_stops_on_error();
        log_event_with_detail(Event::InitiatorError, &self.job_group, action_type.as_str());
        self.notify(InitiatorStatus::Error);

        Ok(self.abort(action_type))
    }

    /// Successful invocation while recovering
    pub(super) fn resume(&mut self) -> InitiatorResult<()> {
        self.cancel_recovery()?;
        self.scheduler.resume_job_group(&self.job_group)?;
        self.metrics.increment_resumes();
        log_event(Event::RecoveryResumed, &self.job_group);
        self.notify(InitiatorStatus::Running);
        Ok(())
    }

    /// Unschedule the retry trigger and forget the counter
    pub(super) fn cancel_recovery(&mut self) -> InitiatorResult<()> {
        self.scheduler
            .unschedule_job(RETRY_TRIGGER_NAME, &self.job_group)?;
        self.retry_count = None;
        log_event(Event::RetryCycleCancelled, &self.job_group);
        Ok(())
    }

    fn start_retry_cycle(&mut self, trigger: Trigger, delay_ms: u64) -> InitiatorResult<()> {
        self.scheduler.pause_job_group(&self.job_group)?;

        match self.scheduler.schedule_job(trigger.clone()) {
            // Message-driven initiators have no business trigger to create the job
            Err(SchedulerError::JobNotFound { .. }) => self
                .scheduler
                .schedule_job_with_detail(self.job_detail(), trigger)?,
            other => other?,
        }

        self.retry_count = Some(0);
        self.metrics.increment_retry_cycles_started();
        log_event_with_detail(Event::RetryCycleStarted, &self.job_group, &delay_ms.to_string());
        self.notify(InitiatorStatus::Recovering);
        Ok(())
    }

    fn escalate(&mut self, attempt: u32) -> InitiatorResult<InitiatorError> {
        log_event_with_detail(Event::RetryLimitExceeded, &self.job_group, &attempt.to_string());
        self.stop_on_error(ExceptionActionType::RollbackStop)
    }

    /// Fires after `delay_ms`, then every `delay_ms` until unscheduled.
    /// Built before anything is paused so a bad delay changes nothing.
    fn retry_trigger(&self, delay_ms: u64) -> InitiatorResult<Trigger> {
        let invalid = || {
            InitiatorError::Configuration(format!(
                "retry delay {} ms must be between 1 and {} ms",
                delay_ms, MAX_RETRY_DELAY_MS
            ))
        };
        if delay_ms == 0 || delay_ms > MAX_RETRY_DELAY_MS {
            return Err(invalid());
        }

        let delay = Duration::milliseconds(i64::try_from(delay_ms).map_err(|_| invalid())?);
        let start_at = Utc::now().checked_add_signed(delay).ok_or_else(invalid)?;

        Ok(Trigger::repeating(RETRY_TRIGGER_NAME, start_at, delay)
            .with_group(&self.job_group)
            .for_job(JOB_NAME, &self.job_group))
    }

    fn abort(&self, action: ExceptionActionType) -> InitiatorError {
        self.metrics.increment_aborted_transactions();
        InitiatorError::AbortTransaction {
            initiator: self.config.initiator_name.clone(),
            action,
            retry_count: self.retry_count,
        }
    }
}
