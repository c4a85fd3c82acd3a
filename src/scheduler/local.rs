//! # Local Scheduler
//!
//! In-process implementation of [`SchedulerBinding`].
//!
//! Semantics:
//! - Jobs and triggers are keyed by `(group, name)`
//! - Pausing a job group pauses the triggers currently bound to it;
//!   triggers scheduled afterwards start `NORMAL`
//! - Standby and shutdown stop all firing
//! - Every mutation is written through to the optional [`TriggerStore`];
//!   a mutation the store rejects is not applied in memory either

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use super::binding::SchedulerBinding;
use super::errors::{SchedulerError, SchedulerResult};
use super::store::{StoredSchedule, StoredTrigger, TriggerStore};
use super::trigger::{JobDetail, JobKey, Trigger, TriggerKey, TriggerSchedule, TriggerState};

#[derive(Debug, Clone, PartialEq, Eq)]
struct TriggerEntry {
    trigger: Trigger,
    state: TriggerState,
    next_fire: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SchedulerInner {
    jobs: BTreeMap<JobKey, JobDetail>,
    triggers: BTreeMap<TriggerKey, TriggerEntry>,
    standby: bool,
    shutdown: bool,
}

impl SchedulerInner {
    fn from_stored(stored: StoredSchedule) -> Self {
        let jobs = stored
            .jobs
            .into_iter()
            .map(|job| (job.key(), job))
            .collect();

        let triggers = stored
            .triggers
            .into_iter()
            .map(|t| {
                (
                    t.trigger.key(),
                    TriggerEntry {
                        trigger: t.trigger,
                        state: t.state,
                        next_fire: t.next_fire,
                    },
                )
            })
            .collect();

        Self {
            jobs,
            triggers,
            standby: false,
            shutdown: false,
        }
    }

    fn to_stored(&self) -> StoredSchedule {
        StoredSchedule {
            jobs: self.jobs.values().cloned().collect(),
            triggers: self
                .triggers
                .values()
                .map(|e| StoredTrigger {
                    trigger: e.trigger.clone(),
                    state: e.state,
                    next_fire: e.next_fire,
                })
                .collect(),
        }
    }

    fn ensure_running(&self) -> SchedulerResult<()> {
        if self.shutdown {
            return Err(SchedulerError::Shutdown);
        }
        Ok(())
    }

    fn insert_trigger(&mut self, trigger: Trigger, now: DateTime<Utc>) -> SchedulerResult<()> {
        let key = trigger.key();
        if self.triggers.contains_key(&key) {
            return Err(SchedulerError::TriggerExists {
                name: key.name,
                group: key.group,
            });
        }

        let next_fire = trigger.schedule.first_fire_time(now)?;
        let state = if next_fire.is_some() {
            TriggerState::Normal
        } else {
            TriggerState::Complete
        };

        self.triggers.insert(
            key,
            TriggerEntry {
                trigger,
                state,
                next_fire,
            },
        );
        Ok(())
    }
}

/// In-process job scheduler
#[derive(Debug, Default)]
pub struct LocalScheduler {
    inner: RwLock<SchedulerInner>,
    store: Option<Arc<dyn TriggerStore>>,
}

impl LocalScheduler {
    /// Create a scheduler with no persistence
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scheduler backed by `store`, restoring whatever it holds
    pub fn with_store(store: Arc<dyn TriggerStore>) -> SchedulerResult<Self> {
        let stored = store.load()?;
        Ok(Self {
            inner: RwLock::new(SchedulerInner::from_stored(stored)),
            store: Some(store),
        })
    }

    fn read(&self) -> SchedulerResult<RwLockReadGuard<'_, SchedulerInner>> {
        self.inner.read().map_err(|_| SchedulerError::poisoned())
    }

    fn write(&self) -> SchedulerResult<RwLockWriteGuard<'_, SchedulerInner>> {
        self.inner.write().map_err(|_| SchedulerError::poisoned())
    }

    /// Apply `change` to a copy of the state and commit the copy only
    /// once the store has accepted it.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut SchedulerInner) -> SchedulerResult<T>,
    ) -> SchedulerResult<T> {
        let mut inner = self.write()?;
        let mut staged = inner.clone();
        let result = change(&mut staged)?;

        if staged != *inner {
            if let Some(store) = &self.store {
                store.save(&staged.to_stored())?;
            }
            *inner = staged;
        }
        Ok(result)
    }

    /// Stop firing triggers until [`LocalScheduler::start`] is called
    pub fn standby(&self) -> SchedulerResult<()> {
        let mut inner = self.write()?;
        inner.ensure_running()?;
        inner.standby = true;
        Ok(())
    }

    /// Leave standby mode
    pub fn start(&self) -> SchedulerResult<()> {
        let mut inner = self.write()?;
        inner.ensure_running()?;
        inner.standby = false;
        Ok(())
    }

    /// Shut down for good. Further mutations fail.
    pub fn shutdown(&self) -> SchedulerResult<()> {
        let mut inner = self.write()?;
        inner.shutdown = true;
        Ok(())
    }

    /// Collect the triggers due at `now` and advance their schedules.
    ///
    /// Triggers with no further fire time are removed.
    pub fn acquire_due(&self, now: DateTime<Utc>) -> SchedulerResult<Vec<Trigger>> {
        self.mutate(|inner| {
            if inner.standby || inner.shutdown {
                return Ok(Vec::new());
            }

            let mut due = Vec::new();
            let mut exhausted = Vec::new();

            for (key, entry) in inner.triggers.iter_mut() {
                if entry.state != TriggerState::Normal {
                    continue;
                }
                match entry.next_fire {
                    Some(at) if at <= now => {}
                    _ => continue,
                }

                due.push(entry.trigger.clone());

                match entry.trigger.schedule.next_fire_after(now) {
                    Ok(Some(next)) => entry.next_fire = Some(next),
                    Ok(None) => exhausted.push(key.clone()),
                    Err(_) => {
                        entry.state = TriggerState::Error;
                        entry.next_fire = None;
                    }
                }
            }

            for key in exhausted {
                inner.triggers.remove(&key);
            }

            Ok(due)
        })
    }

    /// Next fire time of a trigger, if it exists and has one
    pub fn next_fire_time(&self, name: &str, group: &str) -> SchedulerResult<Option<DateTime<Utc>>> {
        let inner = self.read()?;
        Ok(inner
            .triggers
            .get(&TriggerKey::new(name, group))
            .and_then(|e| e.next_fire))
    }

    /// Registered job count
    pub fn job_count(&self) -> SchedulerResult<usize> {
        Ok(self.read()?.jobs.len())
    }

    /// Registered trigger count
    pub fn trigger_count(&self) -> SchedulerResult<usize> {
        Ok(self.read()?.triggers.len())
    }
}

impl SchedulerBinding for LocalScheduler {
    fn pause_job_group(&self, group: &str) -> SchedulerResult<()> {
        self.mutate(|inner| {
            inner.ensure_running()?;

            for entry in inner.triggers.values_mut() {
                if entry.trigger.job_group == group
                    && matches!(entry.state, TriggerState::Normal | TriggerState::Blocked)
                {
                    entry.state = TriggerState::Paused;
                }
            }
            Ok(())
        })
    }

    fn resume_job_group(&self, group: &str) -> SchedulerResult<()> {
        self.mutate(|inner| {
            inner.ensure_running()?;
            let now = Utc::now();

            for entry in inner.triggers.values_mut() {
                if entry.trigger.job_group != group || entry.state != TriggerState::Paused {
                    continue;
                }
                entry.state = TriggerState::Normal;

                // Calendar fires missed while paused are skipped
                let is_cron = matches!(entry.trigger.schedule, TriggerSchedule::Cron { .. });
                if is_cron && matches!(entry.next_fire, Some(at) if at < now) {
                    entry.next_fire = entry.trigger.schedule.first_fire_time(now).unwrap_or(None);
                }
            }
            Ok(())
        })
    }

    fn schedule_job(&self, trigger: Trigger) -> SchedulerResult<()> {
        trigger.schedule.validate()?;

        self.mutate(|inner| {
            inner.ensure_running()?;

            let job_key = trigger.job_key();
            if !inner.jobs.contains_key(&job_key) {
                return Err(SchedulerError::JobNotFound {
                    name: job_key.name,
                    group: job_key.group,
                });
            }

            inner.insert_trigger(trigger, Utc::now())
        })
    }

    fn schedule_job_with_detail(&self, job: JobDetail, trigger: Trigger) -> SchedulerResult<()> {
        trigger.schedule.validate()?;

        self.mutate(|inner| {
            inner.ensure_running()?;

            let job_key = job.key();
            if inner.jobs.contains_key(&job_key) {
                return Err(SchedulerError::JobExists {
                    name: job_key.name,
                    group: job_key.group,
                });
            }

            let trigger = trigger.for_job(&job.name, &job.group);
            inner.insert_trigger(trigger, Utc::now())?;
            inner.jobs.insert(job_key, job);
            Ok(())
        })
    }

    fn unschedule_job(&self, trigger_name: &str, group: &str) -> SchedulerResult<bool> {
        self.mutate(|inner| {
            inner.ensure_running()?;
            Ok(inner
                .triggers
                .remove(&TriggerKey::new(trigger_name, group))
                .is_some())
        })
    }

    fn get_trigger(&self, name: &str, group: &str) -> SchedulerResult<Option<Trigger>> {
        let inner = self.read()?;
        Ok(inner
            .triggers
            .get(&TriggerKey::new(name, group))
            .map(|e| e.trigger.clone()))
    }

    fn get_triggers_of_job(&self, job_name: &str, group: &str) -> SchedulerResult<Vec<Trigger>> {
        let inner = self.read()?;
        Ok(inner
            .triggers
            .values()
            .filter(|e| e.trigger.job_name == job_name && e.trigger.job_group == group)
            .map(|e| e.trigger.clone())
            .collect())
    }

    fn get_trigger_state(&self, name: &str, group: &str) -> SchedulerResult<TriggerState> {
        let inner = self.read()?;
        Ok(inner
            .triggers
            .get(&TriggerKey::new(name, group))
            .map(|e| e.state)
            .unwrap_or(TriggerState::None))
    }

    fn is_in_standby_mode(&self) -> SchedulerResult<bool> {
        Ok(self.read()?.standby)
    }

    fn is_shutdown(&self) -> SchedulerResult<bool> {
        Ok(self.read()?.shutdown)
    }
}
