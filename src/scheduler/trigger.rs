//! # Triggers and Jobs
//!
//! A trigger is identified by `(group, name)` and fires the job it is
//! bound to. Business-as-usual triggers use cron schedules; the recovery
//! trigger uses a repeating simple schedule.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use croner::Cron;
use serde::{Deserialize, Serialize};

use super::errors::{SchedulerError, SchedulerResult};

/// Group used when a trigger or job has not been given one
pub const DEFAULT_GROUP: &str = "DEFAULT";

/// Identity of a trigger
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriggerKey {
    pub group: String,
    pub name: String,
}

impl TriggerKey {
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

/// Identity of a job
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobKey {
    pub group: String,
    pub name: String,
}

impl JobKey {
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

/// A job definition. Triggers bound to it fire it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetail {
    /// Job name
    pub name: String,

    /// Job group
    pub group: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,
}

impl JobDetail {
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn key(&self) -> JobKey {
        JobKey::new(&self.name, &self.group)
    }
}

/// When a trigger fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TriggerSchedule {
    /// Recurring calendar schedule
    Cron { expression: String },

    /// Fires exactly once
    Once { fire_at: DateTime<Utc> },

    /// Fires at `start_at`, then every `interval_ms` until unscheduled
    Repeating {
        start_at: DateTime<Utc>,
        interval_ms: u64,
    },
}

impl TriggerSchedule {
    /// Check the schedule can produce fire times
    pub fn validate(&self) -> SchedulerResult<()> {
        match self {
            TriggerSchedule::Cron { expression } => parse_cron(expression).map(|_| ()),
            TriggerSchedule::Once { .. } => Ok(()),
            TriggerSchedule::Repeating { interval_ms, .. } => {
                if *interval_ms == 0 {
                    return Err(SchedulerError::Internal(
                        "Repeating trigger interval must be positive".into(),
                    ));
                }
                if i64::try_from(*interval_ms).is_err() {
                    return Err(SchedulerError::Internal(
                        "Repeating trigger interval is out of range".into(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// First fire time for a trigger scheduled at `now`
    pub fn first_fire_time(&self, now: DateTime<Utc>) -> SchedulerResult<Option<DateTime<Utc>>> {
        match self {
            TriggerSchedule::Cron { expression } => next_cron_occurrence(expression, now, true),
            TriggerSchedule::Once { fire_at } => Ok(Some(*fire_at)),
            TriggerSchedule::Repeating { start_at, .. } => Ok(Some(*start_at)),
        }
    }

    /// Fire time following a fire at `fired_at`; `None` once exhausted
    pub fn next_fire_after(
        &self,
        fired_at: DateTime<Utc>,
    ) -> SchedulerResult<Option<DateTime<Utc>>> {
        match self {
            TriggerSchedule::Cron { expression } => {
                next_cron_occurrence(expression, fired_at, false)
            }
            TriggerSchedule::Once { .. } => Ok(None),
            TriggerSchedule::Repeating { interval_ms, .. } => {
                let next = i64::try_from(*interval_ms)
                    .ok()
                    .and_then(|ms| fired_at.checked_add_signed(Duration::milliseconds(ms)));
                match next {
                    Some(next) => Ok(Some(next)),
                    None => Err(SchedulerError::Internal(format!(
                        "Repeating interval of {} ms is out of range",
                        interval_ms
                    ))),
                }
            }
        }
    }
}

/// Parse a cron expression, mapping failures to `InvalidCron`
pub fn parse_cron(expression: &str) -> SchedulerResult<Cron> {
    Cron::new(expression)
        .parse()
        .map_err(|e| SchedulerError::InvalidCron {
            expression: expression.to_string(),
            reason: e.to_string(),
        })
}

fn next_cron_occurrence(
    expression: &str,
    from: DateTime<Utc>,
    inclusive: bool,
) -> SchedulerResult<Option<DateTime<Utc>>> {
    let cron = parse_cron(expression)?;
    match cron.find_next_occurrence(&from, inclusive) {
        Ok(next) => Ok(Some(next)),
        // A pattern with no future occurrence never fires again
        Err(_) => Ok(None),
    }
}

/// Trigger state as reported by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerState {
    /// Armed and will fire
    Normal,
    /// Will not fire until resumed
    Paused,
    /// Has no further fire times
    Complete,
    /// Failed to compute fire times
    Error,
    /// Its job is currently executing
    Blocked,
    /// No such trigger
    None,
}

impl TriggerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerState::Normal => "NORMAL",
            TriggerState::Paused => "PAUSED",
            TriggerState::Complete => "COMPLETE",
            TriggerState::Error => "ERROR",
            TriggerState::Blocked => "BLOCKED",
            TriggerState::None => "NONE",
        }
    }
}

impl fmt::Display for TriggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A trigger definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// Trigger name, unique within its group
    pub name: String,

    /// Trigger group
    pub group: String,

    /// Name of the job this trigger fires
    pub job_name: String,

    /// Group of the job this trigger fires
    pub job_group: String,

    /// Fire schedule
    pub schedule: TriggerSchedule,
}

impl Trigger {
    /// Create a trigger in the default group, not yet bound to a job
    pub fn new(name: impl Into<String>, schedule: TriggerSchedule) -> Self {
        Self {
            name: name.into(),
            group: DEFAULT_GROUP.to_string(),
            job_name: String::new(),
            job_group: DEFAULT_GROUP.to_string(),
            schedule,
        }
    }

    /// Create a cron trigger
    pub fn cron(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::new(
            name,
            TriggerSchedule::Cron {
                expression: expression.into(),
            },
        )
    }

    /// Create a trigger that fires once at `fire_at`
    pub fn once(name: impl Into<String>, fire_at: DateTime<Utc>) -> Self {
        Self::new(name, TriggerSchedule::Once { fire_at })
    }

    /// Create a trigger that fires at `start_at` and then every `interval`
    pub fn repeating(name: impl Into<String>, start_at: DateTime<Utc>, interval: Duration) -> Self {
        Self::new(
            name,
            TriggerSchedule::Repeating {
                start_at,
                interval_ms: interval.num_milliseconds().max(1) as u64,
            },
        )
    }

    /// Place the trigger in a group
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Bind the trigger to a job
    pub fn for_job(mut self, job_name: impl Into<String>, job_group: impl Into<String>) -> Self {
        self.job_name = job_name.into();
        self.job_group = job_group.into();
        self
    }

    pub fn key(&self) -> TriggerKey {
        TriggerKey::new(&self.name, &self.group)
    }

    pub fn job_key(&self) -> JobKey {
        JobKey::new(&self.job_name, &self.job_group)
    }
}
