//! # Trigger Store
//!
//! Durable storage for the scheduler's jobs and triggers. The recovery
//! trigger lives here too, which is what lets an initiator rediscover an
//! in-progress retry cycle after a restart.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{SchedulerError, SchedulerResult};
use super::trigger::{JobDetail, Trigger, TriggerState};

/// A trigger together with its runtime state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTrigger {
    pub trigger: Trigger,
    pub state: TriggerState,
    pub next_fire: Option<DateTime<Utc>>,
}

/// Everything the scheduler persists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSchedule {
    #[serde(default)]
    pub jobs: Vec<JobDetail>,

    #[serde(default)]
    pub triggers: Vec<StoredTrigger>,
}

/// Trait for durable trigger storage
pub trait TriggerStore: Send + Sync + std::fmt::Debug {
    /// Load the persisted schedule; empty if nothing was saved yet
    fn load(&self) -> SchedulerResult<StoredSchedule>;

    /// Replace the persisted schedule
    fn save(&self, schedule: &StoredSchedule) -> SchedulerResult<()>;
}

/// JSON file-based trigger store
#[derive(Debug)]
pub struct FileTriggerStore {
    path: PathBuf,
}

impl FileTriggerStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }
}

impl TriggerStore for FileTriggerStore {
    fn load(&self) -> SchedulerResult<StoredSchedule> {
        if !self.path.exists() {
            return Ok(StoredSchedule::default());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| SchedulerError::Store(format!("Failed to read trigger store: {}", e)))?;

        if content.trim().is_empty() {
            return Ok(StoredSchedule::default());
        }

        serde_json::from_str(&content)
            .map_err(|e| SchedulerError::Store(format!("Failed to parse trigger store: {}", e)))
    }

    fn save(&self, schedule: &StoredSchedule) -> SchedulerResult<()> {
        let content = serde_json::to_string_pretty(schedule)
            .map_err(|e| SchedulerError::Store(format!("Failed to serialize triggers: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SchedulerError::Store(format!("Failed to create trigger store directory: {}", e))
            })?;
        }

        // Write-then-rename so a crash never leaves a torn store behind
        let temp_path = self.temp_path();
        let mut file = File::create(&temp_path)
            .map_err(|e| SchedulerError::Store(format!("Failed to create temp store: {}", e)))?;
        file.write_all(content.as_bytes())
            .map_err(|e| SchedulerError::Store(format!("Failed to write temp store: {}", e)))?;
        file.sync_all()
            .map_err(|e| SchedulerError::Store(format!("Failed to sync temp store: {}", e)))?;

        fs::rename(&temp_path, &self.path)
            .map_err(|e| SchedulerError::Store(format!("Failed to replace trigger store: {}", e)))
    }
}

/// In-memory trigger store for testing
#[derive(Debug, Default)]
pub struct MemTriggerStore {
    schedule: RwLock<StoredSchedule>,
}

impl MemTriggerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TriggerStore for MemTriggerStore {
    fn load(&self) -> SchedulerResult<StoredSchedule> {
        self.schedule
            .read()
            .map(|s| s.clone())
            .map_err(|_| SchedulerError::poisoned())
    }

    fn save(&self, schedule: &StoredSchedule) -> SchedulerResult<()> {
        let mut stored = self
            .schedule
            .write()
            .map_err(|_| SchedulerError::poisoned())?;
        *stored = schedule.clone();
        Ok(())
    }
}
