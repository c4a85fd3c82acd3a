//! Initiator Configuration
//!
//! Identity, business-as-usual triggers and retry defaults for one
//! initiator. Loaded from JSON, immutable after the initiator is built.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::ConfigError;
use super::{job_group_key, JOB_NAME, RETRY_TRIGGER_NAME};
use crate::exception::MAX_RETRY_DELAY_MS;
use crate::scheduler::trigger::parse_cron;
use crate::scheduler::Trigger;

/// Default delay before a recovery trigger fires
pub const DEFAULT_RETRY_DELAY_MS: u64 = 5_000;

/// One business-as-usual trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Trigger name, unique within the initiator
    pub name: String,

    /// Cron expression
    pub cron: String,
}

impl TriggerConfig {
    pub fn new(name: impl Into<String>, cron: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cron: cron.into(),
        }
    }
}

/// Retry defaults for ROLLBACK_RETRY actions that carry none
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Delay before each retry fire
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Failed retries tolerated before stopping; unbounded when unset
    #[serde(default)]
    pub max_retries: Option<u32>,
}

fn default_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_RETRY_DELAY_MS,
            max_retries: None,
        }
    }
}

/// Initiator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiatorConfig {
    /// Owning module
    pub module_name: String,

    /// Initiator name, unique within the module
    pub initiator_name: String,

    /// Business-as-usual triggers, scheduled on start
    #[serde(default)]
    pub triggers: Vec<TriggerConfig>,

    #[serde(default)]
    pub retry: RetryPolicy,
}

impl InitiatorConfig {
    /// Create a configuration with no triggers and default retry policy
    pub fn new(module_name: impl Into<String>, initiator_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            initiator_name: initiator_name.into(),
            triggers: Vec::new(),
            retry: RetryPolicy::default(),
        }
    }

    /// Add a cron trigger
    pub fn with_trigger(mut self, name: impl Into<String>, cron: impl Into<String>) -> Self {
        self.triggers.push(TriggerConfig::new(name, cron));
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Parse from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Scheduler job group for this initiator
    pub fn job_group(&self) -> String {
        job_group_key(&self.module_name, &self.initiator_name)
    }

    /// Validate the configuration.
    ///
    /// - Module and initiator names are non-empty
    /// - Trigger names are non-empty, unique and not reserved
    /// - Cron expressions parse
    /// - Retry delay is positive and at most [`MAX_RETRY_DELAY_MS`]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.module_name.trim().is_empty() {
            return Err(ConfigError::Invalid("module_name must not be empty".into()));
        }
        if self.initiator_name.trim().is_empty() {
            return Err(ConfigError::Invalid("initiator_name must not be empty".into()));
        }
        if self.retry.delay_ms == 0 {
            return Err(ConfigError::Invalid("retry.delay_ms must be positive".into()));
        }
        if self.retry.delay_ms > MAX_RETRY_DELAY_MS {
            return Err(ConfigError::Invalid(format!(
                "retry.delay_ms must not exceed {}",
                MAX_RETRY_DELAY_MS
            )));
        }

        let mut seen = HashSet::new();
        for trigger in &self.triggers {
            if trigger.name.trim().is_empty() {
                return Err(ConfigError::Invalid("trigger name must not be empty".into()));
            }
            if trigger.name == RETRY_TRIGGER_NAME {
                return Err(ConfigError::Invalid(format!(
                    "trigger name '{}' is reserved",
                    RETRY_TRIGGER_NAME
                )));
            }
            if !seen.insert(trigger.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate trigger name '{}'",
                    trigger.name
                )));
            }
            parse_cron(&trigger.cron).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }

        Ok(())
    }

    /// Business triggers, placed in the job group and bound to its job
    pub fn business_triggers(&self) -> Vec<Trigger> {
        let group = self.job_group();
        self.triggers
            .iter()
            .map(|t| {
                Trigger::cron(&t.name, &t.cron)
                    .with_group(&group)
                    .for_job(JOB_NAME, &group)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn valid() -> InitiatorConfig {
        InitiatorConfig::new("orders", "orders-poller")
            .with_trigger("every-minute", "* * * * *")
            .with_trigger("nightly", "0 2 * * *")
    }

    #[test]
    fn test_valid_config() {
        assert!(valid().validate().is_ok());
        assert_eq!(valid().job_group(), "orders-orders-poller");
    }

    #[test]
    fn test_empty_names_rejected() {
        assert!(InitiatorConfig::new("", "i").validate().is_err());
        assert!(InitiatorConfig::new("m", " ").validate().is_err());
    }

    #[test]
    fn test_duplicate_trigger_rejected() {
        let config = valid().with_trigger("nightly", "0 3 * * *");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_reserved_trigger_name_rejected() {
        let config = valid().with_trigger(RETRY_TRIGGER_NAME, "* * * * *");
        assert!(config.validate().unwrap_err().to_string().contains("reserved"));
    }

    #[test]
    fn test_bad_cron_rejected() {
        let config = InitiatorConfig::new("m", "i").with_trigger("t", "not a cron");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_delay_rejected() {
        let config = InitiatorConfig::new("m", "i").with_retry(RetryPolicy {
            delay_ms: 0,
            max_retries: None,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_delay_rejected() {
        let at_bound = InitiatorConfig::new("m", "i").with_retry(RetryPolicy {
            delay_ms: MAX_RETRY_DELAY_MS,
            max_retries: None,
        });
        assert!(at_bound.validate().is_ok());

        let config = InitiatorConfig::new("m", "i").with_retry(RetryPolicy {
            delay_ms: u64::MAX / 2,
            max_retries: None,
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must not exceed"));
    }

    #[test]
    fn test_business_triggers_bound_to_job_group() {
        let triggers = valid().business_triggers();
        assert_eq!(triggers.len(), 2);
        for trigger in &triggers {
            assert_eq!(trigger.group, "orders-orders-poller");
            assert_eq!(trigger.job_group, "orders-orders-poller");
            assert_eq!(trigger.job_name, JOB_NAME);
        }
        assert_eq!(triggers[0].name, "every-minute");
    }

    #[test]
    fn test_from_json_defaults() {
        let config = InitiatorConfig::from_json_str(
            r#"{"module_name": "orders", "initiator_name": "orders-in"}"#,
        )
        .unwrap();
        assert!(config.triggers.is_empty());
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "module_name": "orders",
                "initiator_name": "orders-poller",
                "triggers": [{{"name": "every-minute", "cron": "* * * * *"}}],
                "retry": {{"delay_ms": 250, "max_retries": 3}}
            }}"#
        )
        .unwrap();

        let config = InitiatorConfig::load(file.path()).unwrap();
        assert_eq!(config.triggers.len(), 1);
        assert_eq!(config.retry.delay_ms, 250);
        assert_eq!(config.retry.max_retries, Some(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let err = InitiatorConfig::load("/nonexistent/initiator.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
