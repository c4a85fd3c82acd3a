//! Initiator states
//!
//! `InitiatorState` is what the initiator stores. `InitiatorStatus` is
//! what it reports, and adds RECOVERING, which is never stored but read
//! back from the scheduler.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stored lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InitiatorState {
    Running,
    Stopped,
    Error,
}

impl InitiatorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InitiatorState::Running => "RUNNING",
            InitiatorState::Stopped => "STOPPED",
            InitiatorState::Error => "ERROR",
        }
    }
}

impl fmt::Display for InitiatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reported status, including the derived RECOVERING
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InitiatorStatus {
    Running,
    Recovering,
    Stopped,
    Error,
}

impl InitiatorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InitiatorStatus::Running => "RUNNING",
            InitiatorStatus::Recovering => "RECOVERING",
            InitiatorStatus::Stopped => "STOPPED",
            InitiatorStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for InitiatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
