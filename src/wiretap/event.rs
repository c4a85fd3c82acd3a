//! Wiretap records

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable audit snapshot of an event passing a flow component.
///
/// Times are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WiretapEvent {
    identifier: Uuid,
    timestamp: i64,
    module_name: String,
    flow_name: String,
    component_name: String,
    event: Vec<u8>,
    expiry: i64,
}

impl WiretapEvent {
    pub(super) fn new(
        module_name: &str,
        flow_name: &str,
        component_name: &str,
        event: Vec<u8>,
        timestamp: i64,
        expiry: i64,
    ) -> Self {
        Self {
            identifier: Uuid::new_v4(),
            timestamp,
            module_name: module_name.to_string(),
            flow_name: flow_name.to_string(),
            component_name: component_name.to_string(),
            event,
            expiry,
        }
    }

    pub fn identifier(&self) -> Uuid {
        self.identifier
    }

    /// Creation time
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn flow_name(&self) -> &str {
        &self.flow_name
    }

    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    /// Serialised payload
    pub fn event(&self) -> &[u8] {
        &self.event
    }

    /// Time after which the record may be purged
    pub fn expiry(&self) -> i64 {
        self.expiry
    }

    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        now_millis > self.expiry
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
