//! # Events
//!
//! Units of work handed to a flow by an initiator. The payload is opaque
//! bytes; only the destination identity and transport priority are read.

pub mod message;
pub mod source;

pub use message::{MessageDrivenSource, MessageSender, RawMessage, RawMessageConverter};
pub use source::{EventSource, SourceError, SourceResult};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An inbound event destined for a flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event ID
    pub id: Uuid,

    /// Owning module
    pub module_name: String,

    /// Destination flow
    pub flow_name: String,

    /// Transport priority, when the transport supplied one
    #[serde(default)]
    pub priority: Option<u8>,

    /// Opaque payload
    pub payload: Vec<u8>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Create a new event
    pub fn new(
        module_name: impl Into<String>,
        flow_name: impl Into<String>,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            module_name: module_name.into(),
            flow_name: flow_name.into(),
            priority: None,
            payload: payload.into(),
            created_at: Utc::now(),
        }
    }

    /// Carry a transport priority
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Payload as UTF-8, if it is
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}
