//! # Flow
//!
//! The processing pipeline an initiator drives. A flow is invoked once
//! per event and either returns or raises a [`FlowFault`]; what happens
//! inside it is its own business.

use std::error::Error as StdError;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::event::Event;

/// Context created fresh for every flow invocation
#[derive(Debug, Clone, Serialize)]
pub struct FlowInvocationContext {
    /// Invocation ID
    pub id: Uuid,

    /// Initiator that started the invocation
    pub initiator_name: String,

    /// Flow the event is destined for
    pub flow_name: String,

    /// Event being processed
    pub event_id: Uuid,

    /// Invocation timestamp
    pub started_at: DateTime<Utc>,

    /// Components visited so far, in order
    invoked_components: Vec<String>,
}

impl FlowInvocationContext {
    /// Create a new invocation context
    pub fn new(initiator_name: impl Into<String>, event: &Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            initiator_name: initiator_name.into(),
            flow_name: event.flow_name.clone(),
            event_id: event.id,
            started_at: Utc::now(),
            invoked_components: Vec::new(),
        }
    }

    /// Note that a component has been invoked
    pub fn record_component(&mut self, component_name: impl Into<String>) {
        self.invoked_components.push(component_name.into());
    }

    pub fn invoked_components(&self) -> &[String] {
        &self.invoked_components
    }

    /// The most recently invoked component
    pub fn last_component(&self) -> Option<&str> {
        self.invoked_components.last().map(String::as_str)
    }
}

/// A processing fault raised by a flow
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct FlowFault {
    kind: String,
    message: String,
    component: Option<String>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl FlowFault {
    /// Create a fault of the given kind
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            component: None,
            source: None,
        }
    }

    /// Name the component that raised the fault
    pub fn in_component(mut self, component_name: impl Into<String>) -> Self {
        self.component = Some(component_name.into());
        self
    }

    /// Attach the underlying error
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Fault classification used by exception resolvers
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }
}

/// A flow that processes events
pub trait Flow: Send + Sync {
    /// Flow name
    fn name(&self) -> &str;

    /// Process one event
    fn invoke(&self, context: &mut FlowInvocationContext, event: &Event) -> Result<(), FlowFault>;
}
