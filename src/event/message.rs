//! # Message-Driven Source
//!
//! Push-model counterpart of a polling [`EventSource`]. A transport
//! pushes messages through a [`MessageSender`]; the initiator sees the
//! head message as a single-event batch, and the message only leaves the
//! queue once the invocation acknowledges it. A rolled-back delivery is
//! therefore redelivered on the next invocation.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::source::{EventSource, SourceError, SourceResult};
use super::Event;

type SharedQueue = Arc<Mutex<VecDeque<Event>>>;

/// Transport-side handle for pushing events
#[derive(Debug, Clone)]
pub struct MessageSender {
    queue: SharedQueue,
}

impl MessageSender {
    /// Enqueue an event for delivery
    pub fn send(&self, event: Event) -> SourceResult<()> {
        let mut queue = self
            .queue
            .lock()
            .map_err(|_| SourceError::Internal("Lock poisoned".into()))?;
        queue.push_back(event);
        Ok(())
    }

    /// Events not yet acknowledged
    pub fn pending(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }
}

/// Initiator-side view of pushed messages
#[derive(Debug, Default)]
pub struct MessageDrivenSource {
    queue: SharedQueue,
}

impl MessageDrivenSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle the transport uses to push events
    pub fn sender(&self) -> MessageSender {
        MessageSender {
            queue: Arc::clone(&self.queue),
        }
    }
}

impl EventSource for MessageDrivenSource {
    fn get_events(&mut self) -> SourceResult<Option<Vec<Event>>> {
        let queue = self
            .queue
            .lock()
            .map_err(|_| SourceError::Internal("Lock poisoned".into()))?;
        Ok(queue.front().cloned().map(|event| vec![event]))
    }

    fn acknowledge(&mut self, consumed: usize) {
        if let Ok(mut queue) = self.queue.lock() {
            for _ in 0..consumed {
                if queue.pop_front().is_none() {
                    break;
                }
            }
        }
    }
}

/// A message as received from a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Message body
    pub body: Vec<u8>,

    /// Transport priority
    pub priority: u8,
}

impl RawMessage {
    pub fn new(body: impl Into<Vec<u8>>, priority: u8) -> Self {
        Self {
            body: body.into(),
            priority,
        }
    }

    /// A text message; the body is stored as UTF-8
    pub fn text(text: &str, priority: u8) -> Self {
        Self::new(text.as_bytes().to_vec(), priority)
    }
}

/// Builds events from raw transport messages
#[derive(Debug, Clone)]
pub struct RawMessageConverter {
    module_name: String,
    flow_name: String,
    respect_priority: bool,
}

impl RawMessageConverter {
    pub fn new(module_name: impl Into<String>, flow_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            flow_name: flow_name.into(),
            respect_priority: false,
        }
    }

    /// Copy the transport priority onto converted events
    pub fn with_respect_priority(mut self, respect_priority: bool) -> Self {
        self.respect_priority = respect_priority;
        self
    }

    pub fn respects_priority(&self) -> bool {
        self.respect_priority
    }

    pub fn convert(&self, message: RawMessage) -> Event {
        let event = Event::new(&self.module_name, &self.flow_name, message.body);
        if self.respect_priority {
            event.with_priority(message.priority)
        } else {
            event
        }
    }
}
