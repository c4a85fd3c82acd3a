//! Observability for the initiator runtime
//!
//! - Typed lifecycle events, logged through `tracing`
//! - Per-initiator counters
//!
//! Observability is read-only: nothing here changes execution. The
//! library never installs a subscriber; the host process does.
//!
//! # Usage
//!
//! ```ignore
//! use initiator_runtime::observability::{log_event, Event, InitiatorMetrics};
//!
//! log_event(Event::InitiatorStarted, "orders-orders-poller");
//!
//! let metrics = InitiatorMetrics::new();
//! metrics.increment_invocations();
//! ```

mod events;
mod metrics;

pub use events::Event;
pub use metrics::{InitiatorMetrics, MetricsSnapshot};

use tracing::{info, warn};

/// Log a lifecycle event for a job group
pub fn log_event(event: Event, job_group: &str) {
    if event.is_error() {
        warn!(event = event.as_str(), job_group, "initiator event");
    } else {
        info!(event = event.as_str(), job_group, "initiator event");
    }
}

/// Log a lifecycle event with a free-form detail
pub fn log_event_with_detail(event: Event, job_group: &str, detail: &str) {
    if event.is_error() {
        warn!(event = event.as_str(), job_group, detail, "initiator event");
    } else {
        info!(event = event.as_str(), job_group, detail, "initiator event");
    }
}
