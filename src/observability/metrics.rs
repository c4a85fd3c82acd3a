//! Initiator metrics
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for one initiator
///
/// # Thread Safety
///
/// All counters use atomic operations with Relaxed ordering.
#[derive(Debug, Default)]
pub struct InitiatorMetrics {
    /// Invocations that reached the event source
    invocations: AtomicU64,
    /// Events the flow completed without fault
    events_processed: AtomicU64,
    /// Faults raised by the flow
    flow_faults: AtomicU64,
    /// Recovery cycles started
    retry_cycles_started: AtomicU64,
    /// Rollback-retries while already recovering
    retry_attempts: AtomicU64,
    /// Recovery cycles ended by a successful invocation
    resumes: AtomicU64,
    /// Transitions to ERROR
    stops_on_error: AtomicU64,
    /// Abort-transaction signals raised
    aborted_transactions: AtomicU64,
    /// Invocations refused while not running
    rejected_invocations: AtomicU64,
}

impl InitiatorMetrics {
    /// Create a new registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_invocations(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_events_processed(&self) {
        self.events_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_flow_faults(&self) {
        self.flow_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_retry_cycles_started(&self) {
        self.retry_cycles_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_retry_attempts(&self) {
        self.retry_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_resumes(&self) {
        self.resumes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_stops_on_error(&self) {
        self.stops_on_error.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_aborted_transactions(&self) {
        self.aborted_transactions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rejected_invocations(&self) {
        self.rejected_invocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            invocations: self.invocations.load(Ordering::Relaxed),
            events_processed: self.events_processed.load(Ordering::Relaxed),
            flow_faults: self.flow_faults.load(Ordering::Relaxed),
            retry_cycles_started: self.retry_cycles_started.load(Ordering::Relaxed),
            retry_attempts: self.retry_attempts.load(Ordering::Relaxed),
            resumes: self.resumes.load(Ordering::Relaxed),
            stops_on_error: self.stops_on_error.load(Ordering::Relaxed),
            aborted_transactions: self.aborted_transactions.load(Ordering::Relaxed),
            rejected_invocations: self.rejected_invocations.load(Ordering::Relaxed),
        }
    }

    /// Current values as a JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub invocations: u64,
    pub events_processed: u64,
    pub flow_faults: u64,
    pub retry_cycles_started: u64,
    pub retry_attempts: u64,
    pub resumes: u64,
    pub stops_on_error: u64,
    pub aborted_transactions: u64,
    pub rejected_invocations: u64,
}
