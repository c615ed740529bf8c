//! Gate observability counters
//!
//! Counters live inside the gate's lock so they always agree with the queue
//! state they describe. Each update also emits to the `metrics` facade so a
//! host process can wire up whatever exporter it likes.

use std::time::Duration;

/// Point-in-time copy of the gate's counters.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Requests accepted into the waiting queue since start (or last reset).
    pub total_requests: u64,
    /// Renewal cycles that produced a credential.
    pub successful_refreshes: u64,
    /// Renewal cycles that failed, including ceiling short-circuits.
    pub failed_refreshes: u64,
    /// Queued requests rejected by the timeout sweep.
    pub timeouts: u64,
    /// High-water mark of queue depth.
    pub max_queue_size: usize,
    /// Mean time a settled request spent queued, in milliseconds.
    pub average_queue_time_ms: f64,
}

/// Mutable counter state, guarded by the gate lock.
#[derive(Debug, Default)]
pub(crate) struct MetricsState {
    total_requests: u64,
    successful_refreshes: u64,
    failed_refreshes: u64,
    timeouts: u64,
    max_queue_size: usize,
    queue_wait_count: u64,
    average_queue_time_ms: f64,
}

impl MetricsState {
    /// Record a request accepted into the queue. `depth` is the queue length
    /// after the insert.
    pub(crate) fn record_enqueue(&mut self, depth: usize) {
        self.total_requests += 1;
        if depth > self.max_queue_size {
            self.max_queue_size = depth;
        }
        metrics::counter!("refresh_gate_requests_total").increment(1);
        metrics::gauge!("refresh_gate_queue_depth").set(depth as f64);
    }

    /// Record how long a settled request spent in the queue.
    pub(crate) fn record_queue_wait(&mut self, wait: Duration) {
        let sample = wait.as_secs_f64() * 1000.0;
        self.queue_wait_count += 1;
        // cumulative moving average, no per-sample history kept
        self.average_queue_time_ms +=
            (sample - self.average_queue_time_ms) / self.queue_wait_count as f64;
        metrics::histogram!("refresh_gate_queue_wait_seconds").record(wait.as_secs_f64());
    }

    pub(crate) fn record_refresh_success(&mut self) {
        self.successful_refreshes += 1;
        metrics::counter!("refresh_gate_refresh_total", "outcome" => "success").increment(1);
    }

    pub(crate) fn record_refresh_failure(&mut self) {
        self.failed_refreshes += 1;
        metrics::counter!("refresh_gate_refresh_total", "outcome" => "failure").increment(1);
    }

    pub(crate) fn record_timeout(&mut self) {
        self.timeouts += 1;
        metrics::counter!("refresh_gate_timeouts_total").increment(1);
    }

    /// Publish the current queue depth after a drain or sweep. Facade-only;
    /// no internal counter changes.
    pub(crate) fn record_queue_depth(&self, depth: usize) {
        metrics::gauge!("refresh_gate_queue_depth").set(depth as f64);
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests,
            successful_refreshes: self.successful_refreshes,
            failed_refreshes: self.failed_refreshes,
            timeouts: self.timeouts,
            max_queue_size: self.max_queue_size,
            average_queue_time_ms: self.average_queue_time_ms,
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
        metrics::gauge!("refresh_gate_queue_depth").set(0.0);
    }
}
