//! Bounded FIFO queue of callers parked behind an in-flight renewal
//!
//! Each entry owns a oneshot sender, so a queued caller is settled at most
//! once no matter which path (drain, sweep, reset, shutdown) reaches it
//! first. The queue itself is plain data; the gate's lock provides all
//! synchronization.

use std::collections::VecDeque;
use std::mem;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use session::Credential;

/// Outcome delivered to a parked caller.
pub type SettleResult = Result<Credential, ApiError>;

/// One caller waiting for the in-flight renewal to settle.
#[derive(Debug)]
pub struct QueuedRequest {
    pub id: Uuid,
    pub enqueued_at: Instant,
    pub request: transport::RequestDescriptor,
    settle: oneshot::Sender<SettleResult>,
}

impl QueuedRequest {
    /// Deliver the outcome. Consumes the entry, so settling twice is
    /// unrepresentable. A caller that already gave up (dropped its receiver)
    /// is silently skipped.
    pub fn settle(self, outcome: SettleResult) {
        let _ = self.settle.send(outcome);
    }

    /// Time this entry has spent in the queue.
    pub fn wait_time(&self, now: Instant) -> Duration {
        now.duration_since(self.enqueued_at)
    }
}

/// FIFO queue with a hard capacity.
#[derive(Debug, Default)]
pub struct RequestQueue {
    entries: VecDeque<QueuedRequest>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Park a request. Rejects immediately with `QueueFull` when the queue is
    /// at capacity; nothing is inserted in that case.
    pub fn push(
        &mut self,
        request: transport::RequestDescriptor,
        max_size: usize,
    ) -> Result<oneshot::Receiver<SettleResult>, ApiError> {
        if self.entries.len() >= max_size {
            debug!(depth = self.entries.len(), "queue at capacity, rejecting");
            return Err(ApiError::queue_full());
        }

        let (tx, rx) = oneshot::channel();
        let id = Uuid::new_v4();
        debug!(request_id = %id, depth = self.entries.len() + 1, "request queued");
        self.entries.push_back(QueuedRequest {
            id,
            enqueued_at: Instant::now(),
            request,
            settle: tx,
        });
        Ok(rx)
    }

    /// Remove every entry, preserving FIFO order. Entries pushed after this
    /// call belong to the next drain cycle.
    pub fn take_all(&mut self) -> VecDeque<QueuedRequest> {
        mem::take(&mut self.entries)
    }

    /// Remove entries that have waited strictly longer than `timeout`,
    /// preserving the FIFO order of both the removed and the surviving
    /// entries.
    pub fn remove_expired(&mut self, now: Instant, timeout: Duration) -> Vec<QueuedRequest> {
        let mut expired = Vec::new();
        let mut kept = VecDeque::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            if entry.wait_time(now) > timeout {
                expired.push(entry);
            } else {
                kept.push_back(entry);
            }
        }
        self.entries = kept;
        expired
    }
}
