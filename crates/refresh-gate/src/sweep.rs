//! Background timeout sweep
//!
//! A queued caller whose renewal never settles (initiator stuck on a
//! half-open connection, for example) must not wait forever. The sweep task
//! periodically rejects entries that have out-waited the queue timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::gate::RefreshGate;

/// Spawn the periodic sweep for `gate`.
///
/// The returned handle can be aborted on shutdown; queued entries are then
/// settled by [`RefreshGate::shutdown`] rather than left to time out.
pub fn spawn_sweep_task(gate: Arc<RefreshGate>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!(period_ms = period.as_millis() as u64, "sweep task started");
        let mut ticker = tokio::time::interval(period);
        // the first tick completes immediately; skip it
        ticker.tick().await;
        loop {
            ticker.tick().await;
            gate.sweep_expired().await;
        }
    })
}
