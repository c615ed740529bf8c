//! Single-flight credential renewal with a bounded waiting queue
//!
//! The gate serializes credential renewal: at most one `renew()` call is in
//! flight, no matter how many requests discover the expired credential
//! concurrently. Queue, refresh phase, failure counter, and metrics all live
//! behind one `Mutex`, so every decision (enqueue vs. initiate, drain vs.
//! reject) is made against a consistent view of the state.
//!
//! The broadcast channel for sharing a renewal outcome is created while the
//! lock is held, and sharers subscribe under the same lock. A sharer can
//! therefore never miss the outcome of the renewal it observed in flight.

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::GateConfig;
use crate::error::ApiError;
use crate::metrics::{MetricsSnapshot, MetricsState};
use crate::queue::{RequestQueue, SettleResult};
use session::{Credential, CredentialSource, SessionStore};
use transport::RequestDescriptor;

/// Whether a renewal is currently in flight.
enum RefreshPhase {
    Idle,
    Refreshing {
        /// Outcome channel for callers that joined after the renewal started.
        /// Capacity 1: exactly one message is ever sent.
        done: broadcast::Sender<SettleResult>,
    },
}

/// Everything the gate mutates, behind one lock.
struct GateState {
    queue: RequestQueue,
    phase: RefreshPhase,
    consecutive_failures: u32,
    metrics: MetricsState,
}

/// What a caller asking for a renewal should do, decided under the lock.
enum RefreshDecision {
    /// This caller runs the renewal.
    Start(broadcast::Sender<SettleResult>),
    /// A renewal is already in flight; wait for its outcome.
    Share(broadcast::Receiver<SettleResult>),
    /// The failure ceiling tripped; the session must be cleared.
    CeilingTripped,
}

/// Coordinates credential renewal for all callers of one API client.
pub struct RefreshGate {
    config: GateConfig,
    session: Arc<dyn SessionStore>,
    source: Arc<dyn CredentialSource>,
    state: Mutex<GateState>,
}

impl RefreshGate {
    pub fn new(
        config: GateConfig,
        session: Arc<dyn SessionStore>,
        source: Arc<dyn CredentialSource>,
    ) -> Self {
        Self {
            config,
            session,
            source,
            state: Mutex::new(GateState {
                queue: RequestQueue::new(),
                phase: RefreshPhase::Idle,
                consecutive_failures: 0,
                metrics: MetricsState::default(),
            }),
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Obtain a fresh credential, renewing if necessary.
    ///
    /// If a renewal is already in flight the caller waits for its outcome
    /// instead of starting another one.
    pub async fn refresh(&self) -> Result<Credential, ApiError> {
        let decision = {
            let mut state = self.state.lock().await;
            self.begin_refresh_locked(&mut state)
        };
        self.finish_refresh(decision).await
    }

    /// Obtain a credential for retrying `request` after a 401.
    ///
    /// The enqueue-or-initiate choice is made atomically under the lock:
    /// if a renewal is in flight the request parks in the queue and waits to
    /// be settled; otherwise this caller initiates the renewal itself.
    pub async fn credential_for_retry(
        &self,
        request: RequestDescriptor,
    ) -> Result<Credential, ApiError> {
        enum Path {
            Wait(tokio::sync::oneshot::Receiver<SettleResult>),
            Decided(RefreshDecision),
        }

        let path = {
            let mut state = self.state.lock().await;
            if matches!(state.phase, RefreshPhase::Refreshing { .. }) {
                let receiver = state.queue.push(request, self.config.max_queue_size)?;
                let depth = state.queue.len();
                state.metrics.record_enqueue(depth);
                Path::Wait(receiver)
            } else {
                Path::Decided(self.begin_refresh_locked(&mut state))
            }
        };

        match path {
            Path::Wait(receiver) => match receiver.await {
                Ok(outcome) => outcome,
                // drain side dropped without settling; only possible if the
                // gate itself is being torn down
                Err(_) => Err(ApiError::session_expired()),
            },
            Path::Decided(decision) => self.finish_refresh(decision).await,
        }
    }

    /// Park a request in the queue and wait for the next renewal outcome.
    ///
    /// Unlike [`credential_for_retry`](Self::credential_for_retry) this never
    /// initiates a renewal; it is the raw enqueue operation.
    pub async fn wait_for_credential(
        &self,
        request: RequestDescriptor,
    ) -> Result<Credential, ApiError> {
        let receiver = {
            let mut state = self.state.lock().await;
            let receiver = state.queue.push(request, self.config.max_queue_size)?;
            let depth = state.queue.len();
            state.metrics.record_enqueue(depth);
            receiver
        };

        match receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(ApiError::session_expired()),
        }
    }

    /// Reject queued requests that have out-waited the queue timeout.
    ///
    /// Entries are settled with `RequestTimeout`; surviving entries keep
    /// their FIFO position. Normally driven by [`spawn_sweep_task`]
    /// (crate::sweep::spawn_sweep_task).
    pub async fn sweep_expired(&self) {
        let expired = {
            let mut state = self.state.lock().await;
            let now = Instant::now();
            let expired = state.queue.remove_expired(now, self.config.queue_timeout());
            for entry in &expired {
                state.metrics.record_timeout();
                state.metrics.record_queue_wait(entry.wait_time(now));
            }
            let depth = state.queue.len();
            state.metrics.record_queue_depth(depth);
            expired
        };

        for entry in expired {
            warn!(request_id = %entry.id, "queued request timed out");
            let id = entry.id;
            entry.settle(Err(ApiError::request_timeout(id)));
        }
    }

    /// Point-in-time copy of the gate's counters.
    pub async fn metrics(&self) -> MetricsSnapshot {
        self.state.lock().await.metrics.snapshot()
    }

    /// Number of requests currently parked in the queue.
    pub async fn queue_len(&self) -> usize {
        self.state.lock().await.queue.len()
    }

    /// Whether a renewal is currently in flight.
    pub async fn is_refreshing(&self) -> bool {
        matches!(
            self.state.lock().await.phase,
            RefreshPhase::Refreshing { .. }
        )
    }

    /// Current consecutive renewal-failure count.
    pub async fn consecutive_failures(&self) -> u32 {
        self.state.lock().await.consecutive_failures
    }

    /// Return the gate to a clean slate: settle all queued requests with
    /// `SessionExpired`, zero the counters, and reset the failure count.
    ///
    /// An in-flight renewal is not interrupted; it will complete into an
    /// empty queue.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        info!(pending = state.queue.len(), "gate reset");
        Self::drain_locked(&mut state, Err(ApiError::session_expired()));
        state.consecutive_failures = 0;
        state.metrics.reset();
    }

    /// Settle every queued request with `SessionExpired`. Called when the
    /// owning client shuts down, so no waiter hangs forever.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        info!(pending = state.queue.len(), "gate shutting down");
        Self::drain_locked(&mut state, Err(ApiError::session_expired()));
    }

    /// Decide under the lock whether this caller starts, shares, or
    /// short-circuits.
    ///
    /// On the ceiling path the queue is drained and the counters are updated
    /// here, while still under the lock; only the async session clearing is
    /// deferred to [`finish_refresh`](Self::finish_refresh).
    fn begin_refresh_locked(&self, state: &mut GateState) -> RefreshDecision {
        if let RefreshPhase::Refreshing { done } = &state.phase {
            return RefreshDecision::Share(done.subscribe());
        }

        if state.consecutive_failures >= self.config.max_retries {
            warn!(
                failures = state.consecutive_failures,
                max_retries = self.config.max_retries,
                "renewal failure ceiling reached, expiring session"
            );
            state.consecutive_failures = 0;
            state.metrics.record_refresh_failure();
            Self::drain_locked(state, Err(ApiError::max_retries_exceeded()));
            return RefreshDecision::CeilingTripped;
        }

        // subscribe-under-lock: sharers join before any outcome can be sent
        let (done, _) = broadcast::channel(1);
        state.phase = RefreshPhase::Refreshing { done: done.clone() };
        RefreshDecision::Start(done)
    }

    async fn finish_refresh(&self, decision: RefreshDecision) -> Result<Credential, ApiError> {
        match decision {
            RefreshDecision::Start(done) => self.run_renewal(done).await,
            RefreshDecision::Share(mut outcome) => match outcome.recv().await {
                Ok(result) => result,
                Err(_) => Err(ApiError::session_expired()),
            },
            RefreshDecision::CeilingTripped => {
                self.session.clear_session().await;
                Err(ApiError::session_expired())
            }
        }
    }

    /// Run the single renewal attempt and fan the outcome out to the queue,
    /// to sharers, and to the session store.
    async fn run_renewal(
        &self,
        done: broadcast::Sender<SettleResult>,
    ) -> Result<Credential, ApiError> {
        info!("starting credential renewal");

        match self.source.renew().await {
            Ok(credential) => {
                // store first: a drained caller replaying immediately must
                // see the new credential
                self.session
                    .set_credential(Some(credential.clone()))
                    .await;

                let mut state = self.state.lock().await;
                state.phase = RefreshPhase::Idle;
                state.consecutive_failures = 0;
                state.metrics.record_refresh_success();
                Self::drain_locked(&mut state, Ok(credential.clone()));
                drop(state);

                info!("credential renewal succeeded");
                let _ = done.send(Ok(credential.clone()));
                Ok(credential)
            }
            Err(e) => {
                error!(error = %e, "credential renewal failed");

                let mut state = self.state.lock().await;
                state.phase = RefreshPhase::Idle;
                state.consecutive_failures += 1;
                let failures = state.consecutive_failures;
                state.metrics.record_refresh_failure();
                Self::drain_locked(&mut state, Err(ApiError::session_expired()));
                drop(state);

                warn!(consecutive_failures = failures, "renewal failure recorded");
                let _ = done.send(Err(ApiError::session_expired()));
                Err(ApiError::from_renewal(&e))
            }
        }
    }

    /// Settle every queued entry with a copy of `outcome` and record queue
    /// wait times. Oneshot sends never block, so this is safe under the lock.
    fn drain_locked(state: &mut GateState, outcome: SettleResult) {
        let entries = state.queue.take_all();
        if !entries.is_empty() {
            debug!(
                drained = entries.len(),
                ok = outcome.is_ok(),
                "settling queued requests"
            );
        }
        let now = Instant::now();
        for entry in entries {
            state.metrics.record_queue_wait(entry.wait_time(now));
            entry.settle(outcome.clone());
        }
        state.metrics.record_queue_depth(0);
    }
}
