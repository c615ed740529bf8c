//! Concurrency controller for shared-credential renewal
//!
//! When a shared access credential expires, every in-flight API call discovers
//! the 401 at roughly the same time. Left alone, each one would fire its own
//! renewal, a thundering herd. This crate guarantees that exactly one
//! renewal runs while every other caller either waits for that single outcome,
//! fails fast when the system is saturated, or times out when renewal stalls.
//!
//! Request lifecycle:
//! 1. A call hits 401 → `AuthInterceptor` asks the `RefreshGate` for a fresh
//!    credential
//! 2. If the gate is idle, the caller becomes the renewal initiator
//! 3. Concurrent callers park in a bounded FIFO queue (hard capacity, reject
//!    when full rather than wait unboundedly)
//! 4. Renewal success drains the whole queue with the new credential and each
//!    caller replays its original request
//! 5. A background sweep rejects queued callers that out-wait `queue_timeout`
//! 6. Repeated renewal failures trip the retry ceiling: no further network
//!    call, the queue drains, and the session is cleared

pub mod config;
pub mod error;
pub mod gate;
pub mod interceptor;
pub mod metrics;
pub mod queue;
pub mod sweep;

pub use config::GateConfig;
pub use error::{ApiError, ApiErrorKind};
pub use gate::RefreshGate;
pub use interceptor::AuthInterceptor;
pub use metrics::MetricsSnapshot;
pub use sweep::spawn_sweep_task;
