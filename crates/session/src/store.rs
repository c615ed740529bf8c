//! Session store holding the current credential
//!
//! The store is the single source of truth for the credential attached to
//! outbound requests. The refresh gate writes to it on renewal success and
//! clears it on final failure; everything else only reads.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::credential::Credential;

/// Abstraction over the place the current credential lives.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn SessionStore>`).
pub trait SessionStore: Send + Sync {
    /// Current credential, if a session is active.
    fn current(&self) -> Pin<Box<dyn Future<Output = Option<Credential>> + Send + '_>>;

    /// Replace (or remove, with `None`) the stored credential.
    fn set_credential(
        &self,
        credential: Option<Credential>,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    /// Drop the credential and mark the session as ended. Called once when
    /// renewal fails terminally; re-authentication happens above this layer.
    fn clear_session(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// In-memory session store.
///
/// Reads briefly take the lock to clone the credential, so request-time reads
/// do not block on a concurrent renewal write.
#[derive(Default)]
pub struct MemorySessionStore {
    state: RwLock<Option<Credential>>,
}

impl MemorySessionStore {
    /// Create an empty store (no active session).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with a credential.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            state: RwLock::new(Some(credential)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn current(&self) -> Pin<Box<dyn Future<Output = Option<Credential>> + Send + '_>> {
        Box::pin(async move { self.state.read().await.clone() })
    }

    fn set_credential(
        &self,
        credential: Option<Credential>,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            debug!(present = credential.is_some(), "credential updated");
            *state = credential;
        })
    }

    fn clear_session(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            info!("session cleared");
            *state = None;
        })
    }
}
