//! Session and credential management
//!
//! Holds the current short-lived access credential and performs the external
//! renewal call. This crate is the "upstream collaborator" of the refresh
//! gate: the gate stores a fresh credential here after a successful renewal
//! and clears the session when renewal fails for good.
//!
//! Credential flow:
//! 1. `SessionStore::current()` supplies the credential attached to outbound
//!    requests
//! 2. On a 401, the refresh gate invokes `CredentialSource::renew()`
//! 3. Success → `SessionStore::set_credential()` with the new credential
//! 4. Final failure (retry ceiling) → `SessionStore::clear_session()`

pub mod credential;
pub mod error;
pub mod http;
pub mod source;
pub mod store;

pub use credential::Credential;
pub use error::{Error, Result};
pub use http::{HttpCredentialSource, TokenResponse};
pub use source::CredentialSource;
pub use store::{MemorySessionStore, SessionStore};
