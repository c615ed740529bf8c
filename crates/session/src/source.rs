//! External credential renewal contract

use std::future::Future;
use std::pin::Pin;

use crate::credential::Credential;
use crate::error::Result;

/// The external renewal call the single-flight refresher guards.
///
/// Exactly one `renew()` is in flight at any time; the refresh gate enforces
/// that, not the implementation. An implementation only has to perform one
/// renewal attempt and report its outcome.
pub trait CredentialSource: Send + Sync {
    /// Perform one renewal attempt and return the new credential.
    fn renew(&self) -> Pin<Box<dyn Future<Output = Result<Credential>> + Send + '_>>;
}
