//! Error types for credential renewal operations

/// Errors from session and renewal operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("credential renewal failed: {0}")]
    Renewal(String),

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;
