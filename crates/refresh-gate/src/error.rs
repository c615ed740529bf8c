//! Uniform API error payloads
//!
//! Every failure a caller can observe from the gate is an `ApiError` with a
//! stable wire shape: HTTP-style status, machine-readable type, and a message
//! safe to show an end user. Internal detail (transport messages, renewal
//! bodies) stays in `detail` and is never surfaced as `user_message`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Classification of gate failures, for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The waiting queue was at capacity.
    QueueFull,
    /// A queued caller out-waited the queue timeout.
    RequestTimeout,
    /// The consecutive-failure ceiling tripped; the session is gone.
    MaxRetriesExceeded,
    /// Renewal cannot produce a usable credential; re-authentication needed.
    SessionExpired,
    /// The request failed at or below the HTTP layer, or the upstream
    /// returned a non-retryable error status.
    Transport,
}

/// A structured error with a stable serialized shape.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{title}: {detail}")]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    #[serde(skip)]
    pub kind: ApiErrorKind,
    /// HTTP-style status code for this failure.
    pub status: u16,
    /// Machine-readable error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Short human-readable summary.
    pub title: String,
    /// Full diagnostic detail; not for end users.
    pub detail: String,
    /// Message safe to display to an end user.
    pub user_message: String,
    /// When the error was constructed, RFC 3339 UTC.
    pub timestamp: DateTime<Utc>,
}

impl ApiError {
    fn new(
        kind: ApiErrorKind,
        status: u16,
        error_type: &str,
        title: &str,
        detail: String,
        user_message: &str,
    ) -> Self {
        Self {
            kind,
            status,
            error_type: error_type.to_string(),
            title: title.to_string(),
            detail,
            user_message: user_message.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// The waiting queue is at capacity.
    pub fn queue_full() -> Self {
        Self::new(
            ApiErrorKind::QueueFull,
            429,
            "queue_full",
            "Request queue full",
            "the credential refresh queue is at capacity".to_string(),
            "The service is busy. Please try again in a moment.",
        )
    }

    /// A queued request waited longer than the queue timeout.
    pub fn request_timeout(id: Uuid) -> Self {
        Self::new(
            ApiErrorKind::RequestTimeout,
            408,
            "request_timeout",
            "Request timed out",
            format!("queued request {id} exceeded the queue timeout"),
            "The request took too long. Please try again.",
        )
    }

    /// The consecutive renewal-failure ceiling tripped.
    pub fn max_retries_exceeded() -> Self {
        Self::new(
            ApiErrorKind::MaxRetriesExceeded,
            401,
            "max_retries_exceeded",
            "Session renewal failed",
            "credential renewal failed too many times in a row".to_string(),
            "Your session could not be renewed. Please sign in again.",
        )
    }

    /// The session is unrecoverable and the caller must re-authenticate.
    pub fn session_expired() -> Self {
        Self::new(
            ApiErrorKind::SessionExpired,
            401,
            "session_expired",
            "Session expired",
            "the session is no longer valid".to_string(),
            "Your session has expired. Please sign in again.",
        )
    }

    /// A failure at or below the HTTP layer.
    pub fn from_transport(source: &transport::Error) -> Self {
        Self::new(
            ApiErrorKind::Transport,
            502,
            "transport_error",
            "Upstream request failed",
            source.to_string(),
            "The service is temporarily unavailable. Please try again.",
        )
    }

    /// A failed renewal attempt, as seen by the renewal initiator.
    ///
    /// A rejected refresh token means the session itself is gone; anything
    /// else is reported as an upstream failure the caller may retry later.
    pub fn from_renewal(source: &session::Error) -> Self {
        match source {
            session::Error::InvalidCredentials(_) => {
                let mut err = Self::session_expired();
                err.detail = source.to_string();
                err
            }
            _ => Self::new(
                ApiErrorKind::Transport,
                502,
                "renewal_failed",
                "Credential renewal failed",
                source.to_string(),
                "The service is temporarily unavailable. Please try again.",
            ),
        }
    }

    /// An error status from the upstream API, passed through with its
    /// original status code.
    pub fn from_response(status: u16, body: &str) -> Self {
        Self::new(
            ApiErrorKind::Transport,
            status,
            "upstream_error",
            "Upstream returned an error",
            format!("upstream responded with status {status}: {body}"),
            "The request could not be completed. Please try again.",
        )
    }

    /// Serialize into the wire payload for rendering in a response body.
    pub fn payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({
                "type": self.error_type,
                "status": self.status,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_full_shape() {
        let err = ApiError::queue_full();
        assert_eq!(err.kind, ApiErrorKind::QueueFull);
        assert_eq!(err.status, 429);
        assert_eq!(err.error_type, "queue_full");
    }

    #[test]
    fn request_timeout_names_the_request() {
        let id = Uuid::new_v4();
        let err = ApiError::request_timeout(id);
        assert_eq!(err.status, 408);
        assert!(err.detail.contains(&id.to_string()));
    }

    #[test]
    fn auth_failures_are_401() {
        assert_eq!(ApiError::max_retries_exceeded().status, 401);
        assert_eq!(ApiError::session_expired().status, 401);
    }

    #[test]
    fn from_response_preserves_status() {
        let err = ApiError::from_response(503, "maintenance");
        assert_eq!(err.status, 503);
        assert_eq!(err.kind, ApiErrorKind::Transport);
        assert!(err.detail.contains("maintenance"));
    }

    #[test]
    fn payload_uses_wire_field_names() {
        let err = ApiError::session_expired();
        let payload = err.payload();

        assert_eq!(payload["type"], "session_expired");
        assert_eq!(payload["status"], 401);
        assert_eq!(
            payload["userMessage"],
            "Your session has expired. Please sign in again."
        );
        // kind is internal classification, never serialized
        assert!(payload.get("kind").is_none());
        // RFC 3339 timestamp
        let ts = payload["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }

    #[test]
    fn user_message_never_leaks_detail() {
        let err = ApiError::from_transport(&transport::Error::Network(
            "connection refused to 10.0.0.5:8443".to_string(),
        ));
        assert!(err.detail.contains("10.0.0.5"));
        assert!(!err.user_message.contains("10.0.0.5"));
    }

    #[test]
    fn rejected_refresh_token_expires_the_session() {
        let err = ApiError::from_renewal(&session::Error::InvalidCredentials(
            "refresh token rejected (401)".to_string(),
        ));
        assert_eq!(err.kind, ApiErrorKind::SessionExpired);
        assert_eq!(err.status, 401);
        assert!(err.detail.contains("refresh token rejected"));
    }

    #[test]
    fn transient_renewal_failure_is_transport() {
        let err = ApiError::from_renewal(&session::Error::Http("connect timeout".to_string()));
        assert_eq!(err.kind, ApiErrorKind::Transport);
        assert_eq!(err.status, 502);
    }

    #[test]
    fn display_combines_title_and_detail() {
        let err = ApiError::queue_full();
        let text = err.to_string();
        assert!(text.starts_with("Request queue full: "));
    }
}
