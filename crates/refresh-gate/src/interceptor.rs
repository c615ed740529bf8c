//! Request-boundary orchestration
//!
//! The interceptor is the seam between ordinary API calls and the refresh
//! gate. It attaches the current credential to each outbound request and, on
//! a 401, obtains a fresh credential through the gate and replays the request
//! exactly once. Requests to the auth endpoints themselves never engage the
//! gate: a 401 from login or renewal is an answer, not a stale credential.

use std::sync::Arc;

use tracing::debug;

use crate::error::{ApiError, ApiErrorKind};
use crate::gate::RefreshGate;
use session::SessionStore;
use transport::{RequestDescriptor, Response, Transport};

/// Path prefixes that must never trigger a credential refresh.
const AUTH_PATHS: &[&str] = &["/auth/login", "/auth/refresh", "/auth/logout"];

fn is_auth_domain(path: &str) -> bool {
    AUTH_PATHS.iter().any(|prefix| path.starts_with(prefix))
}

/// Sends requests with the session credential attached and retries once
/// through the refresh gate on 401.
pub struct AuthInterceptor {
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionStore>,
    gate: Arc<RefreshGate>,
}

impl AuthInterceptor {
    pub fn new(
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionStore>,
        gate: Arc<RefreshGate>,
    ) -> Self {
        Self {
            transport,
            session,
            gate,
        }
    }

    /// Send a request with authentication handling.
    ///
    /// Successful responses pass through unchanged. Error statuses are
    /// normalized into [`ApiError`]; a 401 on a fresh, non-auth request
    /// additionally engages the gate and replays once with the renewed
    /// credential before normalizing.
    pub async fn send(&self, mut request: RequestDescriptor) -> Result<Response, ApiError> {
        if let Some(credential) = self.session.current().await {
            request.set_bearer(credential.token());
        }

        let response = self
            .transport
            .send(&request)
            .await
            .map_err(|e| ApiError::from_transport(&e))?;

        if response.status < 400 {
            return Ok(response);
        }

        // a replayed request failing again means the fresh credential was
        // rejected too; do not loop. Auth endpoints answer 401 on their own
        // terms and never engage the gate.
        if !response.is_unauthorized() || request.retried || is_auth_domain(request.path()) {
            return Err(ApiError::from_response(response.status, &response.body));
        }

        debug!(path = request.path(), "401 received, renewing credential");
        request.mark_retried();

        let credential = self
            .gate
            .credential_for_retry(request.clone())
            .await
            .map_err(escalate)?;

        request.set_bearer(credential.token());
        let replay = self
            .transport
            .send(&request)
            .await
            .map_err(|e| ApiError::from_transport(&e))?;

        if replay.status >= 400 {
            return Err(ApiError::from_response(replay.status, &replay.body));
        }
        Ok(replay)
    }
}

/// Renewal failures surface to the original caller as an expired session;
/// queue-level rejections keep their own identity so the caller can
/// distinguish backpressure and timeout from auth failure.
fn escalate(error: ApiError) -> ApiError {
    match error.kind {
        ApiErrorKind::Transport | ApiErrorKind::MaxRetriesExceeded => ApiError::session_expired(),
        _ => error,
    }
}
