//! HTTP credential renewal
//!
//! POSTs a `grant_type=refresh_token` form to a configured token endpoint and
//! parses the response into a fresh credential. 401/403 from the endpoint
//! means the refresh token itself was rejected, which is reported separately
//! from transient endpoint failures.

use std::future::Future;
use std::pin::Pin;

use common::Secret;
use serde::Deserialize;
use tracing::debug;

use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::source::CredentialSource;

/// Response from the token endpoint.
///
/// `expires_in` is a delta in seconds from the response time. The refresh
/// gate does not schedule by expiry, so the value is carried for callers that
/// want it and otherwise ignored.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Seconds until the access token expires (delta, not absolute)
    pub expires_in: u64,
}

/// Credential source backed by an HTTP token endpoint.
pub struct HttpCredentialSource {
    client: reqwest::Client,
    token_url: String,
    refresh_token: Secret<String>,
}

impl HttpCredentialSource {
    /// Create a source renewing against `token_url` with the given refresh
    /// token.
    pub fn new(
        client: reqwest::Client,
        token_url: impl Into<String>,
        refresh_token: impl Into<Secret<String>>,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl CredentialSource for HttpCredentialSource {
    fn renew(&self) -> Pin<Box<dyn Future<Output = Result<Credential>> + Send + '_>> {
        Box::pin(async move {
            debug!(endpoint = %self.token_url, "renewing credential");

            let response = self
                .client
                .post(&self.token_url)
                .form(&[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", self.refresh_token.expose().as_str()),
                ])
                .send()
                .await
                .map_err(|e| Error::Http(format!("renewal request failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| String::from("<no body>"));

                // 401/403 means the refresh token is revoked or invalid
                if status.as_u16() == 401 || status.as_u16() == 403 {
                    return Err(Error::InvalidCredentials(format!(
                        "refresh token rejected ({status}): {body}"
                    )));
                }

                return Err(Error::Renewal(format!(
                    "token endpoint returned {status}: {body}"
                )));
            }

            let token = response
                .json::<TokenResponse>()
                .await
                .map_err(|e| Error::Renewal(format!("invalid token response: {e}")))?;

            Ok(Credential::new(token.access_token))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_response_deserializes() {
        let json = r#"{"access_token":"at_abc","expires_in":3600}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "at_abc");
        assert_eq!(token.expires_in, 3600);
    }

    #[test]
    fn token_response_ignores_extra_fields() {
        let json = r#"{"access_token":"at_abc","expires_in":60,"token_type":"Bearer"}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "at_abc");
    }

    #[tokio::test]
    async fn unreachable_endpoint_reports_http_error() {
        // Reserved TEST-NET-1 address; the request fails before any token
        // endpoint semantics apply.
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(200))
            .build()
            .unwrap();
        let source = HttpCredentialSource::new(client, "http://192.0.2.1:9/token", "rt_x");

        let err = source.renew().await.unwrap_err();
        assert!(matches!(err, Error::Http(_)), "expected Http, got: {err}");
    }
}
