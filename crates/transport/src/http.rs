//! Reqwest-backed transport
//!
//! Builds an outbound reqwest request from a `RequestDescriptor`, applies the
//! per-request timeout, and maps transport failures into `transport::Error`.
//! Timeouts are distinguished from other network failures so callers can
//! surface them differently.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::debug;

use crate::{Error, RequestDescriptor, Response, Result, Transport};

/// HTTP transport using a shared reqwest client.
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport with the given client and per-request timeout.
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

impl Transport for HttpTransport {
    fn send<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> Pin<Box<dyn Future<Output = Result<Response>> + Send + 'a>> {
        Box::pin(async move {
            let method = reqwest::Method::from_bytes(request.method.as_bytes())
                .map_err(|e| Error::InvalidRequest(format!("bad method {}: {e}", request.method)))?;

            let mut outbound = self
                .client
                .request(method, &request.url)
                .timeout(self.timeout);
            for (name, value) in &request.headers {
                outbound = outbound.header(name.as_str(), value.as_str());
            }
            if let Some(body) = &request.body {
                outbound = outbound.body(body.clone());
            }

            debug!(method = %request.method, url = %request.url, "sending upstream request");

            match outbound.send().await {
                Ok(upstream) => {
                    let status = upstream.status().as_u16();
                    let body = upstream
                        .text()
                        .await
                        .map_err(|e| Error::Network(format!("reading response body: {e}")))?;
                    Ok(Response { status, body })
                }
                Err(e) if e.is_timeout() => Err(Error::Timeout(e.to_string())),
                Err(e) => Err(Error::Network(e.to_string())),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_method_is_rejected_without_sending() {
        let transport = HttpTransport::new(reqwest::Client::new(), Duration::from_secs(1));
        let request = RequestDescriptor::new("NOT A METHOD", "https://api.example.com/v1/items");

        let err = transport.send(&request).await.unwrap_err();
        assert!(
            matches!(err, Error::InvalidRequest(_)),
            "expected InvalidRequest, got: {err}"
        );
    }

    #[tokio::test]
    async fn unreachable_host_maps_to_network_error() {
        // Reserved TEST-NET-1 address, nothing listens there; connect fails
        // fast or times out, either way the result is a transport error.
        let transport = HttpTransport::new(reqwest::Client::new(), Duration::from_millis(200));
        let request = RequestDescriptor::new("GET", "http://192.0.2.1:9/none");

        let err = transport.send(&request).await.unwrap_err();
        assert!(
            matches!(err, Error::Network(_) | Error::Timeout(_)),
            "expected Network or Timeout, got: {err}"
        );
    }
}
