//! # HTTP Transport
//!
//! One POST, one read. The gateway contract needs nothing more: a
//! form-urlencoded body goes out with the log id header, and the raw reply
//! bytes come back for the envelope parser.
//!
//! [`HttpTransport`] is the seam. [`ReqwestTransport`] is the production
//! implementation, built once from an [`HttpClientConfig`] and shared behind
//! an `Arc` by every [`crate::PayClient`] clone. Tests plug in their own
//! implementation and never touch the network.
//!
//! No retries happen here. A timeout surfaces as
//! [`TransportError::Timeout`] and the caller decides what to do with it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use thiserror::Error;
use tracing::debug;

use crate::config::{HttpClientConfig, FORM_CONTENT_TYPE, LOG_ID_HEADER};

/// A failed HTTP exchange. Always a network-level problem; the gateway's
/// own verdicts are reported through the response envelope instead.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP client or request could not be constructed.
    #[error("building request: {0}")]
    Build(String),

    /// No complete reply within the per-call timeout.
    #[error("timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// DNS resolution or TCP/TLS connect failed.
    #[error("connecting: {0}")]
    Connect(String),

    /// The request was sent but the exchange broke.
    #[error("sending request: {0}")]
    Request(String),

    /// The reply body could not be read.
    #[error("reading body: {0}")]
    Body(String),
}

/// Status code and raw body of a completed exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

/// The outbound half of the gateway contract.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST `body` as `application/x-www-form-urlencoded` to `url`, tagging
    /// the request with `log_id`. The whole exchange, including reading the
    /// body, must finish within `timeout`.
    async fn post_form(
        &self,
        url: &str,
        body: String,
        log_id: &str,
        timeout: Duration,
    ) -> Result<HttpReply, TransportError>;
}

// ---------------------------------------------------------------------------
// reqwest implementation
// ---------------------------------------------------------------------------

/// Pooled `reqwest` client. Cheap to clone.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &HttpClientConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));

        let inner = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout)
            .tcp_keepalive(Some(config.tcp_keepalive))
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;

        Ok(Self { inner })
    }

    fn classify(err: reqwest::Error, timeout: Duration) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_builder() {
            TransportError::Build(err.to_string())
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_form(
        &self,
        url: &str,
        body: String,
        log_id: &str,
        timeout: Duration,
    ) -> Result<HttpReply, TransportError> {
        let log_header = HeaderValue::from_str(log_id)
            .map_err(|e| TransportError::Build(format!("log id header: {e}")))?;

        let response = self
            .inner
            .post(url)
            .header(LOG_ID_HEADER, log_header)
            .timeout(timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| Self::classify(e, timeout))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| Self::classify(e, timeout))?
            .to_vec();

        debug!(url, log_id, status, bytes = body.len(), "gateway reply");

        Ok(HttpReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_from_default_config() {
        assert!(ReqwestTransport::new(&HttpClientConfig::default()).is_ok());
    }

    #[test]
    fn test_timeout_message_mentions_budget() {
        let err = TransportError::Timeout { timeout_ms: 250 };
        assert_eq!(err.to_string(), "timed out after 250ms");
    }

    #[tokio::test]
    async fn test_invalid_log_id_is_a_build_error() {
        let transport = ReqwestTransport::new(&HttpClientConfig::default()).unwrap();
        let err = transport
            .post_form(
                "http://127.0.0.1:9/gateway",
                String::new(),
                "bad\nheader",
                Duration::from_millis(50),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Build(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_network_error() {
        let transport = ReqwestTransport::new(&HttpClientConfig::default()).unwrap();
        let err = transport
            .post_form(
                "http://127.0.0.1:9/gateway",
                "a=1".into(),
                "log",
                Duration::from_millis(500),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::Connect(_) | TransportError::Timeout { .. } | TransportError::Request(_)
        ));
    }
}
