//! # Gateway Client
//!
//! [`PayClient`] runs the round trip shared by every gateway operation:
//!
//! ```text
//! validate -> encode + sign -> POST -> parse envelope -> classify -> decode
//! ```
//!
//! Local failures (validation, encoding) happen before any I/O. Transport
//! and parse failures carry the stage that broke. A business rejection is
//! returned as [`PayError::Business`] without a stage label, so callers can
//! match it directly. Nothing is retried.
//!
//! The client holds nothing but a shared transport, so clone it freely and
//! use it from as many tasks as you like. Requests and responses are owned
//! by the calling task for the duration of one call.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::HttpClientConfig;
use crate::envelope::{classify, ResponseEnvelope};
use crate::error::PayError;
use crate::request::{PayRequest, PayResponse};
use crate::transport::{HttpTransport, ReqwestTransport};

/// Per-call knobs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Replaces the request-derived log id in the `X-Tt-Logid` header and
    /// in business error details.
    pub log_id: Option<String>,
}

impl ExecuteOptions {
    pub fn with_log_id(log_id: impl Into<String>) -> Self {
        Self {
            log_id: Some(log_id.into()),
        }
    }
}

/// Executes signed requests against the gateway.
#[derive(Clone)]
pub struct PayClient {
    transport: Arc<dyn HttpTransport>,
}

impl PayClient {
    /// A client backed by a pooled `reqwest` transport.
    pub fn new(config: &HttpClientConfig) -> Result<Self, PayError> {
        let transport =
            ReqwestTransport::new(config).map_err(|e| PayError::transport("client: build", e))?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    /// A client over any transport. Tests use this to stay off the network.
    pub fn with_transport(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Run one request/response round trip.
    ///
    /// On success `resp` holds the envelope and the decoded payload. If the
    /// call fails before classification, `resp` is left untouched.
    pub async fn execute<Req, Resp>(
        &self,
        req: &Req,
        resp: &mut Resp,
        opts: &ExecuteOptions,
    ) -> Result<(), PayError>
    where
        Req: PayRequest + ?Sized,
        Resp: PayResponse,
    {
        req.validate()?;

        let config = &req.common().config;
        if config.timeout_ms == 0 {
            return Err(PayError::invalid_param(
                "ClientTimeout",
                "must be a positive number",
            ));
        }

        let body = req.encode()?;
        let log_id = opts.log_id.clone().unwrap_or_else(|| req.log_id());
        let url = req.url();

        debug!(%log_id, method = %req.common().method, %url, "posting to gateway");

        let reply = self
            .transport
            .post_form(&url, body, &log_id, config.timeout())
            .await
            .map_err(|e| PayError::transport("execute: http post", e))?;

        debug!(
            %log_id,
            status = reply.status,
            body = %String::from_utf8_lossy(&reply.body),
            "gateway response"
        );
        if !(200..300).contains(&reply.status) {
            warn!(%log_id, status = reply.status, "non-2xx gateway status");
        }

        let envelope = ResponseEnvelope::parse(&reply.body)
            .map_err(|e| PayError::malformed("execute: parse response", e))?;

        classify(&envelope, &log_id)?;

        resp.set_envelope(envelope);
        resp.decode()
            .map_err(|e| PayError::malformed("execute: decode response", e))
    }
}

impl fmt::Debug for PayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayClient").finish_non_exhaustive()
    }
}
