//! # Gateway Configuration & Constants
//!
//! Every magic string the gateway expects lives here: method names, the
//! default domain, gateway paths, the fixed header values every request
//! carries, and the public key the gateway signs its callbacks with.
//!
//! Two runtime configuration values are defined as well:
//!
//! - [`Config`]: the merchant credentials and endpoint, required by every
//!   request.
//! - [`HttpClientConfig`]: the connection pool behind the default HTTP
//!   transport. Configured once at process start.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PayError;
use crate::validation;

// ---------------------------------------------------------------------------
// Methods
// ---------------------------------------------------------------------------

/// Pre-order (trade creation). Never sent to the gateway by this crate; only
/// used to sign the locally built request.
pub const METHOD_TRADE_CREATE: &str = "tp.trade.create";

/// Cashier confirm step. Written into the applet 1.0 cashier parameters.
pub const METHOD_TRADE_CONFIRM: &str = "tp.trade.confirm";

pub const METHOD_TRADE_QUERY: &str = "tp.trade.query";
pub const METHOD_REFUND_CREATE: &str = "tp.refund.create";
pub const METHOD_REFUND_QUERY: &str = "tp.refund.query";
pub const METHOD_WITHDRAW_CREATE: &str = "tp.withdraw.create";
pub const METHOD_WITHDRAW_QUERY: &str = "tp.withdraw.query";

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// Production gateway domain. Used whenever [`Config::domain`] is empty.
pub const DEFAULT_DOMAIN: &str = "https://tp-pay.snssdk.com";

/// Path of the signed-request gateway.
pub const GATEWAY_PATH: &str = "gateway";

/// Alternate gateway path. Some merchants are routed through it.
pub const GATEWAY_PATH_U: &str = "gateway-u";

/// Path of the hosted H5 withdrawal cashier.
pub const WITHDRAW_H5_PATH: &str = "redPacketWithdraw";

/// Header carrying the per-request log identifier.
pub const LOG_ID_HEADER: &str = "X-Tt-Logid";

/// Content type of every outbound request body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

// ---------------------------------------------------------------------------
// Fixed header values
// ---------------------------------------------------------------------------

pub const DEFAULT_VERSION: &str = "1.0";
pub const SIGN_TYPE_MD5: &str = "MD5";
pub const FORMAT_JSON: &str = "JSON";
pub const CHARSET_UTF8: &str = "utf-8";

/// Default per-call timeout when a configuration file leaves it out.
pub const DEFAULT_TIMEOUT_MS: u64 = 6_000;

// ---------------------------------------------------------------------------
// Trust material
// ---------------------------------------------------------------------------

/// The gateway's RSA public key (SPKI PEM). Callback notifications are
/// signed with the matching private key.
///
/// Parsed once, on first use, by [`crate::crypto::PublicVerifier::gateway`].
/// Callers that need a different key construct their own verifier with
/// [`crate::crypto::PublicVerifier::from_pem`].
pub const GATEWAY_PUBLIC_KEY_PEM: &str = "-----BEGIN PUBLIC KEY-----
MIGfMA0GCSqGSIb3DQEBAQUAA4GNADCBiQKBgQDOZZ7iAkS3oN970+yDONe5TPhP
rLHoNOZOjJjackEtgbptdy4PYGBGdeAUAz75TO7YUGESCM+JbyOz1YzkMfKl2HwY
doePEe8qzfk5CPq6VAhYJjDFA/M+BAZ6gppWTjKnwMcHVK4l2qiepKmsw6bwf/kk
LTV9l13r6Iq5U+vrmwIDAQAB
-----END PUBLIC KEY-----";

// ---------------------------------------------------------------------------
// Merchant configuration
// ---------------------------------------------------------------------------

/// Merchant credentials and endpoint. Required to construct any request.
///
/// `Debug` never prints the secret.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Application id assigned by the gateway. Selects the signing secret
    /// on the gateway side.
    pub app_id: String,
    /// Shared secret used for the MD5 request signature.
    pub app_secret: String,
    /// Merchant number assigned by the gateway.
    pub merchant_id: String,
    /// Gateway base URL including scheme, e.g. `https://tp-pay.snssdk.com`.
    /// Empty means [`DEFAULT_DOMAIN`].
    #[serde(default)]
    pub domain: String,
    /// Per-call timeout in milliseconds. Must be positive.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Config {
    pub fn new(
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        merchant_id: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            merchant_id: merchant_id.into(),
            domain: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Builder-style domain override.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Builder-style timeout override.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// The domain requests are sent to, with the default applied and any
    /// trailing slash removed.
    pub fn effective_domain(&self) -> &str {
        if self.domain.is_empty() {
            DEFAULT_DOMAIN
        } else {
            self.domain.trim_end_matches('/')
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Checks the credential syntax and the timeout.
    pub fn validate(&self) -> Result<(), PayError> {
        validation::check_app_id(&self.app_id)?;
        validation::check_merchant_id(&self.merchant_id)?;
        validation::check_app_secret(&self.app_secret)?;
        if self.timeout_ms == 0 {
            return Err(PayError::invalid_param(
                "ClientTimeout",
                "must be a positive number",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .field("merchant_id", &self.merchant_id)
            .field("domain", &self.effective_domain())
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// HTTP client configuration
// ---------------------------------------------------------------------------

/// Connection pool settings for [`crate::transport::ReqwestTransport`].
///
/// The per-call timeout is not here: it comes from [`Config::timeout_ms`]
/// of the request being executed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// TCP keep-alive interval for pooled connections.
    pub tcp_keepalive: Duration,
    /// How long an idle pooled connection is kept before closing.
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections kept per host.
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            tcp_keepalive: Duration::from_secs(60),
            pool_idle_timeout: Duration::from_secs(65),
            pool_max_idle_per_host: 2000,
        }
    }
}
