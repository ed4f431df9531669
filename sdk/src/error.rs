//! Error types for gateway operations.
//!
//! Every fallible operation returns a [`PayError`]. The variants follow the
//! stage at which a call failed, so callers can tell "never left the
//! process" apart from "the network broke" and "the gateway said no":
//!
//! | Variant             | Stage                      | Retryable |
//! |---------------------|----------------------------|-----------|
//! | `InvalidParam`      | local validation           | no        |
//! | `Encoding`          | building the signed body   | no        |
//! | `Transport`         | HTTP exchange              | maybe     |
//! | `MalformedResponse` | parsing/decoding the body  | no        |
//! | `Business`          | gateway rejected the call  | no        |
//! | `Verification`      | callback signature invalid | no        |
//! | `Callback`          | callback payload unusable  | no        |

use std::fmt;

use thiserror::Error;

use crate::crypto::EncodingError;
use crate::transport::TransportError;

/// Errors that can occur while building, sending, or interpreting a gateway
/// call, or while authenticating a callback.
#[derive(Debug, Error)]
pub enum PayError {
    /// A request field failed local validation. Nothing was sent.
    #[error("invalid param: {field} {reason}")]
    InvalidParam {
        /// Name of the offending field, as the gateway documents it.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// A field could not be turned into text for signing.
    #[error("encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    /// The HTTP exchange failed (DNS, connect, timeout, body read).
    #[error("{stage}: {source}")]
    Transport {
        /// Which step of the call was running.
        stage: &'static str,
        #[source]
        source: TransportError,
    },

    /// The gateway answered, but the body could not be parsed or decoded.
    #[error("{stage}: malformed response: {reason}")]
    MalformedResponse {
        /// Which step of the call was running.
        stage: &'static str,
        reason: String,
    },

    /// The gateway processed the request and rejected it.
    ///
    /// Never wrapped with a stage label so callers can match on it directly.
    #[error(transparent)]
    Business(#[from] BusinessError),

    /// A callback notification did not carry a valid gateway signature.
    /// Its fields must not be trusted.
    #[error("invalid callback signature")]
    Verification,

    /// A callback payload could not be parsed into parameters.
    #[error("invalid callback payload: {0}")]
    Callback(String),
}

impl PayError {
    pub(crate) fn invalid_param(field: &'static str, reason: impl Into<String>) -> Self {
        PayError::InvalidParam {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn transport(stage: &'static str, source: TransportError) -> Self {
        PayError::Transport { stage, source }
    }

    pub(crate) fn malformed(stage: &'static str, reason: impl fmt::Display) -> Self {
        PayError::MalformedResponse {
            stage,
            reason: reason.to_string(),
        }
    }

    /// Only transport failures are plausibly worth retrying. The gateway
    /// already saw (and rejected) everything else.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PayError::Transport { .. })
    }

    /// The gateway's structured rejection, if that is what this is.
    pub fn as_business(&self) -> Option<&BusinessError> {
        match self {
            PayError::Business(e) => Some(e),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Business Error
// ---------------------------------------------------------------------------

/// A rejection reported by the gateway after a successful network exchange.
///
/// `detail` always carries `log_id:<id>` so the failure can be matched
/// against gateway-side logs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BusinessError {
    pub code: String,
    pub msg: String,
    pub sub_code: String,
    pub sub_msg: String,
    pub detail: String,
}

impl BusinessError {
    pub(crate) fn with_log_id(
        code: String,
        msg: String,
        sub_code: String,
        sub_msg: String,
        log_id: &str,
    ) -> Self {
        Self {
            code,
            msg,
            sub_code,
            sub_msg,
            detail: format!("log_id:{}", log_id),
        }
    }
}

impl fmt::Display for BusinessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"{{"code": "{}", "msg": "{}", "sub_code": "{}", "sub_msg": "{}", "detail": "{}"}}"#,
            self.code, self.msg, self.sub_code, self.sub_msg, self.detail
        )
    }
}

impl std::error::Error for BusinessError {}
