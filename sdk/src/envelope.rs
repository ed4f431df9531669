//! # Response Envelope
//!
//! The gateway answers in one of two shapes:
//!
//! ```text
//! gateway-routed                          direct
//! {                                       {
//!   "response": {                           "code": 0,
//!     "code": "10000",                      "msg": "",
//!     "msg": "Success",                     "data": { "trade_no": "...",
//!     "sub_code": "", "sub_msg": "",                  "url": "..." }
//!     ...payload fields...                }
//!   },
//!   "sign": "..."
//! }
//! ```
//!
//! Parsing is two-phase. The body is first read into an untyped
//! [`serde_json::Value`] so [`classify`] can look at the discriminant (is
//! there a non-null `response` object?). Only after classification succeeds
//! is the payload strictly decoded into an operation's typed struct, from
//! `response` when present and from `data` otherwise.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::BusinessError;

/// The code a gateway-routed response carries on success.
pub const GATEWAY_SUCCESS_CODE: &str = "10000";

/// The code a direct response carries on success.
pub const DIRECT_SUCCESS_CODE: i64 = 0;

/// Stand-in for a missing direct code. Never equal to the success value.
const MISSING_CODE: i64 = -1;

/// Which of the two shapes a response has.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// A non-null `response` object is present.
    GatewayRouted,
    /// Everything else: top-level `code`, `msg`, `data`.
    Direct,
}

/// A parsed, not yet interpreted, response body.
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseEnvelope(Value);

impl Default for ResponseEnvelope {
    fn default() -> Self {
        Self(Value::Null)
    }
}

impl ResponseEnvelope {
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body).map(Self)
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn shape(&self) -> Shape {
        if self.field("response").is_some() {
            Shape::GatewayRouted
        } else {
            Shape::Direct
        }
    }

    /// The payload object for the envelope's shape, if there is one.
    pub fn payload(&self) -> Option<&Value> {
        match self.shape() {
            Shape::GatewayRouted => self.field("response"),
            Shape::Direct => self.field("data"),
        }
    }

    /// Strictly decode the payload. A missing payload decodes as an empty
    /// object, so every typed field takes its default.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let payload = self
            .payload()
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        serde_json::from_value(payload)
    }
}

/// Decide whether a completed exchange is a business success.
///
/// - Gateway-routed: success iff `response.code` is `"10000"`. Otherwise a
///   [`BusinessError`] built from `code`, `msg`, `sub_code` and `sub_msg`.
/// - Direct: success iff the top-level `code` is numeric `0`. A missing or
///   non-integer code counts as `-1`. Otherwise a [`BusinessError`] from
///   `code` and `msg`, with empty sub fields.
///
/// `log_id` ends up in [`BusinessError::detail`].
pub fn classify(envelope: &ResponseEnvelope, log_id: &str) -> Result<(), BusinessError> {
    match envelope.shape() {
        Shape::GatewayRouted => {
            let response = envelope.field("response");
            let get = |name: &str| text(response.and_then(|r| r.get(name)));
            let code = get("code");
            if code == GATEWAY_SUCCESS_CODE {
                return Ok(());
            }
            Err(BusinessError::with_log_id(
                code,
                get("msg"),
                get("sub_code"),
                get("sub_msg"),
                log_id,
            ))
        }
        Shape::Direct => {
            let code = envelope.field("code");
            let numeric = code.and_then(Value::as_i64).unwrap_or(MISSING_CODE);
            if numeric == DIRECT_SUCCESS_CODE {
                return Ok(());
            }
            Err(BusinessError::with_log_id(
                text(code),
                text(envelope.field("msg")),
                String::new(),
                String::new(),
                log_id,
            ))
        }
    }
}

/// Scalar JSON as text: strings as-is, numbers and booleans in their JSON
/// form, anything else empty.
fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// `deserialize_with` helper for payload fields the gateway documents as
/// strings but sometimes sends as numbers.
///
/// Numbers and booleans become their JSON text and `null` becomes empty.
/// Objects and arrays are a decode error, never an empty string.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Object(_) | Value::Array(_) => Err(D::Error::custom(format!(
            "expected a string or scalar, found {value}"
        ))),
        other => Ok(text(Some(&other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(v: Value) -> ResponseEnvelope {
        ResponseEnvelope::from_value(v)
    }

    #[derive(Debug, Default, Deserialize)]
    struct Payload {
        #[serde(default, deserialize_with = "lenient_string")]
        trade_no: String,
        #[serde(default, deserialize_with = "lenient_string")]
        total_amount: String,
    }

    #[test]
    fn test_gateway_success() {
        let e = env(json!({"response": {"code": "10000", "msg": "Success"}}));
        assert_eq!(e.shape(), Shape::GatewayRouted);
        assert!(classify(&e, "log").is_ok());
    }

    #[test]
    fn test_gateway_failure_carries_all_fields() {
        let e = env(json!({"response": {
            "code": "20000", "msg": "x", "sub_code": "TP.SYSTEM_ERROR", "sub_msg": "y"
        }}));
        let err = classify(&e, "app_m_o_1").unwrap_err();
        assert_eq!(err.code, "20000");
        assert_eq!(err.msg, "x");
        assert_eq!(err.sub_code, "TP.SYSTEM_ERROR");
        assert_eq!(err.sub_msg, "y");
        assert_eq!(err.detail, "log_id:app_m_o_1");
    }

    #[test]
    fn test_gateway_numeric_code_compares_as_text() {
        assert!(classify(&env(json!({"response": {"code": 10000}})), "l").is_ok());
        let err = classify(&env(json!({"response": {"code": 40004}})), "l").unwrap_err();
        assert_eq!(err.code, "40004");
    }

    #[test]
    fn test_gateway_missing_code_fails_with_empty_code() {
        let err = classify(&env(json!({"response": {}})), "l").unwrap_err();
        assert_eq!(err.code, "");
    }

    #[test]
    fn test_direct_success_reads_data() {
        let e = env(json!({"code": 0, "msg": "", "data": {"trade_no": "T1", "total_amount": 100}}));
        assert_eq!(e.shape(), Shape::Direct);
        assert!(classify(&e, "l").is_ok());
        let p: Payload = e.decode_payload().unwrap();
        assert_eq!(p.trade_no, "T1");
        assert_eq!(p.total_amount, "100");
    }

    #[test]
    fn test_direct_failure_stringifies_code() {
        let err = classify(&env(json!({"code": 5, "msg": "bad"})), "l").unwrap_err();
        assert_eq!(err.code, "5");
        assert_eq!(err.msg, "bad");
        assert!(err.sub_code.is_empty());
        assert!(err.sub_msg.is_empty());
    }

    #[test]
    fn test_direct_missing_code_is_failure() {
        assert!(classify(&env(json!({"msg": "?"})), "l").is_err());
        assert!(classify(&env(json!({"code": "0"})), "l").is_err());
        assert!(classify(&ResponseEnvelope::default(), "l").is_err());
    }

    #[test]
    fn test_null_response_falls_back_to_direct() {
        let e = env(json!({"response": null, "code": 0, "data": {"trade_no": "D"}}));
        assert_eq!(e.shape(), Shape::Direct);
        assert!(classify(&e, "l").is_ok());
        let p: Payload = e.decode_payload().unwrap();
        assert_eq!(p.trade_no, "D");
    }

    #[test]
    fn test_payload_prefers_response_over_data() {
        let e = env(json!({
            "response": {"code": "10000", "trade_no": "R"},
            "data": {"trade_no": "D"}
        }));
        let p: Payload = e.decode_payload().unwrap();
        assert_eq!(p.trade_no, "R");
    }

    #[test]
    fn test_missing_payload_decodes_defaults() {
        let e = env(json!({"code": 0}));
        let p: Payload = e.decode_payload().unwrap();
        assert!(p.trade_no.is_empty());
    }

    #[test]
    fn test_lenient_string_rejects_nested_values() {
        let e = env(json!({"code": 0, "data": {"trade_no": {"id": "T1"}}}));
        assert!(e.decode_payload::<Payload>().is_err());
        let e = env(json!({"code": 0, "data": {"trade_no": ["T1"]}}));
        assert!(e.decode_payload::<Payload>().is_err());
        let e = env(json!({"code": 0, "data": {"trade_no": null, "total_amount": true}}));
        let p: Payload = e.decode_payload().unwrap();
        assert_eq!(p.trade_no, "");
        assert_eq!(p.total_amount, "true");
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(ResponseEnvelope::parse(b"<html>").is_err());
        assert!(ResponseEnvelope::parse(br#"{"code":0}"#).is_ok());
    }
}
