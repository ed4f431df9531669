//! # Request / Response Contract
//!
//! Every gateway operation is a pair: a request that knows how to validate,
//! sign and serialize itself, and a response that is filled in from a
//! classified [`ResponseEnvelope`].
//!
//! The signed body is always the same nine fields:
//!
//! ```text
//! app_id, method, format, charset, sign_type, timestamp, version, biz_content
//!   -> sign = md5(canonical(...) + app_secret)
//! body = form_urlencode(app_id, biz_content, charset, format, method,
//!                       sign, sign_type, timestamp, version)
//! ```
//!
//! `biz_content` is the operation's business payload serialized as one
//! compact JSON object with sorted keys. It is signed as a single opaque
//! string and never flattened into top-level form fields.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{
    Config, CHARSET_UTF8, DEFAULT_VERSION, FORMAT_JSON, GATEWAY_PATH, GATEWAY_PATH_U,
    SIGN_TYPE_MD5,
};
use crate::crypto::{sign, EncodingError, ParamValue, ParameterMap};
use crate::envelope::ResponseEnvelope;
use crate::error::PayError;
use crate::validation;

// ---------------------------------------------------------------------------
// Common header fields
// ---------------------------------------------------------------------------

/// The header fields every request carries, plus the merchant config.
///
/// `new` fills in the only values the gateway accepts today. They stay
/// public so a caller can override them, and validation will tell them if
/// the override is not accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommonParams {
    pub config: Config,
    pub method: String,
    pub format: String,
    pub charset: String,
    pub sign_type: String,
    /// Unix seconds, as text.
    pub timestamp: String,
    pub version: String,
    /// Gateway path under the domain. [`GATEWAY_PATH`] unless the merchant
    /// is routed through [`GATEWAY_PATH_U`].
    pub path: String,
}

impl CommonParams {
    pub fn new(config: Config, method: &str) -> Self {
        Self {
            config,
            method: method.to_string(),
            format: FORMAT_JSON.to_string(),
            charset: CHARSET_UTF8.to_string(),
            sign_type: SIGN_TYPE_MD5.to_string(),
            timestamp: Utc::now().timestamp().to_string(),
            version: DEFAULT_VERSION.to_string(),
            path: GATEWAY_PATH.to_string(),
        }
    }

    /// Checks shared by every operation: method, fixed header values,
    /// timestamp, version and the merchant credentials.
    pub fn validate(&self, expected_method: &str) -> Result<(), PayError> {
        validation::check_method(expected_method, &self.method)?;
        validation::check_format(&self.format)?;
        validation::check_charset(&self.charset)?;
        validation::check_sign_type(&self.sign_type)?;
        validation::check_timestamp(&self.timestamp)?;
        validation::check_version(&self.version)?;
        validation::check_app_id(&self.config.app_id)?;
        validation::check_merchant_id(&self.config.merchant_id)?;
        validation::check_app_secret(&self.config.app_secret)?;
        Ok(())
    }

    /// Send through [`GATEWAY_PATH_U`] instead of the default path.
    pub fn use_alternate_gateway(&mut self) -> &mut Self {
        self.path = GATEWAY_PATH_U.to_string();
        self
    }

    pub fn url(&self) -> String {
        format!("{}/{}", self.config.effective_domain(), self.path)
    }

    /// `{app_id}_{merchant_id}_{id}_{timestamp}`
    pub fn log_id(&self, id: &str) -> String {
        format!(
            "{}_{}_{}_{}",
            self.config.app_id, self.config.merchant_id, id, self.timestamp
        )
    }

    /// The signable top-level fields for a given serialized payload.
    pub fn signable(&self, biz_content: String) -> ParameterMap {
        let mut fields = ParameterMap::new();
        fields.insert("app_id", &self.config.app_id);
        fields.insert("method", &self.method);
        fields.insert("format", &self.format);
        fields.insert("charset", &self.charset);
        fields.insert("sign_type", &self.sign_type);
        fields.insert("timestamp", &self.timestamp);
        fields.insert("version", &self.version);
        fields.insert("biz_content", ParamValue::JsonText(biz_content));
        fields
    }
}

/// Returns the first non-empty id, or `""`.
pub(crate) fn first_populated<'a>(ids: &[&'a str]) -> &'a str {
    ids.iter().copied().find(|id| !id.is_empty()).unwrap_or("")
}

// ---------------------------------------------------------------------------
// Business payload
// ---------------------------------------------------------------------------

/// The `biz_content` JSON object. Keys are kept sorted, so serializing the
/// same content always yields the same text whatever order it was built in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BizContent(BTreeMap<String, Value>);

impl BizContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compact JSON text with sorted keys.
    pub fn to_json_text(&self) -> Result<String, EncodingError> {
        Ok(serde_json::to_string(&self.0)?)
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// What every operation's request provides to the executor.
pub trait PayRequest: Send + Sync {
    fn common(&self) -> &CommonParams;

    /// The business payload. Caller-supplied extra keys go in first so the
    /// operation's own fields take precedence.
    fn biz_content(&self) -> BizContent;

    /// Local checks. Nothing is signed or sent if this fails.
    fn validate(&self) -> Result<(), PayError>;

    /// Identifier sent as `X-Tt-Logid` and quoted in business errors.
    fn log_id(&self) -> String;

    fn url(&self) -> String {
        self.common().url()
    }

    /// The nine body fields, `sign` included.
    fn signed_params(&self) -> Result<ParameterMap, PayError> {
        let common = self.common();
        let biz_content = self.biz_content().to_json_text()?;
        let mut fields = common.signable(biz_content);
        let signature = sign(&fields, &common.config.app_secret);
        fields.insert("sign", signature);
        Ok(fields)
    }

    /// The form-urlencoded POST body.
    fn encode(&self) -> Result<String, PayError> {
        let fields = self.signed_params()?;
        let mut form = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in fields.iter() {
            form.append_pair(name, &value.canonical_text());
        }
        Ok(form.finish())
    }
}

/// What every operation's response accepts from the executor.
pub trait PayResponse: Send {
    /// The typed shape of the classified payload.
    type Payload: DeserializeOwned;

    fn set_envelope(&mut self, envelope: ResponseEnvelope);

    fn envelope(&self) -> &ResponseEnvelope;

    /// Copy a decoded payload into the response.
    fn apply(&mut self, payload: Self::Payload);

    /// Decode the payload from `response` or `data`, whichever the
    /// envelope's shape dictates.
    fn decode(&mut self) -> Result<(), serde_json::Error> {
        let payload = self.envelope().decode_payload::<Self::Payload>()?;
        self.apply(payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{encode, md5_hex};
    use serde_json::json;

    fn common() -> CommonParams {
        let mut c = CommonParams::new(
            Config::new("app_1", "secret", "m_1"),
            crate::config::METHOD_TRADE_QUERY,
        );
        c.timestamp = "1700000000".into();
        c
    }

    struct Probe {
        common: CommonParams,
        biz: BizContent,
    }

    impl PayRequest for Probe {
        fn common(&self) -> &CommonParams {
            &self.common
        }
        fn biz_content(&self) -> BizContent {
            self.biz.clone()
        }
        fn validate(&self) -> Result<(), PayError> {
            self.common.validate(crate::config::METHOD_TRADE_QUERY)
        }
        fn log_id(&self) -> String {
            self.common.log_id("x")
        }
    }

    #[test]
    fn test_defaults() {
        let c = common();
        assert_eq!(c.format, "JSON");
        assert_eq!(c.charset, "utf-8");
        assert_eq!(c.sign_type, "MD5");
        assert_eq!(c.version, "1.0");
        assert_eq!(c.url(), "https://tp-pay.snssdk.com/gateway");
        assert!(c.validate(crate::config::METHOD_TRADE_QUERY).is_ok());
    }

    #[test]
    fn test_alternate_gateway_path() {
        let mut c = common();
        c.use_alternate_gateway();
        assert_eq!(c.url(), "https://tp-pay.snssdk.com/gateway-u");
    }

    #[test]
    fn test_fresh_timestamp_is_unix_seconds() {
        let c = CommonParams::new(Config::new("a", "b", "c"), "m");
        assert!(crate::validation::check_timestamp(&c.timestamp).is_ok());
    }

    #[test]
    fn test_wrong_method_rejected() {
        let err = common()
            .validate(crate::config::METHOD_REFUND_QUERY)
            .unwrap_err();
        assert!(err.to_string().contains("Method"));
    }

    #[test]
    fn test_log_id_format() {
        assert_eq!(common().log_id("ord"), "app_1_m_1_ord_1700000000");
    }

    #[test]
    fn test_first_populated() {
        assert_eq!(first_populated(&["", "b"]), "b");
        assert_eq!(first_populated(&["a", "b"]), "a");
        assert_eq!(first_populated(&["", ""]), "");
    }

    #[test]
    fn test_biz_content_is_sorted_and_compact() {
        let mut biz = BizContent::new();
        biz.set("z", "last").set("a", 1).set("m", json!({"y": 1, "b": 2}));
        assert_eq!(
            biz.to_json_text().unwrap(),
            r#"{"a":1,"m":{"b":2,"y":1},"z":"last"}"#
        );
    }

    #[test]
    fn test_signed_params_cover_payload_as_one_field() {
        let mut biz = BizContent::new();
        biz.set("out_order_no", "o1").set("merchant_id", "m_1");
        let probe = Probe { common: common(), biz };

        let signed = probe.signed_params().unwrap();
        assert_eq!(signed.len(), 9);
        assert!(!signed.contains("out_order_no"));

        let mut unsigned = signed.clone();
        let sig = unsigned.remove("sign").unwrap();
        let expected = md5_hex(encode(&unsigned).with_secret("secret").as_bytes());
        assert_eq!(sig.canonical_text(), expected);
    }

    #[test]
    fn test_encode_is_form_urlencoded() {
        let mut biz = BizContent::new();
        biz.set("subject", "a b&c");
        let probe = Probe { common: common(), biz };
        let body = probe.encode().unwrap();

        assert!(body.starts_with("app_id=app_1&biz_content="));
        let decoded: BTreeMap<String, String> = url::form_urlencoded::parse(body.as_bytes())
            .into_owned()
            .collect();
        assert_eq!(decoded["biz_content"], r#"{"subject":"a b&c"}"#);
        assert_eq!(decoded["method"], "tp.trade.query");
        assert_eq!(decoded["sign"].len(), 32);
    }
}
