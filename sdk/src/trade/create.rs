//! # Trade Creation
//!
//! Pre-order creation is local. The merchant's order number stands in for
//! the gateway trade number, so there is nothing to ask the gateway: the
//! request is validated and the signed cashier parameters are derived from
//! it, ready to hand to the front-end that opens the payment UI.
//!
//! The request still implements [`PayRequest`], so it can be encoded (and,
//! for the QR cashier, executed through [`crate::PayClient::execute`]) like
//! every other operation.
//!
//! ## Applet versions
//!
//! | Version | Validation  | `cashier_applet_params()`              |
//! |---------|-------------|----------------------------------------|
//! | `1.0`   | 1.0 rules   | `{"1.0": <1.0 json>}`                  |
//! | `2.0`   | 2.0 rules   | `{"2.0": <2.0 json>}`                  |
//! | `2.0+`  | 2.0 rules   | `{"1.0": <1.0 json>, "2.0": <2.0 json>}` |
//! | `3.0`   | 2.0 rules   | the bare 2.0 json                      |
//!
//! 2.0 rules are the 1.0 rules plus product code, payment type, trade type
//! and valid time.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::{Config, METHOD_TRADE_CONFIRM, METHOD_TRADE_CREATE};
use crate::crypto::{sign, EncodingError, ParamValue, ParameterMap};
use crate::envelope::{lenient_string, ResponseEnvelope};
use crate::error::PayError;
use crate::request::{BizContent, CommonParams, PayRequest, PayResponse};
use crate::validation;

// ---------------------------------------------------------------------------
// Applet version
// ---------------------------------------------------------------------------

/// Which cashier applet the parameters are built for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AppletVersion {
    V1,
    #[default]
    V2,
    /// Both 1.0 and 2.0 parameter sets.
    V2Plus,
    /// The 2.0 parameter set, without the version wrapper.
    V3,
}

impl AppletVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            AppletVersion::V1 => "1.0",
            AppletVersion::V2 => "2.0",
            AppletVersion::V2Plus => "2.0+",
            AppletVersion::V3 => "3.0",
        }
    }

    fn needs_v2_rules(self) -> bool {
        !matches!(self, AppletVersion::V1)
    }
}

impl FromStr for AppletVersion {
    type Err = PayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.0" => Ok(AppletVersion::V1),
            "2.0" => Ok(AppletVersion::V2),
            "2.0+" => Ok(AppletVersion::V2Plus),
            "3.0" => Ok(AppletVersion::V3),
            _ => Err(PayError::invalid_param(
                "AppletVersion",
                "can only be 1.0, 2.0, 2.0+ or 3.0",
            )),
        }
    }
}

impl fmt::Display for AppletVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct TradeCreateRequest {
    pub common: CommonParams,
    pub applet_version: AppletVersion,
    pub out_order_no: String,
    pub uid: String,
    pub uid_type: String,
    /// Minor currency units.
    pub total_amount: i64,
    pub currency: String,
    /// Cashier trade type, e.g. `H5`.
    pub trade_type: String,
    pub subject: String,
    pub body: String,
    pub product_code: String,
    pub payment_type: String,
    /// The 1.0 cashier's `pay_type`.
    pub pay_type: String,
    pub trade_time: String,
    pub valid_time: String,
    pub notify_url: String,
    pub risk_info: String,
    /// Opaque text placed under `params.url` for the 1.0 cashier.
    pub params: String,
    pub pay_channel: String,
    pub service_fee: String,
    pub limit_pay: String,
    pub alipay_url: String,
    pub wx_url: String,
    pub wx_type: String,
    extra: BizContent,
}

impl TradeCreateRequest {
    pub fn new(config: Config) -> Self {
        Self {
            common: CommonParams::new(config, METHOD_TRADE_CREATE),
            applet_version: AppletVersion::default(),
            out_order_no: String::new(),
            uid: String::new(),
            uid_type: String::new(),
            total_amount: 0,
            currency: String::new(),
            trade_type: String::new(),
            subject: String::new(),
            body: String::new(),
            product_code: String::new(),
            payment_type: String::new(),
            pay_type: String::new(),
            trade_time: String::new(),
            valid_time: String::new(),
            notify_url: String::new(),
            risk_info: String::new(),
            params: String::new(),
            pay_channel: String::new(),
            service_fee: String::new(),
            limit_pay: String::new(),
            alipay_url: String::new(),
            wx_url: String::new(),
            wx_type: String::new(),
            extra: BizContent::new(),
        }
    }

    pub fn set_biz_content_kv(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extra.set(key, value);
    }

    fn validate_v1(&self) -> Result<(), PayError> {
        self.common.validate(METHOD_TRADE_CREATE)?;
        validation::check_out_order_no(&self.out_order_no)?;
        validation::check_uid(&self.uid)?;
        validation::check_positive("TotalAmount", self.total_amount)?;
        validation::check_required("Currency", &self.currency)?;
        validation::check_required("Subject", &self.subject)?;
        validation::check_required("Body", &self.body)?;
        validation::check_trade_time(&self.trade_time)?;
        validation::check_notify_url(&self.notify_url)?;
        validation::check_risk_info(&self.risk_info)?;
        Ok(())
    }

    fn validate_v2(&self) -> Result<(), PayError> {
        self.validate_v1()?;
        validation::check_required("ProductCode", &self.product_code)?;
        validation::check_required("PaymentType", &self.payment_type)?;
        validation::check_required("TradeType", &self.trade_type)?;
        validation::check_valid_time(&self.valid_time)?;
        Ok(())
    }
}

impl PayRequest for TradeCreateRequest {
    fn common(&self) -> &CommonParams {
        &self.common
    }

    fn biz_content(&self) -> BizContent {
        let mut biz = self.extra.clone();
        biz.set("out_order_no", self.out_order_no.as_str())
            .set("uid", self.uid.as_str())
            .set("uid_type", self.uid_type.as_str())
            .set("merchant_id", self.common.config.merchant_id.as_str())
            .set("total_amount", self.total_amount)
            .set("currency", self.currency.as_str())
            .set("subject", self.subject.as_str())
            .set("body", self.body.as_str())
            .set("product_code", self.product_code.as_str())
            .set("payment_type", self.payment_type.as_str())
            .set("trade_time", self.trade_time.as_str())
            .set("valid_time", self.valid_time.as_str())
            .set("notify_url", self.notify_url.as_str())
            .set("service_fee", self.service_fee.as_str())
            .set("risk_info", self.risk_info.as_str());
        biz
    }

    fn validate(&self) -> Result<(), PayError> {
        if self.applet_version.needs_v2_rules() {
            self.validate_v2()
        } else {
            self.validate_v1()
        }
    }

    fn log_id(&self) -> String {
        self.common.log_id(&self.out_order_no)
    }
}

/// Validate a pre-order and derive its cashier parameters. No network call.
pub fn trade_create(req: TradeCreateRequest) -> Result<TradeCreateResponse, PayError> {
    req.validate()?;
    Ok(TradeCreateResponse::new(req))
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Fields the QR cashier endpoint returns under `data`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TradeCreatePayload {
    #[serde(deserialize_with = "lenient_string")]
    pub trade_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub url: String,
}

#[derive(Clone, Debug)]
pub struct TradeCreateResponse {
    envelope: ResponseEnvelope,
    pub trade_no: String,
    /// QR cashier URL, present once a gateway reply has been decoded.
    pub url: String,
    request: TradeCreateRequest,
    cashier_timestamp: String,
}

impl TradeCreateResponse {
    fn new(request: TradeCreateRequest) -> Self {
        Self {
            envelope: ResponseEnvelope::default(),
            trade_no: String::new(),
            url: String::new(),
            request,
            cashier_timestamp: Utc::now().timestamp().to_string(),
        }
    }

    /// Pin the timestamp written into the cashier parameters.
    pub fn with_cashier_timestamp(mut self, unix_seconds: i64) -> Self {
        self.cashier_timestamp = unix_seconds.to_string();
        self
    }

    pub fn request(&self) -> &TradeCreateRequest {
        &self.request
    }

    /// JSON text the front-end passes to the cashier applet.
    pub fn cashier_applet_params(&self) -> Result<String, PayError> {
        let mut by_version = Map::new();
        match self.request.applet_version {
            AppletVersion::V1 => {
                by_version.insert("1.0".into(), Value::String(self.applet_params_v1()?));
            }
            AppletVersion::V2 => {
                by_version.insert("2.0".into(), Value::String(self.applet_params_v2()?));
            }
            AppletVersion::V2Plus => {
                by_version.insert("1.0".into(), Value::String(self.applet_params_v1()?));
                by_version.insert("2.0".into(), Value::String(self.applet_params_v2()?));
            }
            AppletVersion::V3 => return self.applet_params_v2(),
        }
        to_json(&by_version)
    }

    /// The QR cashier URL from a decoded gateway reply. Empty until then.
    pub fn cashier_qr_params(&self) -> &str {
        &self.url
    }

    fn applet_params_v1(&self) -> Result<String, PayError> {
        let req = &self.request;
        let url_params = to_json(&json!({ "url": req.params }))?;

        let mut fields = ParameterMap::new();
        fields.insert("app_id", &req.common.config.app_id);
        fields.insert("sign_type", &req.common.sign_type);
        fields.insert("timestamp", &self.cashier_timestamp);
        fields.insert("trade_no", &req.out_order_no);
        fields.insert("merchant_id", &req.common.config.merchant_id);
        fields.insert("uid", &req.uid);
        fields.insert("total_amount", req.total_amount);
        fields.insert("params", ParamValue::JsonText(url_params));

        let signature = sign(&fields, &req.common.config.app_secret);
        fields.insert("sign", signature);

        fields.insert("method", METHOD_TRADE_CONFIRM);
        fields.insert("pay_type", &req.pay_type);
        fields.insert("pay_channel", &req.pay_channel);
        fields.insert("risk_info", &req.risk_info);

        to_json(&fields.to_json_object())
    }

    fn applet_params_v2(&self) -> Result<String, PayError> {
        let req = &self.request;

        let mut fields = ParameterMap::new();
        fields.insert("app_id", &req.common.config.app_id);
        fields.insert("sign_type", &req.common.sign_type);
        fields.insert("merchant_id", &req.common.config.merchant_id);
        fields.insert("timestamp", &self.cashier_timestamp);
        fields.insert("total_amount", req.total_amount.to_string());

        let optional = [
            ("uid", &req.uid),
            ("out_order_no", &req.out_order_no),
            ("notify_url", &req.notify_url),
            ("trade_type", &req.trade_type),
            ("product_code", &req.product_code),
            ("payment_type", &req.payment_type),
            ("subject", &req.subject),
            ("body", &req.body),
            ("trade_time", &req.trade_time),
            ("valid_time", &req.valid_time),
            ("currency", &req.currency),
            ("version", &req.common.version),
            ("alipay_url", &req.alipay_url),
            ("wx_url", &req.wx_url),
            ("wx_type", &req.wx_type),
            ("limit_pay", &req.limit_pay),
        ];
        for (name, value) in optional {
            if !value.is_empty() {
                fields.insert(name, value);
            }
        }

        let signature = sign(&fields, &req.common.config.app_secret);
        fields.insert("sign", signature);

        if !req.risk_info.is_empty() {
            fields.insert("risk_info", &req.risk_info);
        }

        to_json(&fields.to_json_object())
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, PayError> {
    serde_json::to_string(value).map_err(|e| PayError::Encoding(EncodingError::Json(e)))
}

impl PayResponse for TradeCreateResponse {
    type Payload = TradeCreatePayload;

    fn set_envelope(&mut self, envelope: ResponseEnvelope) {
        self.envelope = envelope;
    }

    fn envelope(&self) -> &ResponseEnvelope {
        &self.envelope
    }

    fn apply(&mut self, payload: TradeCreatePayload) {
        self.trade_no = payload.trade_no;
        self.url = payload.url;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::md5_hex;

    const TS: i64 = 1_700_000_123;

    fn request(version: AppletVersion) -> TradeCreateRequest {
        let mut req = TradeCreateRequest::new(Config::new("app_1", "secret", "m_1"));
        req.common.timestamp = "1700000000".into();
        req.applet_version = version;
        req.out_order_no = "order_1".into();
        req.uid = "u1".into();
        req.total_amount = 100;
        req.currency = "CNY".into();
        req.subject = "subject".into();
        req.body = "body".into();
        req.trade_time = "1700000000".into();
        req.valid_time = "3600".into();
        req.notify_url = "https://merchant.example.com/notify".into();
        req.risk_info = r#"{"ip":"127.0.0.1"}"#.into();
        req.product_code = "pay".into();
        req.payment_type = "direct".into();
        req.trade_type = "H5".into();
        req.pay_type = "ALIPAY_NO_SIGN".into();
        req.pay_channel = "ALIPAY_NO_SIGN".into();
        req.params = "https://m.example.com/pay".into();
        req
    }

    fn parse(text: &str) -> Map<String, Value> {
        serde_json::from_str(text).unwrap()
    }

    fn created(version: AppletVersion) -> TradeCreateResponse {
        trade_create(request(version))
            .unwrap()
            .with_cashier_timestamp(TS)
    }

    #[test]
    fn test_applet_version_parsing() {
        assert_eq!("2.0+".parse::<AppletVersion>().unwrap(), AppletVersion::V2Plus);
        assert_eq!(AppletVersion::default().as_str(), "2.0");
        let err = "4.0".parse::<AppletVersion>().unwrap_err();
        assert!(err.to_string().contains("AppletVersion"));
    }

    #[test]
    fn test_v1_rules_do_not_need_product_code() {
        let mut req = request(AppletVersion::V1);
        req.product_code.clear();
        req.trade_type.clear();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_v2_rules_need_product_code() {
        for version in [AppletVersion::V2, AppletVersion::V2Plus, AppletVersion::V3] {
            let mut req = request(version);
            req.product_code.clear();
            let err = trade_create(req).unwrap_err();
            assert!(err.to_string().contains("ProductCode"), "{version}");
        }
    }

    #[test]
    fn test_v1_rejects_bad_risk_info() {
        let mut req = request(AppletVersion::V1);
        req.risk_info = "ip=1".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_v1_params_are_signed_then_extended() {
        let resp = created(AppletVersion::V1);
        let outer = parse(&resp.cashier_applet_params().unwrap());
        assert_eq!(outer.len(), 1);
        let inner = parse(outer["1.0"].as_str().unwrap());

        assert_eq!(inner["method"], "tp.trade.confirm");
        assert_eq!(inner["trade_no"], "order_1");
        assert_eq!(inner["total_amount"], 100);
        assert_eq!(inner["timestamp"], TS.to_string());
        assert_eq!(inner["params"], r#"{"url":"https://m.example.com/pay"}"#);

        let signed = format!(
            "app_id=app_1&merchant_id=m_1&params={}&sign_type=MD5&timestamp={}&total_amount=100&trade_no=order_1&uid=u1secret",
            r#"{"url":"https://m.example.com/pay"}"#, TS
        );
        assert_eq!(inner["sign"], md5_hex(signed.as_bytes()));
    }

    #[test]
    fn test_v2_params_skip_empty_fields_and_sign_amount_as_text() {
        let mut req = request(AppletVersion::V2);
        req.wx_url.clear();
        req.alipay_url = "https://alipay.example.com".into();
        let resp = trade_create(req).unwrap().with_cashier_timestamp(TS);

        let outer = parse(&resp.cashier_applet_params().unwrap());
        let inner = parse(outer["2.0"].as_str().unwrap());

        assert_eq!(inner["total_amount"], "100");
        assert_eq!(inner["version"], "1.0");
        assert!(!inner.contains_key("wx_url"));
        assert_eq!(inner["alipay_url"], "https://alipay.example.com");
        assert_eq!(inner["risk_info"], r#"{"ip":"127.0.0.1"}"#);

        // risk_info is appended after signing.
        let unsigned: ParameterMap = inner
            .iter()
            .filter(|(k, _)| k.as_str() != "sign" && k.as_str() != "risk_info")
            .map(|(k, v)| (k.clone(), v.as_str().unwrap().to_string()))
            .collect();
        assert_eq!(inner["sign"], sign(&unsigned, "secret"));
    }

    #[test]
    fn test_v2_plus_returns_both() {
        let outer = parse(&created(AppletVersion::V2Plus).cashier_applet_params().unwrap());
        assert!(outer.contains_key("1.0"));
        assert!(outer.contains_key("2.0"));
    }

    #[test]
    fn test_v3_returns_bare_v2_json() {
        let v3 = created(AppletVersion::V3).cashier_applet_params().unwrap();
        let bare = parse(&v3);
        assert!(bare.contains_key("sign"));
        assert!(!bare.contains_key("2.0"));
    }

    #[test]
    fn test_cashier_params_are_deterministic() {
        let a = created(AppletVersion::V2Plus).cashier_applet_params().unwrap();
        let b = created(AppletVersion::V2Plus).cashier_applet_params().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_log_id_uses_out_order_no() {
        assert_eq!(
            request(AppletVersion::V2).log_id(),
            "app_1_m_1_order_1_1700000000"
        );
    }

    #[test]
    fn test_qr_params_come_from_data() {
        let mut resp = created(AppletVersion::V2);
        assert_eq!(resp.cashier_qr_params(), "");
        resp.set_envelope(ResponseEnvelope::from_value(json!({
            "code": 0, "msg": "",
            "data": {"trade_no": "T9", "url": "https://tp-pay.snssdk.com/cashdesk/qr?trade_no=T9"}
        })));
        resp.decode().unwrap();
        assert_eq!(resp.trade_no, "T9");
        assert!(resp.cashier_qr_params().ends_with("trade_no=T9"));
    }
}
