//! `tp.trade.query`: look up a trade by merchant order number or gateway
//! trade number.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{ExecuteOptions, PayClient};
use crate::config::{Config, METHOD_TRADE_QUERY};
use crate::envelope::{lenient_string, ResponseEnvelope};
use crate::error::PayError;
use crate::request::{first_populated, BizContent, CommonParams, PayRequest, PayResponse};
use crate::validation;

#[derive(Clone, Debug)]
pub struct TradeQueryRequest {
    pub common: CommonParams,
    pub uid: String,
    pub uid_type: String,
    pub out_order_no: String,
    pub trade_no: String,
    extra: BizContent,
}

impl TradeQueryRequest {
    pub fn new(config: Config) -> Self {
        Self {
            common: CommonParams::new(config, METHOD_TRADE_QUERY),
            uid: String::new(),
            uid_type: String::new(),
            out_order_no: String::new(),
            trade_no: String::new(),
            extra: BizContent::new(),
        }
    }

    /// Add an optional payload field. Standard fields with the same name win.
    pub fn set_biz_content_kv(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extra.set(key, value);
    }
}

impl PayRequest for TradeQueryRequest {
    fn common(&self) -> &CommonParams {
        &self.common
    }

    fn biz_content(&self) -> BizContent {
        let mut biz = self.extra.clone();
        biz.set("merchant_id", self.common.config.merchant_id.as_str())
            .set("uid", self.uid.as_str())
            .set("uid_type", self.uid_type.as_str())
            .set("out_order_no", self.out_order_no.as_str())
            .set("trade_no", self.trade_no.as_str());
        biz
    }

    fn validate(&self) -> Result<(), PayError> {
        self.common.validate(METHOD_TRADE_QUERY)?;
        validation::check_uid(&self.uid)?;
        validation::check_one_of(
            "OutOrderNo",
            &self.out_order_no,
            &self.trade_no,
            ("OutOrderNo", "TradeNo"),
        )?;
        if !self.out_order_no.is_empty() {
            validation::check_out_order_no(&self.out_order_no)?;
        }
        if !self.trade_no.is_empty() {
            validation::check_trade_no(&self.trade_no)?;
        }
        Ok(())
    }

    /// `out_order_no` takes precedence over `trade_no`.
    fn log_id(&self) -> String {
        self.common
            .log_id(first_populated(&[&self.out_order_no, &self.trade_no]))
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TradeQueryResponse {
    #[serde(skip)]
    envelope: ResponseEnvelope,
    #[serde(deserialize_with = "lenient_string")]
    pub trade_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub out_order_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub merchant_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub uid: String,
    #[serde(rename = "m_id", deserialize_with = "lenient_string")]
    pub mid: String,
    #[serde(deserialize_with = "lenient_string")]
    pub create_time: String,
    #[serde(deserialize_with = "lenient_string")]
    pub pay_time: String,
    #[serde(deserialize_with = "lenient_string")]
    pub trade_time: String,
    #[serde(deserialize_with = "lenient_string")]
    pub expire_time: String,
    #[serde(deserialize_with = "lenient_string")]
    pub trade_status: String,
    #[serde(deserialize_with = "lenient_string")]
    pub trade_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub trade_desc: String,
    #[serde(deserialize_with = "lenient_string")]
    pub total_amount: String,
    #[serde(deserialize_with = "lenient_string")]
    pub currency: String,
    #[serde(deserialize_with = "lenient_string")]
    pub pay_channel: String,
    #[serde(deserialize_with = "lenient_string")]
    pub coupon_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub real_amount: String,
    #[serde(deserialize_with = "lenient_string")]
    pub channel_ext: String,
}

impl PayResponse for TradeQueryResponse {
    type Payload = Self;

    fn set_envelope(&mut self, envelope: ResponseEnvelope) {
        self.envelope = envelope;
    }

    fn envelope(&self) -> &ResponseEnvelope {
        &self.envelope
    }

    fn apply(&mut self, payload: Self) {
        let envelope = std::mem::take(&mut self.envelope);
        *self = payload;
        self.envelope = envelope;
    }
}

impl PayClient {
    pub async fn trade_query(&self, req: &TradeQueryRequest) -> Result<TradeQueryResponse, PayError> {
        let mut resp = TradeQueryResponse::default();
        self.execute(req, &mut resp, &ExecuteOptions::default()).await?;
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> TradeQueryRequest {
        let mut req = TradeQueryRequest::new(Config::new("app_1", "secret", "m_1"));
        req.common.timestamp = "1700000000".into();
        req.uid = "u1".into();
        req
    }

    #[test]
    fn test_needs_one_identifier() {
        let err = request().validate().unwrap_err();
        assert!(err.to_string().contains("can't both be blank"));
    }

    #[test]
    fn test_log_id_prefers_out_order_no() {
        let mut req = request();
        req.trade_no = "T1".into();
        assert_eq!(req.log_id(), "app_1_m_1_T1_1700000000");
        req.out_order_no = "O1".into();
        assert_eq!(req.log_id(), "app_1_m_1_O1_1700000000");
    }

    #[test]
    fn test_standard_fields_override_extras() {
        let mut req = request();
        req.out_order_no = "O1".into();
        req.set_biz_content_kv("out_order_no", "spoofed");
        req.set_biz_content_kv("product_code", "pay");
        let biz = req.biz_content();
        assert_eq!(biz.get("out_order_no").unwrap(), "O1");
        assert_eq!(biz.get("product_code").unwrap(), "pay");
    }

    #[test]
    fn test_invalid_trade_no_rejected() {
        let mut req = request();
        req.trade_no = "has space".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_decode_from_gateway_payload() {
        let mut resp = TradeQueryResponse::default();
        resp.set_envelope(ResponseEnvelope::from_value(serde_json::json!({
            "response": {
                "code": "10000", "trade_no": "T1", "m_id": "M", "total_amount": 100,
                "trade_status": "SUCCESS"
            }
        })));
        resp.decode().unwrap();
        assert_eq!(resp.trade_no, "T1");
        assert_eq!(resp.mid, "M");
        assert_eq!(resp.total_amount, "100");
        assert_eq!(resp.trade_status, "SUCCESS");
        assert!(resp.envelope().as_value().get("response").is_some());
    }

    #[test]
    fn test_object_channel_ext_fails_decode() {
        let mut resp = TradeQueryResponse::default();
        resp.set_envelope(ResponseEnvelope::from_value(serde_json::json!({
            "response": {
                "code": "10000", "trade_no": "T1",
                "channel_ext": {"bank": "ICBC", "card": "6222"}
            }
        })));
        assert!(resp.decode().is_err());
        assert_eq!(resp.channel_ext, "");
    }
}
