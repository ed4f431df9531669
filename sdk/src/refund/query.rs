//! `tp.refund.query`

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{ExecuteOptions, PayClient};
use crate::config::{Config, METHOD_REFUND_QUERY};
use crate::envelope::{lenient_string, ResponseEnvelope};
use crate::error::PayError;
use crate::request::{first_populated, BizContent, CommonParams, PayRequest, PayResponse};
use crate::validation;

#[derive(Clone, Debug)]
pub struct RefundQueryRequest {
    pub common: CommonParams,
    pub uid: String,
    pub out_refund_no: String,
    pub refund_no: String,
    extra: BizContent,
}

impl RefundQueryRequest {
    pub fn new(config: Config) -> Self {
        Self {
            common: CommonParams::new(config, METHOD_REFUND_QUERY),
            uid: String::new(),
            out_refund_no: String::new(),
            refund_no: String::new(),
            extra: BizContent::new(),
        }
    }

    pub fn set_biz_content_kv(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extra.set(key, value);
    }
}

impl PayRequest for RefundQueryRequest {
    fn common(&self) -> &CommonParams {
        &self.common
    }

    fn biz_content(&self) -> BizContent {
        let mut biz = self.extra.clone();
        biz.set("out_refund_no", self.out_refund_no.as_str())
            .set("refund_no", self.refund_no.as_str())
            .set("merchant_id", self.common.config.merchant_id.as_str())
            .set("uid", self.uid.as_str());
        biz
    }

    fn validate(&self) -> Result<(), PayError> {
        self.common.validate(METHOD_REFUND_QUERY)?;
        validation::check_uid(&self.uid)?;
        validation::check_one_of(
            "OutRefundNo",
            &self.out_refund_no,
            &self.refund_no,
            ("OutRefundNo", "RefundNo"),
        )?;
        if !self.out_refund_no.is_empty() {
            validation::check_out_refund_no(&self.out_refund_no)?;
        }
        if !self.refund_no.is_empty() {
            validation::check_refund_no(&self.refund_no)?;
        }
        Ok(())
    }

    /// `out_refund_no` takes precedence over `refund_no`.
    fn log_id(&self) -> String {
        self.common
            .log_id(first_populated(&[&self.out_refund_no, &self.refund_no]))
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RefundQueryResponse {
    #[serde(skip)]
    envelope: ResponseEnvelope,
    #[serde(deserialize_with = "lenient_string")]
    pub out_refund_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub refund_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub trade_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub refund_amount: String,
    #[serde(deserialize_with = "lenient_string")]
    pub refund_status: String,
    #[serde(deserialize_with = "lenient_string")]
    pub channel_ext: String,
}

impl PayResponse for RefundQueryResponse {
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
    pub async fn refund_query(
        &self,
        req: &RefundQueryRequest,
    ) -> Result<RefundQueryResponse, PayError> {
        let mut resp = RefundQueryResponse::default();
        self.execute(req, &mut resp, &ExecuteOptions::default()).await?;
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RefundQueryRequest {
        let mut req = RefundQueryRequest::new(Config::new("app_1", "secret", "m_1"));
        req.common.timestamp = "1700000000".into();
        req.uid = "u1".into();
        req
    }

    #[test]
    fn test_log_id_prefers_out_refund_no() {
        let mut req = request();
        req.refund_no = "RN".into();
        assert_eq!(req.log_id(), "app_1_m_1_RN_1700000000");
        req.out_refund_no = "ORN".into();
        assert_eq!(req.log_id(), "app_1_m_1_ORN_1700000000");
    }

    #[test]
    fn test_needs_one_identifier() {
        assert!(request().validate().is_err());
        let mut req = request();
        req.refund_no = "RN".into();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_refund_no_allows_64_chars() {
        let mut req = request();
        req.refund_no = "r".repeat(64);
        assert!(req.validate().is_ok());
        req.out_refund_no = "r".repeat(33);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_decode_direct_payload() {
        let mut resp = RefundQueryResponse::default();
        resp.set_envelope(ResponseEnvelope::from_value(serde_json::json!({
            "code": 0,
            "data": {"refund_no": "RN", "refund_amount": 30, "refund_status": "PROCESSING"}
        })));
        resp.decode().unwrap();
        assert_eq!(resp.refund_no, "RN");
        assert_eq!(resp.refund_amount, "30");
        assert_eq!(resp.refund_status, "PROCESSING");
        assert!(resp.out_refund_no.is_empty());
    }
}
