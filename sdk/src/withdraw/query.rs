//! `tp.withdraw.query`

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{ExecuteOptions, PayClient};
use crate::config::{Config, METHOD_WITHDRAW_QUERY};
use crate::envelope::{lenient_string, ResponseEnvelope};
use crate::error::PayError;
use crate::request::{first_populated, BizContent, CommonParams, PayRequest, PayResponse};
use crate::validation;

#[derive(Clone, Debug)]
pub struct WithdrawQueryRequest {
    pub common: CommonParams,
    pub out_trade_no: String,
    pub withdraw_trade_no: String,
    extra: BizContent,
}

impl WithdrawQueryRequest {
    pub fn new(config: Config) -> Self {
        Self {
            common: CommonParams::new(config, METHOD_WITHDRAW_QUERY),
            out_trade_no: String::new(),
            withdraw_trade_no: String::new(),
            extra: BizContent::new(),
        }
    }

    pub fn set_biz_content_kv(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extra.set(key, value);
    }
}

impl PayRequest for WithdrawQueryRequest {
    fn common(&self) -> &CommonParams {
        &self.common
    }

    fn biz_content(&self) -> BizContent {
        let mut biz = self.extra.clone();
        biz.set("merchant_id", self.common.config.merchant_id.as_str())
            .set("out_trade_no", self.out_trade_no.as_str())
            .set("withdraw_trade_no", self.withdraw_trade_no.as_str());
        biz
    }

    fn validate(&self) -> Result<(), PayError> {
        self.common.validate(METHOD_WITHDRAW_QUERY)?;
        validation::check_one_of(
            "WithdrawTradeNo",
            &self.withdraw_trade_no,
            &self.out_trade_no,
            ("WithdrawTradeNo", "OutTradeNo"),
        )
    }

    /// Unlike the other queries, the gateway number wins here.
    fn log_id(&self) -> String {
        self.common
            .log_id(first_populated(&[&self.withdraw_trade_no, &self.out_trade_no]))
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WithdrawQueryResponse {
    #[serde(skip)]
    envelope: ResponseEnvelope,
    #[serde(deserialize_with = "lenient_string")]
    pub withdraw_trade_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub out_trade_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub merchant_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub uid: String,
    #[serde(deserialize_with = "lenient_string")]
    pub create_time: String,
    #[serde(deserialize_with = "lenient_string")]
    pub trade_time: String,
    #[serde(deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(deserialize_with = "lenient_string")]
    pub trade_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub trade_desc: String,
    #[serde(deserialize_with = "lenient_string")]
    pub amount: String,
    #[serde(deserialize_with = "lenient_string")]
    pub currency: String,
    #[serde(deserialize_with = "lenient_string")]
    pub withdraw_type: String,
    #[serde(deserialize_with = "lenient_string")]
    pub account: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub validity_seconds: String,
    #[serde(rename = "err_code", deserialize_with = "lenient_string")]
    pub error_code: String,
    #[serde(deserialize_with = "lenient_string")]
    pub err_msg: String,
}

impl PayResponse for WithdrawQueryResponse {
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
    pub async fn withdraw_query(
        &self,
        req: &WithdrawQueryRequest,
    ) -> Result<WithdrawQueryResponse, PayError> {
        let mut resp = WithdrawQueryResponse::default();
        self.execute(req, &mut resp, &ExecuteOptions::default()).await?;
        Ok(resp)
    }
}
