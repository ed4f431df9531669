//! `tp.refund.create`: refund all or part of a paid trade.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{ExecuteOptions, PayClient};
use crate::config::{Config, METHOD_REFUND_CREATE};
use crate::envelope::{lenient_string, ResponseEnvelope};
use crate::error::PayError;
use crate::request::{first_populated, BizContent, CommonParams, PayRequest, PayResponse};
use crate::validation;

#[derive(Clone, Debug)]
pub struct RefundCreateRequest {
    pub common: CommonParams,
    pub uid: String,
    pub out_order_no: String,
    pub trade_no: String,
    pub out_refund_no: String,
    /// Minor currency units. Must be positive.
    pub refund_amount: i64,
    pub notify_url: String,
    pub risk_info: String,
    pub settlement_product_code: String,
    pub settlement_ext: String,
    pub product_code: String,
    pub payment_type: String,
    pub trans_code: String,
    pub reason: String,
    pub third_refund_account: String,
    extra: BizContent,
}

impl RefundCreateRequest {
    pub fn new(config: Config) -> Self {
        Self {
            common: CommonParams::new(config, METHOD_REFUND_CREATE),
            uid: String::new(),
            out_order_no: String::new(),
            trade_no: String::new(),
            out_refund_no: String::new(),
            refund_amount: 0,
            notify_url: String::new(),
            risk_info: String::new(),
            settlement_product_code: String::new(),
            settlement_ext: String::new(),
            product_code: String::new(),
            payment_type: String::new(),
            trans_code: String::new(),
            reason: String::new(),
            third_refund_account: String::new(),
            extra: BizContent::new(),
        }
    }

    pub fn set_biz_content_kv(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extra.set(key, value);
    }
}

impl PayRequest for RefundCreateRequest {
    fn common(&self) -> &CommonParams {
        &self.common
    }

    fn biz_content(&self) -> BizContent {
        let mut biz = self.extra.clone();
        biz.set("out_order_no", self.out_order_no.as_str())
            .set("trade_no", self.trade_no.as_str())
            .set("merchant_id", self.common.config.merchant_id.as_str())
            .set("uid", self.uid.as_str())
            .set("out_refund_no", self.out_refund_no.as_str())
            .set("refund_amount", self.refund_amount)
            .set("notify_url", self.notify_url.as_str())
            .set("risk_info", self.risk_info.as_str())
            .set("settlement_product_code", self.settlement_product_code.as_str())
            .set("settlement_ext", self.settlement_ext.as_str())
            .set("product_code", self.product_code.as_str())
            .set("payment_type", self.payment_type.as_str())
            .set("trans_code", self.trans_code.as_str())
            .set("reason", self.reason.as_str())
            .set("third_refund_account", self.third_refund_account.as_str());
        biz
    }

    fn validate(&self) -> Result<(), PayError> {
        self.common.validate(METHOD_REFUND_CREATE)?;
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
        validation::check_out_refund_no(&self.out_refund_no)?;
        validation::check_positive("RefundAmount", self.refund_amount)?;
        validation::check_notify_url(&self.notify_url)?;
        validation::check_risk_info(&self.risk_info)?;
        if !self.settlement_ext.is_empty() {
            validation::check_json_object("SettlementExt", &self.settlement_ext)?;
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
pub struct RefundCreateResponse {
    #[serde(skip)]
    envelope: ResponseEnvelope,
    #[serde(deserialize_with = "lenient_string")]
    pub out_order_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub out_refund_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub refund_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub refund_amount: String,
}

impl PayResponse for RefundCreateResponse {
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
    pub async fn refund_create(
        &self,
        req: &RefundCreateRequest,
    ) -> Result<RefundCreateResponse, PayError> {
        let mut resp = RefundCreateResponse::default();
        self.execute(req, &mut resp, &ExecuteOptions::default()).await?;
        Ok(resp)
    }
}
