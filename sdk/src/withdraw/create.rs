//! # Withdrawal Creation
//!
//! Two modes, picked by [`WithdrawCreateRequest::with_login`]:
//!
//! - **without login**: the merchant names the user and the amount. The
//!   request is fully validated and registered with the gateway, which
//!   answers with a `withdraw_trade_no`.
//! - **with login**: the user authenticates inside the cashier. Validation
//!   is relaxed and the gateway is not contacted.
//!
//! Either way the response derives the cashier SDK parameters and the H5
//! cashier URL.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{ExecuteOptions, PayClient};
use crate::config::{Config, METHOD_WITHDRAW_CREATE, WITHDRAW_H5_PATH};
use crate::crypto::{sign, EncodingError, ParameterMap};
use crate::envelope::{lenient_string, ResponseEnvelope};
use crate::error::PayError;
use crate::request::{BizContent, CommonParams, PayRequest, PayResponse};
use crate::validation;

/// The only product code the withdrawal cashier accepts.
pub const WITHDRAW_PRODUCT_CODE: &str = "withdraw";

#[derive(Clone, Debug)]
pub struct WithdrawCreateRequest {
    pub common: CommonParams,
    /// The user signs in at the cashier instead of being named here.
    pub with_login: bool,
    pub out_trade_no: String,
    pub uid: String,
    /// Minor currency units. Sent as `amount`. Zero in login mode means the
    /// user picks the amount.
    pub total_amount: i64,
    pub currency: String,
    pub trade_name: String,
    pub trade_desc: String,
    pub product_code: String,
    pub payment_type: String,
    pub trade_time: String,
    pub valid_time: String,
    pub notify_url: String,
    pub return_url: String,
    pub ext_param: String,
    pub settlement_ext: String,
    pub risk_info: String,
    pub account_type: String,
    pub settlement_product_code: String,
    pub trans_code: String,
    /// JSON object text passed through to the cashier, e.g. `{"openid":"..."}`.
    pub exts: String,
    extra: BizContent,
}

impl WithdrawCreateRequest {
    pub fn new(config: Config) -> Self {
        Self {
            common: CommonParams::new(config, METHOD_WITHDRAW_CREATE),
            with_login: false,
            out_trade_no: String::new(),
            uid: String::new(),
            total_amount: 0,
            currency: String::new(),
            trade_name: String::new(),
            trade_desc: String::new(),
            product_code: WITHDRAW_PRODUCT_CODE.to_string(),
            payment_type: String::new(),
            trade_time: String::new(),
            valid_time: String::new(),
            notify_url: String::new(),
            return_url: String::new(),
            ext_param: String::new(),
            settlement_ext: String::new(),
            risk_info: String::new(),
            account_type: String::new(),
            settlement_product_code: String::new(),
            trans_code: String::new(),
            exts: String::new(),
            extra: BizContent::new(),
        }
    }

    pub fn set_biz_content_kv(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extra.set(key, value);
    }

    fn validate_with_login(&self) -> Result<(), PayError> {
        self.common.validate(METHOD_WITHDRAW_CREATE)?;
        validation::check_literal("ProductCode", &self.product_code, WITHDRAW_PRODUCT_CODE)?;
        validation::check_required("PaymentType", &self.payment_type)?;
        validation::check_non_negative("TotalAmount", self.total_amount)?;
        if !self.notify_url.is_empty() {
            validation::check_notify_url(&self.notify_url)?;
        }
        if !self.risk_info.is_empty() {
            validation::check_risk_info(&self.risk_info)?;
        }
        // A fixed amount needs an order number to settle against.
        if self.total_amount > 0 {
            validation::check_required("OutTradeNo", &self.out_trade_no)?;
        }
        if !self.exts.is_empty() {
            validation::check_json_object("Exts", &self.exts)?;
        }
        Ok(())
    }

    fn validate_without_login(&self) -> Result<(), PayError> {
        self.common.validate(METHOD_WITHDRAW_CREATE)?;
        validation::check_positive("TotalAmount", self.total_amount)?;
        validation::check_uid(&self.uid)?;
        validation::check_required("Currency", &self.currency)?;
        validation::check_required("TradeName", &self.trade_name)?;
        validation::check_required("TradeDesc", &self.trade_desc)?;
        validation::check_trade_time(&self.trade_time)?;
        validation::check_valid_time(&self.valid_time)?;
        validation::check_notify_url(&self.notify_url)?;
        validation::check_risk_info(&self.risk_info)?;
        validation::check_literal("ProductCode", &self.product_code, WITHDRAW_PRODUCT_CODE)?;
        validation::check_required("PaymentType", &self.payment_type)?;
        if !self.exts.is_empty() {
            validation::check_json_object("Exts", &self.exts)?;
        }
        if !self.ext_param.is_empty() {
            validation::check_json_object("ExtParam", &self.ext_param)?;
        }
        if !self.settlement_ext.is_empty() {
            validation::check_json_object("SettlementExt", &self.settlement_ext)?;
        }
        Ok(())
    }
}

impl PayRequest for WithdrawCreateRequest {
    fn common(&self) -> &CommonParams {
        &self.common
    }

    fn biz_content(&self) -> BizContent {
        let mut biz = self.extra.clone();
        biz.set("out_trade_no", self.out_trade_no.as_str())
            .set("uid", self.uid.as_str())
            .set("merchant_id", self.common.config.merchant_id.as_str())
            .set("amount", self.total_amount)
            .set("currency", self.currency.as_str())
            .set("trade_name", self.trade_name.as_str())
            .set("trade_desc", self.trade_desc.as_str())
            .set("product_code", self.product_code.as_str())
            .set("payment_type", self.payment_type.as_str())
            .set("trade_time", self.trade_time.as_str())
            .set("valid_time", self.valid_time.as_str())
            .set("notify_url", self.notify_url.as_str())
            .set("return_url", self.return_url.as_str())
            .set("ext_param", self.ext_param.as_str())
            .set("settlement_ext", self.settlement_ext.as_str())
            .set("risk_info", self.risk_info.as_str())
            .set("account_type", self.account_type.as_str())
            .set("settlement_product_code", self.settlement_product_code.as_str());
        biz
    }

    fn validate(&self) -> Result<(), PayError> {
        if self.with_login {
            self.validate_with_login()
        } else {
            self.validate_without_login()
        }
    }

    fn log_id(&self) -> String {
        self.common.log_id(&self.out_trade_no)
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WithdrawCreatePayload {
    #[serde(deserialize_with = "lenient_string")]
    pub withdraw_trade_no: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct WithdrawCreateResponse {
    #[serde(skip)]
    envelope: ResponseEnvelope,
    /// Assigned by the gateway. Empty in login mode.
    pub withdraw_trade_no: String,
    #[serde(skip)]
    request: WithdrawCreateRequest,
}

impl WithdrawCreateResponse {
    fn new(request: WithdrawCreateRequest) -> Self {
        Self {
            envelope: ResponseEnvelope::default(),
            withdraw_trade_no: String::new(),
            request,
        }
    }

    pub fn request(&self) -> &WithdrawCreateRequest {
        &self.request
    }

    /// JSON text the app hands to the withdrawal cashier SDK.
    pub fn cashier_sdk_params(&self) -> Result<String, PayError> {
        let params = self.cashier_params();
        serde_json::to_string(&params.to_json_object())
            .map_err(|e| PayError::Encoding(EncodingError::Json(e)))
    }

    /// The H5 withdrawal cashier URL.
    pub fn cashier_h5_url(&self) -> String {
        let params = self.cashier_params();
        let mut form = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in params.iter() {
            form.append_pair(name, &value.canonical_text());
        }
        format!(
            "{}/{}?{}",
            self.request.common.config.effective_domain(),
            WITHDRAW_H5_PATH,
            form.finish()
        )
    }

    /// Login mode with no fixed amount and no `openid` is the one case the
    /// cashier accepts unsigned.
    fn needs_signature(&self) -> bool {
        let req = &self.request;
        !(req.with_login && req.total_amount == 0 && !req.exts.contains("openid"))
    }

    fn cashier_params(&self) -> ParameterMap {
        let req = &self.request;
        let config = &req.common.config;

        let mut params = ParameterMap::new();
        params.insert("app_id", &config.app_id);
        params.insert("merchant_id", &config.merchant_id);
        params.insert("product_code", &req.product_code);
        params.insert("payment_type", &req.payment_type);
        if !req.out_trade_no.is_empty() {
            params.insert("out_trade_no", &req.out_trade_no);
        }
        if !req.exts.is_empty() {
            params.insert("exts", &req.exts);
        }

        if req.with_login {
            if req.total_amount > 0 {
                params.insert("total_amount", req.total_amount.to_string());
            }
            if !req.trans_code.is_empty() {
                params.insert("trans_code", &req.trans_code);
            }
            if !req.notify_url.is_empty() {
                params.insert("notify_url", &req.notify_url);
            }
        } else {
            params.insert("withdraw_trade_no", &self.withdraw_trade_no);
            params.insert("uid", &req.uid);
        }

        if self.needs_signature() {
            params.insert("sign_type", &req.common.sign_type);
            let signature = sign(&params, &config.app_secret);
            params.insert("sign", signature);
        }

        if !req.return_url.is_empty() {
            params.insert("returnUrl", &req.return_url);
        }
        if !req.risk_info.is_empty() {
            params.insert("risk_info", &req.risk_info);
        }
        params
    }
}

impl PayResponse for WithdrawCreateResponse {
    type Payload = WithdrawCreatePayload;

    fn set_envelope(&mut self, envelope: ResponseEnvelope) {
        self.envelope = envelope;
    }

    fn envelope(&self) -> &ResponseEnvelope {
        &self.envelope
    }

    fn apply(&mut self, payload: WithdrawCreatePayload) {
        self.withdraw_trade_no = payload.withdraw_trade_no;
    }
}

impl PayClient {
    /// Validate the request and, outside login mode, register it with the
    /// gateway.
    pub async fn withdraw_create(
        &self,
        req: WithdrawCreateRequest,
    ) -> Result<WithdrawCreateResponse, PayError> {
        req.validate()?;
        let mut resp = WithdrawCreateResponse::new(req.clone());
        if !req.with_login {
            self.execute(&req, &mut resp, &ExecuteOptions::default()).await?;
        }
        Ok(resp)
    }
}
