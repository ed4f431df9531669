//! Withdrawal result callback.

use serde::Serialize;

use crate::crypto::PublicVerifier;
use crate::error::PayError;
use crate::notify::{field, parse_notification, CallbackParams, Notification};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WithdrawNotification {
    #[serde(skip)]
    pub params: CallbackParams,
    pub notify_id: String,
    pub sign_type: String,
    pub sign: String,
    pub event_code: String,
    pub merchant_id: String,
    pub out_trade_no: String,
    pub withdraw_trade_no: String,
    pub amount: String,
    pub withdraw_time: String,
    pub withdraw_status: String,
    pub trade_msg: String,
    pub extension: String,
}

impl WithdrawNotification {
    pub fn get(&self, key: &str) -> &str {
        self.params.get(key).map(String::as_str).unwrap_or("")
    }
}

impl Notification for WithdrawNotification {
    const KIND: &'static str = "withdraw";

    fn from_params(params: CallbackParams) -> Self {
        Self {
            notify_id: field(&params, "notify_id"),
            sign_type: field(&params, "sign_type"),
            sign: field(&params, "sign"),
            event_code: field(&params, "event_code"),
            merchant_id: field(&params, "merchant_id"),
            out_trade_no: field(&params, "out_trade_no"),
            withdraw_trade_no: field(&params, "withdraw_trade_no"),
            amount: field(&params, "amount"),
            withdraw_time: field(&params, "withdraw_time"),
            withdraw_status: field(&params, "withdraw_status"),
            trade_msg: field(&params, "trade_msg"),
            extension: field(&params, "extension"),
            params,
        }
    }
}

pub fn withdraw_notify(raw: &str) -> Result<WithdrawNotification, PayError> {
    withdraw_notify_with(raw, PublicVerifier::gateway())
}

pub fn withdraw_notify_with(
    raw: &str,
    verifier: &PublicVerifier,
) -> Result<WithdrawNotification, PayError> {
    parse_notification(raw, verifier)
}
