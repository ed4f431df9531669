//! Payment result callback.

use serde::Serialize;

use crate::crypto::PublicVerifier;
use crate::error::PayError;
use crate::notify::{field, parse_notification, CallbackParams, Notification};

/// A verified payment notification.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TradeNotification {
    /// Every field as received, including ones not modelled below.
    #[serde(skip)]
    pub params: CallbackParams,
    pub notify_id: String,
    pub sign_type: String,
    pub sign: String,
    pub app_id: String,
    pub event_code: String,
    pub merchant_id: String,
    pub out_order_no: String,
    pub trade_no: String,
    pub total_amount: String,
    pub pay_channel: String,
    pub pay_time: String,
    pub pay_type: String,
    pub trade_status: String,
    pub trade_msg: String,
    pub extension: String,
}

impl TradeNotification {
    pub fn get(&self, key: &str) -> &str {
        self.params.get(key).map(String::as_str).unwrap_or("")
    }
}

impl Notification for TradeNotification {
    const KIND: &'static str = "trade";

    fn from_params(params: CallbackParams) -> Self {
        Self {
            notify_id: field(&params, "notify_id"),
            sign_type: field(&params, "sign_type"),
            sign: field(&params, "sign"),
            app_id: field(&params, "app_id"),
            event_code: field(&params, "event_code"),
            merchant_id: field(&params, "merchant_id"),
            out_order_no: field(&params, "out_order_no"),
            trade_no: field(&params, "trade_no"),
            total_amount: field(&params, "total_amount"),
            pay_channel: field(&params, "pay_channel"),
            pay_time: field(&params, "pay_time"),
            pay_type: field(&params, "pay_type"),
            trade_status: field(&params, "trade_status"),
            trade_msg: field(&params, "trade_msg"),
            extension: field(&params, "extension"),
            params,
        }
    }
}

/// Verify a payment callback against the embedded gateway key.
pub fn trade_notify(raw: &str) -> Result<TradeNotification, PayError> {
    trade_notify_with(raw, PublicVerifier::gateway())
}

/// Verify a payment callback against an explicit key.
pub fn trade_notify_with(
    raw: &str,
    verifier: &PublicVerifier,
) -> Result<TradeNotification, PayError> {
    parse_notification(raw, verifier)
}
