//! Refund result callback.

use serde::Serialize;

use crate::crypto::PublicVerifier;
use crate::error::PayError;
use crate::notify::{field, parse_notification, CallbackParams, Notification};

/// A verified refund notification.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RefundNotification {
    #[serde(skip)]
    pub params: CallbackParams,
    pub notify_id: String,
    pub sign_type: String,
    pub sign: String,
    pub app_id: String,
    pub event_code: String,
    pub out_refund_no: String,
    pub refund_no: String,
    pub refund_amount: String,
    pub refund_time: String,
    pub merchant_id: String,
    pub refund_status: String,
}

impl RefundNotification {
    pub fn get(&self, key: &str) -> &str {
        self.params.get(key).map(String::as_str).unwrap_or("")
    }
}

impl Notification for RefundNotification {
    const KIND: &'static str = "refund";

    fn from_params(params: CallbackParams) -> Self {
        Self {
            notify_id: field(&params, "notify_id"),
            sign_type: field(&params, "sign_type"),
            sign: field(&params, "sign"),
            app_id: field(&params, "app_id"),
            event_code: field(&params, "event_code"),
            out_refund_no: field(&params, "out_refund_no"),
            refund_no: field(&params, "refund_no"),
            refund_amount: field(&params, "refund_amount"),
            refund_time: field(&params, "refund_time"),
            merchant_id: field(&params, "merchant_id"),
            refund_status: field(&params, "refund_status"),
            params,
        }
    }
}

/// Verify a refund callback against the embedded gateway key.
pub fn refund_notify(raw: &str) -> Result<RefundNotification, PayError> {
    refund_notify_with(raw, PublicVerifier::gateway())
}

/// Verify a refund callback against an explicit key.
pub fn refund_notify_with(
    raw: &str,
    verifier: &PublicVerifier,
) -> Result<RefundNotification, PayError> {
    parse_notification(raw, verifier)
}
