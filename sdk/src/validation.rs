//! Local parameter checks.
//!
//! Every request runs these before anything is signed or sent. A failure is
//! a [`PayError::InvalidParam`] naming the field the way the gateway
//! documentation does (`AppId`, `OutOrderNo`, ...).

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::config::{CHARSET_UTF8, FORMAT_JSON, SIGN_TYPE_MD5};
use crate::error::PayError;

pub const MSG_ID: &str =
    "can only contain digits, letters and special characters including '-' and '_'";
pub const MSG_URL: &str =
    "can only be one of the three forms: rpc: [abc:abc]; http: [http://host]; https: [https://host]";
pub const MSG_JSON: &str = "must be a valid json object string";
pub const MSG_NUMBER: &str = "can only contain digits";
pub const MSG_REQUIRED: &str = "is required";
pub const MSG_VERSION: &str = "must be the form of: a.b, eg. 1.0";
pub const MSG_POSITIVE: &str = "must be a positive number";

static SHORT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-zA-Z_-]{1,32}$").expect("short id pattern")
});

static LONG_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-zA-Z_-]{1,64}$").expect("long id pattern")
});

static VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]\.[0-9]$").expect("version pattern")
});

static UNIX_SECONDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{1,19}$").expect("timestamp pattern")
});

// Either an rpc-style `name:target`, or an http(s) URL.
static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(.*):(.*)$|(https|http)://[-A-Za-z0-9+&@#/%?=~_|!:,.;]+[-A-Za-z0-9+&@#/%=~_|]",
    )
    .expect("url pattern")
});

fn matches(re: &Regex, field: &'static str, value: &str, msg: &str) -> Result<(), PayError> {
    if re.is_match(value) {
        Ok(())
    } else {
        Err(PayError::invalid_param(field, msg))
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

pub fn check_app_id(app_id: &str) -> Result<(), PayError> {
    matches(&SHORT_ID, "AppId", app_id, MSG_ID)
}

pub fn check_merchant_id(merchant_id: &str) -> Result<(), PayError> {
    matches(&SHORT_ID, "MerchantId", merchant_id, MSG_ID)
}

pub fn check_app_secret(app_secret: &str) -> Result<(), PayError> {
    check_required("AppSecret", app_secret)
}

pub fn check_uid(uid: &str) -> Result<(), PayError> {
    matches(&SHORT_ID, "Uid", uid, MSG_ID)
}

// ---------------------------------------------------------------------------
// Common header fields
// ---------------------------------------------------------------------------

pub fn check_method(expected: &str, method: &str) -> Result<(), PayError> {
    if method == expected {
        Ok(())
    } else {
        Err(PayError::invalid_param("Method", format!("must be {expected}")))
    }
}

pub fn check_sign_type(sign_type: &str) -> Result<(), PayError> {
    if sign_type == SIGN_TYPE_MD5 {
        Ok(())
    } else {
        Err(PayError::invalid_param(
            "SignType",
            "only MD5 is supported in current version",
        ))
    }
}

pub fn check_format(format: &str) -> Result<(), PayError> {
    if format == FORMAT_JSON {
        Ok(())
    } else {
        Err(PayError::invalid_param(
            "Format",
            "only JSON is supported in current version",
        ))
    }
}

pub fn check_charset(charset: &str) -> Result<(), PayError> {
    if charset == CHARSET_UTF8 {
        Ok(())
    } else {
        Err(PayError::invalid_param(
            "Charset",
            "only utf-8 is supported in current version",
        ))
    }
}

pub fn check_version(version: &str) -> Result<(), PayError> {
    matches(&VERSION, "Version", version, MSG_VERSION)
}

pub fn check_timestamp(timestamp: &str) -> Result<(), PayError> {
    matches(&UNIX_SECONDS, "Timestamp", timestamp, MSG_NUMBER)
}

pub fn check_trade_time(trade_time: &str) -> Result<(), PayError> {
    matches(&UNIX_SECONDS, "TradeTime", trade_time, MSG_NUMBER)
}

pub fn check_valid_time(valid_time: &str) -> Result<(), PayError> {
    matches(&UNIX_SECONDS, "ValidTime", valid_time, MSG_NUMBER)
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

pub fn check_out_order_no(out_order_no: &str) -> Result<(), PayError> {
    matches(&SHORT_ID, "OutOrderNo", out_order_no, MSG_ID)
}

pub fn check_trade_no(trade_no: &str) -> Result<(), PayError> {
    matches(&LONG_ID, "TradeNo", trade_no, MSG_ID)
}

pub fn check_out_refund_no(out_refund_no: &str) -> Result<(), PayError> {
    matches(&SHORT_ID, "OutRefundNo", out_refund_no, MSG_ID)
}

pub fn check_refund_no(refund_no: &str) -> Result<(), PayError> {
    matches(&LONG_ID, "RefundNo", refund_no, MSG_ID)
}

/// At least one of two alternative identifiers must be set.
pub fn check_one_of(
    field: &'static str,
    first: &str,
    second: &str,
    names: (&str, &str),
) -> Result<(), PayError> {
    if first.is_empty() && second.is_empty() {
        Err(PayError::invalid_param(
            field,
            format!("{} and {} can't both be blank", names.0, names.1),
        ))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

pub fn check_notify_url(url: &str) -> Result<(), PayError> {
    matches(&URL, "NotifyUrl", url, MSG_URL)
}

/// The value must parse as a JSON object.
pub fn check_json_object(field: &'static str, text: &str) -> Result<(), PayError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(_)) => Ok(()),
        _ => Err(PayError::invalid_param(field, MSG_JSON)),
    }
}

pub fn check_risk_info(risk_info: &str) -> Result<(), PayError> {
    check_json_object("RiskInfo", risk_info)
}

pub fn check_positive(field: &'static str, amount: i64) -> Result<(), PayError> {
    if amount > 0 {
        Ok(())
    } else {
        Err(PayError::invalid_param(field, MSG_POSITIVE))
    }
}

pub fn check_non_negative(field: &'static str, amount: i64) -> Result<(), PayError> {
    if amount >= 0 {
        Ok(())
    } else {
        Err(PayError::invalid_param(field, "must not be negative"))
    }
}

/// The value must equal the only literal the gateway accepts.
pub fn check_literal(field: &'static str, value: &str, expected: &str) -> Result<(), PayError> {
    if value == expected {
        Ok(())
    } else {
        Err(PayError::invalid_param(field, format!("must be {expected}")))
    }
}

pub fn check_required(field: &'static str, value: &str) -> Result<(), PayError> {
    if value.is_empty() {
        Err(PayError::invalid_param(field, MSG_REQUIRED))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: PayError) -> &'static str {
        match err {
            PayError::InvalidParam { field, .. } => field,
            other => panic!("expected InvalidParam, got {other:?}"),
        }
    }

    #[test]
    fn test_short_ids() {
        assert!(check_app_id("abc-DEF_123").is_ok());
        assert!(check_app_id(&"a".repeat(32)).is_ok());
        assert_eq!(field_of(check_app_id(&"a".repeat(33)).unwrap_err()), "AppId");
        assert!(check_app_id("").is_err());
        assert!(check_merchant_id("m.1").is_err());
        assert!(check_uid("user 1").is_err());
    }

    #[test]
    fn test_long_ids_allow_64() {
        assert!(check_trade_no(&"T".repeat(64)).is_ok());
        assert!(check_trade_no(&"T".repeat(65)).is_err());
        assert!(check_refund_no(&"R".repeat(64)).is_ok());
        assert!(check_out_refund_no(&"R".repeat(33)).is_err());
    }

    #[test]
    fn test_version_requires_literal_dot() {
        assert!(check_version("1.0").is_ok());
        assert!(check_version("2.5").is_ok());
        assert!(check_version("1x0").is_err());
        assert!(check_version("10").is_err());
        assert!(check_version("1.0.0").is_err());
    }

    #[test]
    fn test_timestamps() {
        assert!(check_timestamp("1700000000").is_ok());
        assert!(check_timestamp("").is_err());
        assert!(check_trade_time("17e9").is_err());
        assert_eq!(field_of(check_valid_time("-1").unwrap_err()), "ValidTime");
    }

    #[test]
    fn test_fixed_header_values() {
        assert!(check_sign_type("MD5").is_ok());
        assert!(check_sign_type("RSA").is_err());
        assert!(check_format("JSON").is_ok());
        assert!(check_format("XML").is_err());
        assert!(check_charset("utf-8").is_ok());
        assert!(check_charset("UTF-8").is_err());
    }

    #[test]
    fn test_method_must_match() {
        assert!(check_method("tp.trade.query", "tp.trade.query").is_ok());
        let err = check_method("tp.trade.query", "tp.refund.query").unwrap_err();
        assert!(err.to_string().contains("must be tp.trade.query"));
    }

    #[test]
    fn test_notify_url_forms() {
        assert!(check_notify_url("https://merchant.example.com/notify").is_ok());
        assert!(check_notify_url("http://10.0.0.1:8080/cb?x=1").is_ok());
        assert!(check_notify_url("rpc:service").is_ok());
        assert!(check_notify_url("").is_err());
        assert!(check_notify_url("just-a-word").is_err());
    }

    #[test]
    fn test_json_object_fields() {
        assert!(check_risk_info(r#"{"ip":"127.0.0.1","device_id":"122333"}"#).is_ok());
        assert!(check_risk_info("").is_err());
        assert!(check_risk_info("[1,2]").is_err());
        assert!(check_json_object("Ext", "{not json}").is_err());
    }

    #[test]
    fn test_amounts_and_required() {
        assert!(check_positive("TotalAmount", 1).is_ok());
        assert!(check_positive("TotalAmount", 0).is_err());
        assert!(check_positive("TotalAmount", -3).is_err());
        assert_eq!(field_of(check_required("Subject", "").unwrap_err()), "Subject");
        assert!(check_non_negative("TotalAmount", 0).is_ok());
        assert!(check_non_negative("TotalAmount", -1).is_err());
    }

    #[test]
    fn test_literal() {
        assert!(check_literal("ProductCode", "withdraw", "withdraw").is_ok());
        let err = check_literal("ProductCode", "pay", "withdraw").unwrap_err();
        assert!(err.to_string().contains("must be withdraw"));
    }

    #[test]
    fn test_one_of() {
        assert!(check_one_of("OutOrderNo", "", "T1", ("OutOrderNo", "TradeNo")).is_ok());
        let err = check_one_of("OutOrderNo", "", "", ("OutOrderNo", "TradeNo")).unwrap_err();
        assert!(err.to_string().contains("can't both be blank"));
    }
}
