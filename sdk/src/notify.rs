//! # Callback Notifications
//!
//! The gateway reports payment, refund and withdrawal completion by calling
//! the merchant's notify URL with form-urlencoded parameters. The order of
//! operations is the whole point of this module:
//!
//! 1. parse the raw string into a flat parameter map (first value wins
//!    when a key repeats),
//! 2. verify the RSA signature over every field except `sign`,
//! 3. only then build the typed notification.
//!
//! A forged or tampered callback stops at step 2 with
//! [`PayError::Verification`] and never becomes a typed value.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::crypto::{ParameterMap, PublicVerifier, SIGN_FIELD};
use crate::error::PayError;

/// Raw callback fields, exactly as received after URL decoding.
pub type CallbackParams = BTreeMap<String, String>;

/// A typed view of a verified callback.
pub trait Notification: Sized {
    /// Short name used in logs (`trade`, `refund`, `withdraw`).
    const KIND: &'static str;

    /// Build from verified parameters. Absent fields become empty strings.
    fn from_params(params: CallbackParams) -> Self;
}

/// Split a form-urlencoded string into parameters.
///
/// Repeated keys keep their first value. A `%` not followed by two hex
/// digits is rejected rather than passed through.
pub fn parse_callback(raw: &str) -> Result<CallbackParams, PayError> {
    if raw.trim().is_empty() {
        return Err(PayError::Callback("empty payload".into()));
    }
    check_percent_escapes(raw)?;

    let mut params = CallbackParams::new();
    for (key, value) in url::form_urlencoded::parse(raw.trim().as_bytes()) {
        if let Entry::Vacant(slot) = params.entry(key.into_owned()) {
            slot.insert(value.into_owned());
        }
    }
    Ok(params)
}

fn check_percent_escapes(raw: &str) -> Result<(), PayError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(PayError::Callback(format!(
                    "invalid percent escape at byte {i}"
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

/// Check the signature on already parsed parameters.
pub fn verify_params(params: &CallbackParams, verifier: &PublicVerifier) -> Result<(), PayError> {
    let signature = params.get(SIGN_FIELD).map(String::as_str).unwrap_or("");
    let fields: ParameterMap = params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();

    if verifier.verify(&fields, signature) {
        Ok(())
    } else {
        Err(PayError::Verification)
    }
}

/// Parse, verify and decode a callback of type `N`.
pub fn parse_notification<N: Notification>(
    raw: &str,
    verifier: &PublicVerifier,
) -> Result<N, PayError> {
    let params = parse_callback(raw)?;

    if let Err(e) = verify_params(&params, verifier) {
        warn!(
            kind = N::KIND,
            notify_id = params.get("notify_id").map(String::as_str).unwrap_or(""),
            "callback signature rejected"
        );
        return Err(e);
    }

    debug!(kind = N::KIND, fields = params.len(), "callback verified");
    Ok(N::from_params(params))
}

/// Field lookup for typed notifications.
pub(crate) fn field(params: &CallbackParams, name: &str) -> String {
    params.get(name).cloned().unwrap_or_default()
}
