//! # Shared-Secret Signing
//!
//! Outbound requests (and the cashier parameter sets handed to front-ends)
//! are authenticated with a salted MD5 digest:
//!
//! ```text
//! sign = lower_hex(MD5(encode(fields) + app_secret))
//! ```
//!
//! The gateway re-derives the same digest with its copy of the secret. Any
//! change to a signed field after signing, including a different key order
//! inside `biz_content`, invalidates the request.

use md5::{Digest, Md5};

use super::canonical::{encode, ParameterMap};

/// Lower-case hex MD5 of arbitrary bytes.
pub fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Sign a parameter map with the shared secret.
///
/// `fields` must be exactly the signable set. It must not contain `sign`.
/// Pure function: the same inputs always produce the same 32-character
/// digest.
///
/// # Example
///
/// ```
/// use ttpay::crypto::{sign, ParameterMap};
///
/// let mut fields = ParameterMap::new();
/// fields.insert("app_id", "800000");
/// fields.insert("method", "tp.trade.query");
///
/// let sig = sign(&fields, "secret");
/// assert_eq!(sig.len(), 32);
/// assert_eq!(sig, sign(&fields, "secret"));
/// ```
pub fn sign(fields: &ParameterMap, secret: &str) -> String {
    let salted = encode(fields).with_secret(secret);
    md5_hex(salted.as_bytes())
}
