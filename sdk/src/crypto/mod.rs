//! # Signing and Verification
//!
//! Everything that decides whether a message is authentic lives here:
//!
//! - [`canonical`] turns a field map into the exact byte string that gets
//!   hashed. Both directions share it.
//! - [`signer`] produces the salted MD5 digest sent with every request.
//! - [`verifier`] checks the RSA signature on inbound gateway callbacks.
//!
//! All three are pure functions over their inputs and safe to call from any
//! number of tasks at once.

pub mod canonical;
pub mod signer;
pub mod verifier;

pub use canonical::{encode, CanonicalString, EncodingError, ParamValue, ParameterMap};
pub use signer::{md5_hex, sign};
pub use verifier::{verify, KeyError, PublicVerifier, SIGN_FIELD};
