//! # Callback Signature Verification
//!
//! The gateway signs every asynchronous notification with its RSA private
//! key. The receiving side checks it like this:
//!
//! 1. Drop the `sign` field from the parameter map.
//! 2. Build the canonical string of what is left. No secret is appended.
//! 3. MD5 it.
//! 4. Verify the base64-decoded `sign` value as an RSASSA-PKCS1-v1_5
//!    signature over that digest.
//!
//! Verification answers yes or no. Malformed input (empty map, empty
//! signature, bad base64, wrong length) is simply "no". A notification that
//! fails here must never be decoded into typed fields.

use std::fmt;
use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use md5::{Digest, Md5};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use thiserror::Error;

use super::canonical::{encode, ParameterMap};
use crate::config::GATEWAY_PUBLIC_KEY_PEM;

/// The field that carries the signature inside a callback.
pub const SIGN_FIELD: &str = "sign";

/// A public key that could not be loaded.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("public key is not valid PEM (tried SPKI and PKCS#1): {0}")]
    InvalidPem(String),

    #[error("reading public key file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

static GATEWAY_VERIFIER: LazyLock<PublicVerifier> = LazyLock::new(|| {
    PublicVerifier::from_pem(GATEWAY_PUBLIC_KEY_PEM)
        .expect("embedded gateway public key must parse")
});

/// Verifies gateway callback signatures against one RSA public key.
#[derive(Clone)]
pub struct PublicVerifier {
    key: RsaPublicKey,
}

impl PublicVerifier {
    /// Load a key from PEM. Accepts `BEGIN PUBLIC KEY` (SPKI) and
    /// `BEGIN RSA PUBLIC KEY` (PKCS#1).
    pub fn from_pem(pem: &str) -> Result<Self, KeyError> {
        let pem = pem.trim();
        let key = match RsaPublicKey::from_public_key_pem(pem) {
            Ok(key) => key,
            Err(spki_err) => RsaPublicKey::from_pkcs1_pem(pem)
                .map_err(|_| KeyError::InvalidPem(spki_err.to_string()))?,
        };
        Ok(Self { key })
    }

    /// Load a PEM key from disk.
    pub fn from_pem_file(path: impl AsRef<std::path::Path>) -> Result<Self, KeyError> {
        let path = path.as_ref();
        let pem = std::fs::read_to_string(path).map_err(|source| KeyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_pem(&pem)
    }

    /// Wrap an already-parsed key.
    pub fn from_key(key: RsaPublicKey) -> Self {
        Self { key }
    }

    /// The verifier for the embedded gateway key. Parsed once per process.
    pub fn gateway() -> &'static PublicVerifier {
        &GATEWAY_VERIFIER
    }

    /// Check `signature` (base64) over the canonical form of `fields`.
    ///
    /// `fields` may still contain `sign`; it is excluded before encoding.
    pub fn verify(&self, fields: &ParameterMap, signature: &str) -> bool {
        if fields.is_empty() || signature.is_empty() {
            return false;
        }

        let raw = match BASE64.decode(signature.trim()) {
            Ok(raw) => raw,
            Err(_) => return false,
        };

        let mut unsigned = fields.clone();
        unsigned.remove(SIGN_FIELD);
        let digest = Md5::digest(encode(&unsigned).as_bytes());

        self.key
            .verify(Pkcs1v15Sign::new::<Md5>(), &digest, &raw)
            .is_ok()
    }
}

impl fmt::Debug for PublicVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use rsa::traits::PublicKeyParts;
        f.debug_struct("PublicVerifier")
            .field("bits", &(self.key.size() * 8))
            .finish()
    }
}

/// One-shot verification against a PEM key.
///
/// Returns `false` when the key itself cannot be parsed, as well as for
/// every other failure.
pub fn verify(fields: &ParameterMap, signature: &str, public_key_pem: &str) -> bool {
    match PublicVerifier::from_pem(public_key_pem) {
        Ok(verifier) => verifier.verify(fields, signature),
        Err(_) => false,
    }
}
