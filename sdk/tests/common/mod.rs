//! Shared fixtures: a recording in-memory transport and callback signing.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use md5::{Digest, Md5};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};

use ttpay::crypto::{encode, ParameterMap, PublicVerifier, SIGN_FIELD};
use ttpay::{Config, HttpReply, HttpTransport, PayClient, TransportError};

pub const TIMESTAMP: &str = "1700000000";

pub fn config() -> Config {
    Config::new("app_1", "secret", "m_1").with_domain("http://gateway.test")
}

/// One outbound call as the transport saw it.
#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub url: String,
    pub body: String,
    pub log_id: String,
    pub timeout: Duration,
}

impl RecordedCall {
    /// The decoded form fields of the body.
    pub fn fields(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(self.body.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    pub fn field(&self, name: &str) -> String {
        self.fields()
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
            .unwrap_or_default()
    }
}

/// Replays canned replies in order and records every call.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<Result<HttpReply, TransportError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply_json(&self, body: serde_json::Value) {
        self.reply_raw(200, body.to_string().as_bytes());
    }

    pub fn reply_raw(&self, status: u16, body: &[u8]) {
        self.replies.lock().unwrap().push_back(Ok(HttpReply {
            status,
            body: body.to_vec(),
        }));
    }

    pub fn fail(&self, err: TransportError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn post_form(
        &self,
        url: &str,
        body: String,
        log_id: &str,
        timeout: Duration,
    ) -> Result<HttpReply, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            url: url.to_string(),
            body,
            log_id: log_id.to_string(),
            timeout,
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connect("no canned reply".into())))
    }
}

pub fn client(transport: &Arc<MockTransport>) -> PayClient {
    PayClient::with_transport(transport.clone())
}

// ---------------------------------------------------------------------------
// Callback signing
// ---------------------------------------------------------------------------

pub struct GatewayKey {
    private: RsaPrivateKey,
}

impl GatewayKey {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            private: RsaPrivateKey::new(&mut rng, 1024).unwrap(),
        }
    }

    pub fn verifier(&self) -> PublicVerifier {
        PublicVerifier::from_key(RsaPublicKey::from(&self.private))
    }

    /// A form-urlencoded callback with a valid `sign` appended.
    pub fn signed_callback(&self, fields: &[(&str, &str)]) -> String {
        let map: ParameterMap = fields.iter().copied().collect();
        let digest = Md5::digest(encode(&map).as_bytes());
        let sig = self
            .private
            .sign(Pkcs1v15Sign::new::<Md5>(), &digest)
            .unwrap();

        let mut form = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in fields {
            form.append_pair(k, v);
        }
        form.append_pair(SIGN_FIELD, &BASE64.encode(sig));
        form.finish()
    }
}
