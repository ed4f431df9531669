// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # ttpay: TT Payment Gateway Client
//!
//! Builds signed requests for the gateway, sends them, classifies and
//! decodes the replies, and authenticates the asynchronous callbacks the
//! gateway sends back.
//!
//! ## Architecture
//!
//! - **crypto**: canonical parameter encoding, MD5 request signing and RSA
//!   callback verification.
//! - **validation**: local field checks, run before anything is sent.
//! - **request**: common header fields and the traits every operation implements.
//! - **envelope**: response shapes and success classification.
//! - **transport**: the HTTP seam and its `reqwest` implementation.
//! - **client**: the validate, sign, post, classify, decode round trip.
//! - **notify**: callback parsing and verification.
//! - **trade**, **refund**, **withdraw**: typed operations.
//! - **config**: merchant credentials and protocol constants.
//!
//! ## Example
//!
//! ```no_run
//! use ttpay::{Config, HttpClientConfig, PayClient};
//! use ttpay::trade::TradeQueryRequest;
//!
//! # async fn run() -> Result<(), ttpay::PayError> {
//! let client = PayClient::new(&HttpClientConfig::default())?;
//! let mut req = TradeQueryRequest::new(Config::new("app_id", "secret", "merchant"));
//! req.uid = "user_1".into();
//! req.out_order_no = "order_1".into();
//! let resp = client.trade_query(&req).await?;
//! println!("{}", resp.trade_status);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod notify;
pub mod refund;
pub mod request;
pub mod trade;
pub mod transport;
pub mod validation;
pub mod withdraw;

pub use client::{ExecuteOptions, PayClient};
pub use config::{Config, HttpClientConfig};
pub use crypto::PublicVerifier;
pub use envelope::ResponseEnvelope;
pub use error::{BusinessError, PayError};
pub use notify::{CallbackParams, Notification};
pub use request::{BizContent, CommonParams, PayRequest, PayResponse};
pub use transport::{HttpReply, HttpTransport, ReqwestTransport, TransportError};
