// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # ttpay
//!
//! Operator tool over the `ttpay` SDK. Parses arguments, initializes
//! logging, runs one command and prints its result as JSON.
//!
//! - `cashier`: local trade create, prints the cashier parameters
//! - `trade-query`, `refund-create`, `refund-query`, `withdraw-query`:
//!   gateway round trips
//! - `verify-callback`: authenticate and decode a callback payload
//! - `version`: print build version information

mod cli;
mod logging;

use std::io::Read;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use ttpay::config::DEFAULT_DOMAIN;
use ttpay::refund::{refund_notify_with, RefundCreateRequest, RefundCreateResponse};
use ttpay::refund::{RefundQueryRequest, RefundQueryResponse};
use ttpay::trade::{trade_create, trade_notify_with, TradeCreateRequest};
use ttpay::trade::{TradeQueryRequest, TradeQueryResponse};
use ttpay::withdraw::{withdraw_notify_with, WithdrawQueryRequest, WithdrawQueryResponse};
use ttpay::{HttpClientConfig, PayClient, PublicVerifier};

use cli::{CallbackKind, Commands, TtpayCli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = TtpayCli::parse();
    logging::init_logging(logging::DEFAULT_FILTER, cli.log_format);

    match cli.command {
        Commands::Cashier(args) => cashier(args),
        Commands::TradeQuery(args) => trade_query(args).await,
        Commands::RefundCreate(args) => refund_create(args).await,
        Commands::RefundQuery(args) => refund_query(args).await,
        Commands::WithdrawQuery(args) => withdraw_query(args).await,
        Commands::VerifyCallback(args) => verify_callback(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn cashier(args: cli::CashierArgs) -> Result<()> {
    let mut req = TradeCreateRequest::new(args.gateway.config());
    req.applet_version = args.applet_version;
    req.out_order_no = args.out_order_no;
    req.uid = args.uid;
    req.total_amount = args.total_amount;
    req.currency = args.currency;
    req.subject = args.subject;
    req.body = args.body;
    req.trade_time = args
        .trade_time
        .unwrap_or_else(|| req.common.timestamp.clone());
    req.valid_time = args.valid_time;
    req.notify_url = args.notify_url;
    req.risk_info = args.risk_info;
    req.product_code = args.product_code;
    req.payment_type = args.payment_type;
    req.trade_type = args.trade_type;
    req.params = args.params;
    req.pay_type = args.pay_type;
    req.pay_channel = args.pay_channel;

    let resp = trade_create(req).context("trade create rejected")?;
    let params = resp
        .cashier_applet_params()
        .context("failed to build cashier parameters")?;
    let value: serde_json::Value =
        serde_json::from_str(&params).context("cashier parameters are not JSON")?;

    tracing::info!(out_order_no = %resp.request().out_order_no, "cashier parameters built");
    print_json(&value)
}

async fn trade_query(args: cli::TradeQueryArgs) -> Result<()> {
    let mut req = TradeQueryRequest::new(args.gateway.config());
    req.uid = args.uid;
    req.out_order_no = args.out_order_no;
    req.trade_no = args.trade_no;

    let mut resp = TradeQueryResponse::default();
    gateway_client()?
        .execute(&req, &mut resp, &args.gateway.options())
        .await
        .context("trade query failed")?;
    print_json(&resp)
}

async fn refund_create(args: cli::RefundCreateArgs) -> Result<()> {
    let mut req = RefundCreateRequest::new(args.gateway.config());
    req.uid = args.uid;
    req.out_order_no = args.out_order_no;
    req.trade_no = args.trade_no;
    req.out_refund_no = args.out_refund_no;
    req.refund_amount = args.refund_amount;
    req.notify_url = args.notify_url;
    req.risk_info = args.risk_info;
    req.reason = args.reason;

    let mut resp = RefundCreateResponse::default();
    gateway_client()?
        .execute(&req, &mut resp, &args.gateway.options())
        .await
        .context("refund create failed")?;
    tracing::info!(refund_no = %resp.refund_no, "refund accepted");
    print_json(&resp)
}

async fn refund_query(args: cli::RefundQueryArgs) -> Result<()> {
    let mut req = RefundQueryRequest::new(args.gateway.config());
    req.uid = args.uid;
    req.out_refund_no = args.out_refund_no;
    req.refund_no = args.refund_no;

    let mut resp = RefundQueryResponse::default();
    gateway_client()?
        .execute(&req, &mut resp, &args.gateway.options())
        .await
        .context("refund query failed")?;
    print_json(&resp)
}

async fn withdraw_query(args: cli::WithdrawQueryArgs) -> Result<()> {
    let mut req = WithdrawQueryRequest::new(args.gateway.config());
    req.out_trade_no = args.out_trade_no;
    req.withdraw_trade_no = args.withdraw_trade_no;

    let mut resp = WithdrawQueryResponse::default();
    gateway_client()?
        .execute(&req, &mut resp, &args.gateway.options())
        .await
        .context("withdraw query failed")?;
    print_json(&resp)
}

fn verify_callback(args: cli::VerifyCallbackArgs) -> Result<()> {
    let payload = match args.payload {
        Some(payload) => payload,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read callback payload from stdin")?;
            buf
        }
    };

    let loaded;
    let verifier = match &args.public_key_file {
        Some(path) => {
            loaded = PublicVerifier::from_pem_file(path)
                .with_context(|| format!("failed to load public key {}", path.display()))?;
            &loaded
        }
        None => PublicVerifier::gateway(),
    };

    match args.kind {
        CallbackKind::Trade => {
            print_json(&trade_notify_with(&payload, verifier).context("trade callback rejected")?)
        }
        CallbackKind::Refund => {
            print_json(&refund_notify_with(&payload, verifier).context("refund callback rejected")?)
        }
        CallbackKind::Withdraw => print_json(
            &withdraw_notify_with(&payload, verifier).context("withdraw callback rejected")?,
        ),
    }
}

fn gateway_client() -> Result<PayClient> {
    PayClient::new(&HttpClientConfig::default()).context("failed to build HTTP client")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{text}");
    Ok(())
}

fn print_version() {
    println!("ttpay   {}", env!("CARGO_PKG_VERSION"));
    println!("gateway {}", DEFAULT_DOMAIN);
    println!("rustc   {}", option_env!("RUSTC_VERSION").unwrap_or("unknown"));
}
