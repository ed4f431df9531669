//! # CLI Interface
//!
//! Argument structure for the `ttpay` binary. Merchant credentials come
//! from flags or `TTPAY_*` environment variables.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use ttpay::config::DEFAULT_TIMEOUT_MS;
use ttpay::trade::AppletVersion;
use ttpay::{Config, ExecuteOptions};

use crate::logging::LogFormat;

/// Command-line client for the TT payment gateway.
///
/// Builds cashier parameters, runs queries and refunds against the gateway,
/// and verifies callback payloads. Results are printed as JSON on stdout.
#[derive(Parser, Debug)]
#[command(name = "ttpay", version, propagate_version = true)]
pub struct TtpayCli {
    /// Log output format (logs go to stderr).
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a pre-order locally and print the signed cashier parameters.
    Cashier(CashierArgs),
    /// Look up a trade.
    TradeQuery(TradeQueryArgs),
    /// Refund all or part of a trade.
    RefundCreate(RefundCreateArgs),
    /// Look up a refund.
    RefundQuery(RefundQueryArgs),
    /// Look up a withdrawal.
    WithdrawQuery(WithdrawQueryArgs),
    /// Verify a callback payload and print its fields.
    VerifyCallback(VerifyCallbackArgs),
    /// Print version information and exit.
    Version,
}

/// Merchant credentials and per-call options shared by gateway commands.
#[derive(Args, Debug)]
pub struct GatewayArgs {
    #[arg(long, env = "TTPAY_APP_ID")]
    pub app_id: String,

    #[arg(long, env = "TTPAY_APP_SECRET", hide_env_values = true)]
    pub app_secret: String,

    #[arg(long, env = "TTPAY_MERCHANT_ID")]
    pub merchant_id: String,

    /// Gateway base URL. Defaults to the production gateway.
    #[arg(long, env = "TTPAY_DOMAIN")]
    pub domain: Option<String>,

    /// Per-call timeout in milliseconds.
    #[arg(long, env = "TTPAY_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Replace the derived `X-Tt-Logid` value.
    #[arg(long)]
    pub log_id: Option<String>,
}

impl GatewayArgs {
    pub fn config(&self) -> Config {
        let config = Config::new(&self.app_id, &self.app_secret, &self.merchant_id)
            .with_timeout_ms(self.timeout_ms);
        match &self.domain {
            Some(domain) => config.with_domain(domain),
            None => config,
        }
    }

    pub fn options(&self) -> ExecuteOptions {
        ExecuteOptions {
            log_id: self.log_id.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct CashierArgs {
    #[command(flatten)]
    pub gateway: GatewayArgs,

    /// Cashier applet version: 1.0, 2.0, 2.0+ or 3.0.
    #[arg(long, default_value = "2.0")]
    pub applet_version: AppletVersion,

    #[arg(long)]
    pub out_order_no: String,

    #[arg(long)]
    pub uid: String,

    /// Amount in minor currency units.
    #[arg(long)]
    pub total_amount: i64,

    #[arg(long, default_value = "CNY")]
    pub currency: String,

    #[arg(long)]
    pub subject: String,

    #[arg(long)]
    pub body: String,

    /// Order time in unix seconds. Defaults to now.
    #[arg(long)]
    pub trade_time: Option<String>,

    /// Order validity in seconds.
    #[arg(long, default_value = "300")]
    pub valid_time: String,

    #[arg(long)]
    pub notify_url: String,

    /// JSON object, e.g. `{"ip":"127.0.0.1"}`.
    #[arg(long)]
    pub risk_info: String,

    #[arg(long, default_value = "pay")]
    pub product_code: String,

    #[arg(long, default_value = "direct")]
    pub payment_type: String,

    #[arg(long, default_value = "H5")]
    pub trade_type: String,

    /// 1.0 cashier only: the payment URL wrapped into `params`.
    #[arg(long, default_value = "")]
    pub params: String,

    #[arg(long, default_value = "")]
    pub pay_type: String,

    #[arg(long, default_value = "")]
    pub pay_channel: String,
}

#[derive(Args, Debug)]
pub struct TradeQueryArgs {
    #[command(flatten)]
    pub gateway: GatewayArgs,

    #[arg(long)]
    pub uid: String,

    #[arg(long, default_value = "")]
    pub out_order_no: String,

    #[arg(long, default_value = "")]
    pub trade_no: String,
}

#[derive(Args, Debug)]
pub struct RefundCreateArgs {
    #[command(flatten)]
    pub gateway: GatewayArgs,

    #[arg(long)]
    pub uid: String,

    #[arg(long, default_value = "")]
    pub out_order_no: String,

    #[arg(long, default_value = "")]
    pub trade_no: String,

    #[arg(long)]
    pub out_refund_no: String,

    /// Amount in minor currency units.
    #[arg(long)]
    pub refund_amount: i64,

    #[arg(long)]
    pub notify_url: String,

    #[arg(long)]
    pub risk_info: String,

    #[arg(long, default_value = "")]
    pub reason: String,
}

#[derive(Args, Debug)]
pub struct RefundQueryArgs {
    #[command(flatten)]
    pub gateway: GatewayArgs,

    #[arg(long)]
    pub uid: String,

    #[arg(long, default_value = "")]
    pub out_refund_no: String,

    #[arg(long, default_value = "")]
    pub refund_no: String,
}

#[derive(Args, Debug)]
pub struct WithdrawQueryArgs {
    #[command(flatten)]
    pub gateway: GatewayArgs,

    #[arg(long, default_value = "")]
    pub out_trade_no: String,

    #[arg(long, default_value = "")]
    pub withdraw_trade_no: String,
}

/// Which notification shape to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CallbackKind {
    Trade,
    Refund,
    Withdraw,
}

#[derive(Args, Debug)]
pub struct VerifyCallbackArgs {
    #[arg(long, value_enum)]
    pub kind: CallbackKind,

    /// The raw form-urlencoded callback. Read from stdin when omitted.
    #[arg(long)]
    pub payload: Option<String>,

    /// PEM public key to verify against instead of the embedded gateway key.
    #[arg(long, env = "TTPAY_PUBLIC_KEY_FILE")]
    pub public_key_file: Option<PathBuf>,
}
