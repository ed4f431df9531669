//! Trade operations: local pre-order creation with cashier parameters,
//! gateway trade query, and the payment callback.

pub mod create;
pub mod notify;
pub mod query;

pub use create::{trade_create, AppletVersion, TradeCreateRequest, TradeCreateResponse};
pub use notify::{trade_notify, trade_notify_with, TradeNotification};
pub use query::{TradeQueryRequest, TradeQueryResponse};
