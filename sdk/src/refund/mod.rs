//! Refund operations: create, query, and the refund callback.

pub mod create;
pub mod notify;
pub mod query;

pub use create::{RefundCreateRequest, RefundCreateResponse};
pub use notify::{refund_notify, refund_notify_with, RefundNotification};
pub use query::{RefundQueryRequest, RefundQueryResponse};
