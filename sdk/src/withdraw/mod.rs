//! Withdrawal operations: create (with or without user login), query, and
//! the withdrawal callback.

pub mod create;
pub mod notify;
pub mod query;

pub use create::{WithdrawCreateRequest, WithdrawCreateResponse, WITHDRAW_PRODUCT_CODE};
pub use notify::{withdraw_notify, withdraw_notify_with, WithdrawNotification};
pub use query::{WithdrawQueryRequest, WithdrawQueryResponse};
