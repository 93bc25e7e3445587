use crate::error::{ErrorKind, PaymentError};
use serde::Serialize;

pub const SUCCESS: u32 = 200;
pub const INVALID_PARAMS: u32 = 400;
pub const ERROR: u32 = 500;
pub const ERROR_FAIL_ENCRYPTION: u32 = 30002;
pub const ERROR_USER_NOT_FOUND: u32 = 30003;
pub const ERROR_LEDGER_DECODE: u32 = 30009;
pub const ERROR_ORDER_PRODUCT_NOT_FOUND: u32 = 80002;
pub const ERROR_ORDER_NOT_FOUND: u32 = 80004;
pub const ERROR_INSUFFICIENT_FUNDS: u32 = 80005;
pub const ERROR_INSUFFICIENT_STOCK: u32 = 80006;
pub const ERROR_ORDER_RETIRE_FAILED: u32 = 80007;

/// What the caller of an operation sees: a status code, a short message and, on
/// failure, the error detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub status: u32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok(msg: impl Into<String>) -> Self {
        Self {
            status: SUCCESS,
            msg: msg.into(),
            error: None,
        }
    }

    pub fn from_error(err: &PaymentError) -> Self {
        let (status, msg) = match err {
            PaymentError::InvalidKey(_) => (ERROR_FAIL_ENCRYPTION, "invalid balance key"),
            _ => match err.kind() {
                ErrorKind::OrderNotFound => (ERROR_ORDER_NOT_FOUND, "order not found"),
                ErrorKind::UserNotFound => (ERROR_USER_NOT_FOUND, "user not found"),
                ErrorKind::ProductNotFound => {
                    (ERROR_ORDER_PRODUCT_NOT_FOUND, "product not found")
                }
                ErrorKind::InsufficientFunds => (ERROR_INSUFFICIENT_FUNDS, "insufficient funds"),
                ErrorKind::InsufficientStock => (ERROR_INSUFFICIENT_STOCK, "insufficient stock"),
                ErrorKind::LedgerDecodeError => {
                    (ERROR_LEDGER_DECODE, "balance could not be decoded")
                }
                ErrorKind::OrderDeleteFailed => {
                    (ERROR_ORDER_RETIRE_FAILED, "order could not be retired")
                }
                ErrorKind::Validation | ErrorKind::Io => (INVALID_PARAMS, "invalid params"),
                ErrorKind::PersistenceError | ErrorKind::TransactionError => (ERROR, "fail"),
            },
        };
        Self {
            status,
            msg: msg.to_string(),
            error: Some(err.to_string()),
        }
    }

    /// Maps an operation result, using `success` as the message when it succeeded.
    pub fn from_result<T>(result: &Result<T, PaymentError>, success: &str) -> Self {
        match result {
            Ok(_) => Self::ok(success),
            Err(e) => Self::from_error(e),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SUCCESS
    }
}
