use crate::domain::codec::CodecError;
use crate::domain::money::Money;
use crate::domain::{OrderId, ProductId, UserId};
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("order {0} not found")]
    OrderNotFound(OrderId),
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("product {0} not found")]
    ProductNotFound(ProductId),
    #[error("insufficient funds: order total is {required}")]
    InsufficientFunds { required: Money },
    #[error("insufficient stock for product {product}: {available} left, {requested} requested")]
    InsufficientStock {
        product: ProductId,
        available: i64,
        requested: u32,
    },
    #[error("invalid balance key: {0}")]
    InvalidKey(#[from] CodecError),
    #[error("balance of user {user} could not be decoded: {source}")]
    LedgerDecode {
        user: UserId,
        #[source]
        source: CodecError,
    },
    #[error("order {order} could not be retired for buyer {buyer}")]
    OrderDeleteFailed { order: OrderId, buyer: UserId },
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Persistence error: {0}")]
    PersistenceError(#[source] BoxError),
    #[error("Transaction error: {0}")]
    TransactionError(#[source] BoxError),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Caller-facing classification of a [`PaymentError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    OrderNotFound,
    UserNotFound,
    ProductNotFound,
    InsufficientFunds,
    InsufficientStock,
    LedgerDecodeError,
    PersistenceError,
    OrderDeleteFailed,
    TransactionError,
    Validation,
    Io,
}

impl PaymentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PaymentError::OrderNotFound(_) => ErrorKind::OrderNotFound,
            PaymentError::UserNotFound(_) => ErrorKind::UserNotFound,
            PaymentError::ProductNotFound(_) => ErrorKind::ProductNotFound,
            PaymentError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            PaymentError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            PaymentError::InvalidKey(_) | PaymentError::LedgerDecode { .. } => {
                ErrorKind::LedgerDecodeError
            }
            PaymentError::OrderDeleteFailed { .. } => ErrorKind::OrderDeleteFailed,
            PaymentError::ValidationError(_) => ErrorKind::Validation,
            PaymentError::PersistenceError(_) => ErrorKind::PersistenceError,
            PaymentError::TransactionError(_) => ErrorKind::TransactionError,
            PaymentError::CsvError(_) | PaymentError::IoError(_) => ErrorKind::Io,
        }
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        let msg: String = msg.into();
        PaymentError::PersistenceError(msg.into())
    }

    pub fn transaction(msg: impl Into<String>) -> Self {
        let msg: String = msg.into();
        PaymentError::TransactionError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;
