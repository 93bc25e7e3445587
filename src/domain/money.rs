use crate::error::PaymentError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A monetary value held as an exact decimal.
///
/// Wraps `rust_decimal::Decimal` so every balance, price and total in the ledger is
/// fixed-point; sums and differences never drift the way float strings do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Money(pub Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Price of `quantity` units at this unit price.
    pub fn times(&self, quantity: u32) -> Result<Self, PaymentError> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Self)
            .ok_or_else(|| PaymentError::ValidationError("order total overflows".to_string()))
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, PaymentError> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or_else(|| PaymentError::ValidationError("balance overflows".to_string()))
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self, PaymentError> {
        self.0
            .checked_sub(rhs.0)
            .map(Self)
            .ok_or_else(|| PaymentError::ValidationError("balance overflows".to_string()))
    }

    /// Canonical textual form, trailing zeros stripped.
    pub fn to_canonical_string(&self) -> String {
        self.0.normalize().to_string()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Self)
    }
}

/// A strictly positive monetary amount, used for prices and grants.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, PaymentError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PaymentError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }
}

impl From<Amount> for Money {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}
