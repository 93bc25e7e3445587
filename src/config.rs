use crate::domain::money::Money;
use rust_decimal_macros::dec;

/// What settlement does when an order would take stock below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockPolicy {
    /// Decrement regardless; stock may go negative.
    #[default]
    AllowNegative,
    /// Abort the settlement with `InsufficientStock`.
    RejectShortfall,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettlementConfig {
    pub stock_policy: StockPolicy,
    /// Balance granted to every newly opened account.
    pub initial_grant: Money,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            stock_policy: StockPolicy::default(),
            initial_grant: Money::new(dec!(10000)),
        }
    }
}

impl SettlementConfig {
    pub fn with_stock_policy(mut self, stock_policy: StockPolicy) -> Self {
        self.stock_policy = stock_policy;
        self
    }

    pub fn with_initial_grant(mut self, initial_grant: Money) -> Self {
        self.initial_grant = initial_grant;
        self
    }
}
