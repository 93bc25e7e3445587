use super::money::Money;
use super::{ProductId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Seller ("boss") who lists the product and is credited on settlement.
    pub seller_id: UserId,
    pub price: Money,
    /// Remaining sellable quantity. Signed: stock may be allowed to go negative.
    pub stock: i64,
}

impl Product {
    /// Stock left after selling `quantity` units, without any floor check.
    pub fn stock_after(&self, quantity: u32) -> i64 {
        self.stock - i64::from(quantity)
    }
}
