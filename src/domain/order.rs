use super::money::Money;
use super::{AddressId, OrderId, ProductId, UserId};
use crate::error::PaymentError;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    NotPaid,
    Paid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Human-facing order number.
    pub order_num: String,
    pub user_id: UserId,
    pub seller_id: UserId,
    pub product_id: ProductId,
    pub address_id: AddressId,
    pub quantity: u32,
    pub unit_price: Money,
    pub status: OrderStatus,
}

impl Order {
    /// Builds an unpaid order, snapshotting seller and price from the caller.
    pub fn new(
        id: OrderId,
        user_id: UserId,
        seller_id: UserId,
        product_id: ProductId,
        address_id: AddressId,
        quantity: u32,
        unit_price: Money,
    ) -> Result<Self, PaymentError> {
        if quantity == 0 {
            return Err(PaymentError::ValidationError(
                "Order quantity must be at least 1".to_string(),
            ));
        }
        if unit_price.is_negative() {
            return Err(PaymentError::ValidationError(
                "Unit price must not be negative".to_string(),
            ));
        }
        Ok(Self {
            id,
            order_num: order_number(product_id, user_id),
            user_id,
            seller_id,
            product_id,
            address_id,
            quantity,
            unit_price,
            status: OrderStatus::NotPaid,
        })
    }

    /// Total price of the order: unit price times quantity.
    pub fn total(&self) -> Result<Money, PaymentError> {
        self.unit_price.times(self.quantity)
    }

    pub fn is_paid(&self) -> bool {
        self.status == OrderStatus::Paid
    }
}

/// Random 9-digit prefix followed by the product and buyer ids.
pub fn order_number(product_id: ProductId, user_id: UserId) -> String {
    let prefix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{prefix:09}{product_id}{user_id}")
}
