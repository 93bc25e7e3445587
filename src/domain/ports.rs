//! Storage ports of the settlement core.
//!
//! Repositories are not free-standing handles: every repository call goes through a
//! [`Transaction`] obtained from a [`Store`], so the caller that opened the
//! transaction decides when its writes become visible.

use super::codec::EncodedBalance;
use super::order::Order;
use super::product::Product;
use super::user::UserAccount;
use super::{OrderId, ProductId, UserId};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait OrderRepository: Send {
    /// Returns the live (not yet settled) order with this id.
    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>>;
    async fn insert_order(&mut self, order: Order) -> Result<()>;
    async fn next_order_id(&mut self) -> Result<OrderId>;
    /// Deletes the live order `id` if it belongs to `owner` and is still unpaid.
    ///
    /// Returns the number of rows removed (0 or 1).
    async fn delete_order_by_id_and_owner(&mut self, id: OrderId, owner: UserId) -> Result<u64>;
    async fn archive_paid_order(&mut self, order: Order) -> Result<()>;
    async fn get_paid_order(&mut self, id: OrderId) -> Result<Option<Order>>;
}

#[async_trait]
pub trait UserRepository: Send {
    async fn get_user(&mut self, id: UserId) -> Result<Option<UserAccount>>;
    async fn insert_user(&mut self, user: UserAccount) -> Result<()>;
    async fn user_name_taken(&mut self, user_name: &str) -> Result<bool>;
    /// Fails if no user with `id` exists.
    async fn update_balance(&mut self, id: UserId, balance: EncodedBalance) -> Result<()>;
}

#[async_trait]
pub trait ProductRepository: Send {
    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>>;
    async fn insert_product(&mut self, product: Product) -> Result<()>;
    /// Fails if no product with `id` exists.
    async fn update_stock(&mut self, id: ProductId, stock: i64) -> Result<()>;
}

/// A unit of work over all three repositories.
///
/// Writes are staged until [`Transaction::commit`]. Dropping a transaction without
/// committing discards them, exactly like [`Transaction::rollback`].
#[async_trait]
pub trait Transaction: OrderRepository + UserRepository + ProductRepository + Send {
    async fn commit(self: Box<Self>) -> Result<()>;
    async fn rollback(self: Box<Self>) -> Result<()>;
}

pub type TransactionBox = Box<dyn Transaction>;

/// The transaction boundary.
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<TransactionBox>;
}

pub type StoreBox = Box<dyn Store>;
