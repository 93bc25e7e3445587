use crate::domain::codec::EncodedBalance;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ports::{
    OrderRepository, ProductRepository, Store, Transaction, TransactionBox, UserRepository,
};
use crate::domain::product::Product;
use crate::domain::user::UserAccount;
use crate::domain::{OrderId, ProductId, UserId};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

#[derive(Debug, Default, Clone)]
struct Tables {
    users: HashMap<UserId, UserAccount>,
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
    paid_orders: HashMap<OrderId, Order>,
    last_order_id: OrderId,
}

/// A thread-safe in-memory store with serializable transactions.
///
/// `Clone` shares the underlying tables. A transaction holds the tables' lock from
/// `begin` until it is committed, rolled back or dropped, and works on a private
/// copy that replaces the shared tables only on commit.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> Result<TransactionBox> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryTransaction { guard, working }))
    }
}

pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl OrderRepository for InMemoryTransaction {
    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.working.orders.get(&id).cloned())
    }

    async fn insert_order(&mut self, order: Order) -> Result<()> {
        if self.working.orders.contains_key(&order.id)
            || self.working.paid_orders.contains_key(&order.id)
        {
            return Err(PaymentError::persistence(format!(
                "order {} already exists",
                order.id
            )));
        }
        self.working.last_order_id = self.working.last_order_id.max(order.id);
        self.working.orders.insert(order.id, order);
        Ok(())
    }

    async fn next_order_id(&mut self) -> Result<OrderId> {
        self.working
            .last_order_id
            .checked_add(1)
            .ok_or_else(|| PaymentError::persistence("order ids exhausted"))
    }

    async fn delete_order_by_id_and_owner(&mut self, id: OrderId, owner: UserId) -> Result<u64> {
        let deletable = self
            .working
            .orders
            .get(&id)
            .is_some_and(|o| o.user_id == owner && o.status == OrderStatus::NotPaid);
        if deletable {
            self.working.orders.remove(&id);
            debug!(order = id, "order row deleted");
            Ok(1)
        } else {
            Ok(0)
        }
    }

    async fn archive_paid_order(&mut self, order: Order) -> Result<()> {
        self.working.paid_orders.insert(order.id, order);
        Ok(())
    }

    async fn get_paid_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.working.paid_orders.get(&id).cloned())
    }
}

#[async_trait]
impl UserRepository for InMemoryTransaction {
    async fn get_user(&mut self, id: UserId) -> Result<Option<UserAccount>> {
        Ok(self.working.users.get(&id).cloned())
    }

    async fn insert_user(&mut self, user: UserAccount) -> Result<()> {
        if self.working.users.contains_key(&user.id) {
            return Err(PaymentError::persistence(format!(
                "user {} already exists",
                user.id
            )));
        }
        self.working.users.insert(user.id, user);
        Ok(())
    }

    async fn user_name_taken(&mut self, user_name: &str) -> Result<bool> {
        Ok(self
            .working
            .users
            .values()
            .any(|u| u.user_name == user_name))
    }

    async fn update_balance(&mut self, id: UserId, balance: EncodedBalance) -> Result<()> {
        let user = self
            .working
            .users
            .get_mut(&id)
            .ok_or_else(|| PaymentError::persistence(format!("no user row {id} to update")))?;
        user.balance = balance;
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for InMemoryTransaction {
    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.working.products.get(&id).cloned())
    }

    async fn insert_product(&mut self, product: Product) -> Result<()> {
        if self.working.products.contains_key(&product.id) {
            return Err(PaymentError::persistence(format!(
                "product {} already exists",
                product.id
            )));
        }
        self.working.products.insert(product.id, product);
        Ok(())
    }

    async fn update_stock(&mut self, id: ProductId, stock: i64) -> Result<()> {
        let product = self
            .working
            .products
            .get_mut(&id)
            .ok_or_else(|| PaymentError::persistence(format!("no product row {id} to update")))?;
        product.stock = stock;
        Ok(())
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
