#![allow(dead_code)]

use async_trait::async_trait;
use orderpay::domain::codec::{BalanceCodec, EncodedBalance};
use orderpay::domain::money::Money;
use orderpay::domain::order::Order;
use orderpay::domain::ports::{
    OrderRepository, ProductRepository, Store, Transaction, TransactionBox, UserRepository,
};
use orderpay::domain::product::Product;
use orderpay::domain::user::UserAccount;
use orderpay::domain::{OrderId, ProductId, UserId};
use orderpay::error::{PaymentError, Result};
use orderpay::infrastructure::in_memory::InMemoryStore;

pub const KEY: &str = "0123456789abcdef";
pub const BUYER: UserId = 1;
pub const SELLER: UserId = 2;
pub const PRODUCT: ProductId = 1;
pub const ORDER: OrderId = 1;

pub struct Fixture {
    pub buyer_balance: Money,
    pub seller_balance: Money,
    pub unit_price: Money,
    pub quantity: u32,
    pub stock: i64,
}

/// Seeds a buyer, a seller, one product and one unpaid order for that product.
pub async fn seed(store: &impl Store, fixture: &Fixture) {
    let codec = BalanceCodec::new(KEY).unwrap();
    let mut tx = store.begin().await.unwrap();
    tx.insert_user(UserAccount::new(
        BUYER,
        "buyer",
        codec.encode(fixture.buyer_balance),
    ))
    .await
    .unwrap();
    tx.insert_user(UserAccount::new(
        SELLER,
        "seller",
        codec.encode(fixture.seller_balance),
    ))
    .await
    .unwrap();
    tx.insert_product(Product {
        id: PRODUCT,
        name: "teapot".to_string(),
        seller_id: SELLER,
        price: fixture.unit_price,
        stock: fixture.stock,
    })
    .await
    .unwrap();
    let order = Order::new(
        ORDER,
        BUYER,
        SELLER,
        PRODUCT,
        1,
        fixture.quantity,
        fixture.unit_price,
    )
    .unwrap();
    tx.insert_order(order).await.unwrap();
    tx.commit().await.unwrap();
}

/// Everything a settlement may touch, decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub buyer: Option<Money>,
    pub seller: Option<Money>,
    pub stock: Option<i64>,
    pub order: Option<Order>,
    pub paid_order: Option<Order>,
}

pub async fn snapshot(store: &impl Store) -> Snapshot {
    let codec = BalanceCodec::new(KEY).unwrap();
    let mut tx = store.begin().await.unwrap();
    let buyer = tx
        .get_user(BUYER)
        .await
        .unwrap()
        .map(|u| codec.decode(&u.balance).unwrap());
    let seller = tx
        .get_user(SELLER)
        .await
        .unwrap()
        .map(|u| codec.decode(&u.balance).unwrap());
    let stock = tx.get_product(PRODUCT).await.unwrap().map(|p| p.stock);
    let order = tx.get_order(ORDER).await.unwrap();
    let paid_order = tx.get_paid_order(ORDER).await.unwrap();
    tx.rollback().await.unwrap();
    Snapshot {
        buyer,
        seller,
        stock,
        order,
        paid_order,
    }
}

/// Where a [`FaultyStore`] makes its transactions fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Fail the n-th (1-based) balance update.
    UpdateBalance(usize),
    UpdateStock,
    ArchiveOrder,
    Commit,
    /// Never finish the stock update.
    StallStock,
}

/// Wraps an in-memory store and injects one failure into every transaction.
#[derive(Clone)]
pub struct FaultyStore {
    inner: InMemoryStore,
    fault: Fault,
}

impl FaultyStore {
    pub fn new(inner: InMemoryStore, fault: Fault) -> Self {
        Self { inner, fault }
    }
}

#[async_trait]
impl Store for FaultyStore {
    async fn begin(&self) -> Result<TransactionBox> {
        Ok(Box::new(FaultyTransaction {
            inner: self.inner.begin().await?,
            fault: self.fault,
            balance_updates: 0,
        }))
    }
}

struct FaultyTransaction {
    inner: TransactionBox,
    fault: Fault,
    balance_updates: usize,
}

fn injected(what: &str) -> PaymentError {
    PaymentError::persistence(format!("injected {what} failure"))
}

#[async_trait]
impl OrderRepository for FaultyTransaction {
    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        self.inner.get_order(id).await
    }

    async fn insert_order(&mut self, order: Order) -> Result<()> {
        self.inner.insert_order(order).await
    }

    async fn next_order_id(&mut self) -> Result<OrderId> {
        self.inner.next_order_id().await
    }

    async fn delete_order_by_id_and_owner(&mut self, id: OrderId, owner: UserId) -> Result<u64> {
        self.inner.delete_order_by_id_and_owner(id, owner).await
    }

    async fn archive_paid_order(&mut self, order: Order) -> Result<()> {
        if self.fault == Fault::ArchiveOrder {
            return Err(injected("archive"));
        }
        self.inner.archive_paid_order(order).await
    }

    async fn get_paid_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        self.inner.get_paid_order(id).await
    }
}

#[async_trait]
impl UserRepository for FaultyTransaction {
    async fn get_user(&mut self, id: UserId) -> Result<Option<UserAccount>> {
        self.inner.get_user(id).await
    }

    async fn insert_user(&mut self, user: UserAccount) -> Result<()> {
        self.inner.insert_user(user).await
    }

    async fn user_name_taken(&mut self, user_name: &str) -> Result<bool> {
        self.inner.user_name_taken(user_name).await
    }

    async fn update_balance(&mut self, id: UserId, balance: EncodedBalance) -> Result<()> {
        self.balance_updates += 1;
        if self.fault == Fault::UpdateBalance(self.balance_updates) {
            return Err(injected("balance update"));
        }
        self.inner.update_balance(id, balance).await
    }
}

#[async_trait]
impl ProductRepository for FaultyTransaction {
    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        self.inner.get_product(id).await
    }

    async fn insert_product(&mut self, product: Product) -> Result<()> {
        self.inner.insert_product(product).await
    }

    async fn update_stock(&mut self, id: ProductId, stock: i64) -> Result<()> {
        match self.fault {
            Fault::UpdateStock => Err(injected("stock update")),
            Fault::StallStock => std::future::pending().await,
            _ => self.inner.update_stock(id, stock).await,
        }
    }
}

#[async_trait]
impl Transaction for FaultyTransaction {
    async fn commit(self: Box<Self>) -> Result<()> {
        if self.fault == Fault::Commit {
            self.inner.rollback().await?;
            return Err(PaymentError::transaction("injected commit failure"));
        }
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.inner.rollback().await
    }
}
