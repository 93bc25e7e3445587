use crate::domain::codec::EncodedBalance;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ports::{
    OrderRepository, ProductRepository, Store, Transaction, TransactionBox, UserRepository,
};
use crate::domain::product::Product;
use crate::domain::user::UserAccount;
use crate::domain::{OrderId, ProductId, UserId};
use crate::error::{PaymentError, Result};
use ::rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Column Family for user rows (encoded balances).
pub const CF_USERS: &str = "users";
/// Column Family for products and their stock.
pub const CF_PRODUCTS: &str = "products";
/// Column Family for live (unpaid) orders.
pub const CF_ORDERS: &str = "orders";
/// Column Family for the history of settled orders.
pub const CF_PAID_ORDERS: &str = "paid_orders";
/// Column Family for counters.
pub const CF_META: &str = "meta";

const LAST_ORDER_ID: &[u8] = b"last_order_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Family {
    Users,
    Products,
    Orders,
    PaidOrders,
    Meta,
}

impl Family {
    fn name(self) -> &'static str {
        match self {
            Family::Users => CF_USERS,
            Family::Products => CF_PRODUCTS,
            Family::Orders => CF_ORDERS,
            Family::PaidOrders => CF_PAID_ORDERS,
            Family::Meta => CF_META,
        }
    }
}

fn storage_error(e: impl std::fmt::Display) -> PaymentError {
    PaymentError::persistence(format!("RocksDB error: {e}"))
}

fn cf_handle(db: &DB, family: Family) -> Result<&ColumnFamily> {
    db.cf_handle(family.name()).ok_or_else(|| {
        PaymentError::persistence(format!("{} column family not found", family.name()))
    })
}

/// A persistent store implementation using RocksDB.
///
/// Each entity lives in its own Column Family, keyed by its big-endian id and
/// serialized as JSON. Transactions are serialized through an async lock held from
/// `begin` to commit/rollback; staged writes land in a single `WriteBatch`, so a
/// commit is atomic and durable.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that all required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_USERS, CF_PRODUCTS, CF_ORDERS, CF_PAID_ORDERS, CF_META]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, cfs).map_err(storage_error)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }
}

#[async_trait]
impl Store for RocksDBStore {
    async fn begin(&self) -> Result<TransactionBox> {
        let guard = self.write_lock.clone().lock_owned().await;
        Ok(Box::new(RocksDBTransaction {
            db: self.db.clone(),
            _guard: guard,
            staged: BTreeMap::new(),
        }))
    }
}

pub struct RocksDBTransaction {
    db: Arc<DB>,
    _guard: OwnedMutexGuard<()>,
    /// `None` marks a staged delete.
    staged: BTreeMap<(Family, Vec<u8>), Option<Vec<u8>>>,
}

impl RocksDBTransaction {
    fn read_raw(&self, family: Family, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(staged) = self.staged.get(&(family, key.to_vec())) {
            return Ok(staged.clone());
        }
        let cf = cf_handle(&self.db, family)?;
        self.db.get_cf(cf, key).map_err(storage_error)
    }

    fn read<T: DeserializeOwned>(&self, family: Family, key: &[u8]) -> Result<Option<T>> {
        match self.read_raw(family, key)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| PaymentError::persistence(format!("Deserialization error: {e}"))),
            None => Ok(None),
        }
    }

    fn stage_put<T: Serialize>(&mut self, family: Family, key: Vec<u8>, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| PaymentError::persistence(format!("Serialization error: {e}")))?;
        self.staged.insert((family, key), Some(bytes));
        Ok(())
    }

    fn stage_delete(&mut self, family: Family, key: Vec<u8>) {
        self.staged.insert((family, key), None);
    }

    fn last_order_id(&self) -> Result<OrderId> {
        Ok(self.read(Family::Meta, LAST_ORDER_ID)?.unwrap_or(0))
    }
}

#[async_trait]
impl OrderRepository for RocksDBTransaction {
    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        self.read(Family::Orders, &id.to_be_bytes())
    }

    async fn insert_order(&mut self, order: Order) -> Result<()> {
        let key = order.id.to_be_bytes();
        if self.read_raw(Family::Orders, &key)?.is_some()
            || self.read_raw(Family::PaidOrders, &key)?.is_some()
        {
            return Err(PaymentError::persistence(format!(
                "order {} already exists",
                order.id
            )));
        }
        let last = self.last_order_id()?.max(order.id);
        self.stage_put(Family::Meta, LAST_ORDER_ID.to_vec(), &last)?;
        self.stage_put(Family::Orders, key.to_vec(), &order)
    }

    async fn next_order_id(&mut self) -> Result<OrderId> {
        self.last_order_id()?
            .checked_add(1)
            .ok_or_else(|| PaymentError::persistence("order ids exhausted"))
    }

    async fn delete_order_by_id_and_owner(&mut self, id: OrderId, owner: UserId) -> Result<u64> {
        let deletable = self
            .read::<Order>(Family::Orders, &id.to_be_bytes())?
            .is_some_and(|o| o.user_id == owner && o.status == OrderStatus::NotPaid);
        if deletable {
            self.stage_delete(Family::Orders, id.to_be_bytes().to_vec());
            debug!(order = id, "order row deleted");
            Ok(1)
        } else {
            Ok(0)
        }
    }

    async fn archive_paid_order(&mut self, order: Order) -> Result<()> {
        self.stage_put(Family::PaidOrders, order.id.to_be_bytes().to_vec(), &order)
    }

    async fn get_paid_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        self.read(Family::PaidOrders, &id.to_be_bytes())
    }
}

#[async_trait]
impl UserRepository for RocksDBTransaction {
    async fn get_user(&mut self, id: UserId) -> Result<Option<UserAccount>> {
        self.read(Family::Users, &id.to_be_bytes())
    }

    async fn insert_user(&mut self, user: UserAccount) -> Result<()> {
        let key = user.id.to_be_bytes();
        if self.read_raw(Family::Users, &key)?.is_some() {
            return Err(PaymentError::persistence(format!(
                "user {} already exists",
                user.id
            )));
        }
        self.stage_put(Family::Users, key.to_vec(), &user)
    }

    async fn user_name_taken(&mut self, user_name: &str) -> Result<bool> {
        let staged_match = self.staged.iter().any(|((family, _), value)| {
            *family == Family::Users
                && value
                    .as_deref()
                    .and_then(|bytes| serde_json::from_slice::<UserAccount>(bytes).ok())
                    .is_some_and(|u| u.user_name == user_name)
        });
        if staged_match {
            return Ok(true);
        }

        let cf = cf_handle(&self.db, Family::Users)?;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, value) = item.map_err(storage_error)?;
            if self.staged.contains_key(&(Family::Users, key.to_vec())) {
                continue;
            }
            let user: UserAccount = serde_json::from_slice(&value).map_err(|e| {
                PaymentError::persistence(format!("Failed to deserialize user: {e}"))
            })?;
            if user.user_name == user_name {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn update_balance(&mut self, id: UserId, balance: EncodedBalance) -> Result<()> {
        let mut user: UserAccount = self
            .read(Family::Users, &id.to_be_bytes())?
            .ok_or_else(|| PaymentError::persistence(format!("no user row {id} to update")))?;
        user.balance = balance;
        self.stage_put(Family::Users, id.to_be_bytes().to_vec(), &user)
    }
}

#[async_trait]
impl ProductRepository for RocksDBTransaction {
    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        self.read(Family::Products, &id.to_be_bytes())
    }

    async fn insert_product(&mut self, product: Product) -> Result<()> {
        let key = product.id.to_be_bytes();
        if self.read_raw(Family::Products, &key)?.is_some() {
            return Err(PaymentError::persistence(format!(
                "product {} already exists",
                product.id
            )));
        }
        self.stage_put(Family::Products, key.to_vec(), &product)
    }

    async fn update_stock(&mut self, id: ProductId, stock: i64) -> Result<()> {
        let mut product: Product = self
            .read(Family::Products, &id.to_be_bytes())?
            .ok_or_else(|| PaymentError::persistence(format!("no product row {id} to update")))?;
        product.stock = stock;
        self.stage_put(Family::Products, id.to_be_bytes().to_vec(), &product)
    }
}

#[async_trait]
impl Transaction for RocksDBTransaction {
    async fn commit(self: Box<Self>) -> Result<()> {
        let mut batch = WriteBatch::default();
        for ((family, key), value) in &self.staged {
            let cf = cf_handle(&self.db, *family).map_err(|e| {
                PaymentError::transaction(format!("commit aborted: {e}"))
            })?;
            match value {
                Some(bytes) => batch.put_cf(cf, key, bytes),
                None => batch.delete_cf(cf, key),
            }
        }
        self.db
            .write(batch)
            .map_err(|e| PaymentError::transaction(format!("RocksDB commit failed: {e}")))
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
