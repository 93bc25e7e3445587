use crate::config::{SettlementConfig, StockPolicy};
use crate::domain::codec::BalanceCodec;
use crate::domain::money::Money;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ports::{
    OrderRepository, ProductRepository, StoreBox, Transaction, UserRepository,
};
use crate::domain::{OrderId, UserId};
use crate::error::{PaymentError, Result};
use std::fmt;
use tracing::{error, info, warn};

/// Progress of a single settlement. Reported when a settlement aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementStage {
    Start,
    OrderLoaded,
    OrderRetired,
    BuyerLoaded,
    SufficiencyChecked,
    BuyerDebited,
    SellerLoaded,
    SellerCredited,
    StockDecremented,
    Archived,
}

impl fmt::Display for SettlementStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Outcome of a committed settlement.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    /// The settled order, as archived (status `Paid`).
    pub order: Order,
    pub total: Money,
    pub buyer_balance: Money,
    pub seller_balance: Money,
    pub remaining_stock: i64,
}

/// Pays orders: moves the order total from buyer to seller, decrements stock and
/// retires the order, all inside one store transaction.
///
/// Shared across tasks behind an `Arc`; every call opens its own transaction and
/// builds its own codec.
pub struct SettlementService {
    store: StoreBox,
    config: SettlementConfig,
}

impl SettlementService {
    pub fn new(store: StoreBox, config: SettlementConfig) -> Self {
        Self { store, config }
    }

    /// Settles `order_id` on behalf of `buyer_id`, decoding and re-encoding balances
    /// with `key`.
    ///
    /// Either every effect (two balances, one stock count, the order row) is
    /// committed, or none is.
    pub async fn pay(&self, order_id: OrderId, buyer_id: UserId, key: &str) -> Result<Receipt> {
        let codec = BalanceCodec::new(key)?;
        let mut tx = self.store.begin().await.inspect_err(|e| {
            error!(order = order_id, error = %e, "failed to begin settlement transaction");
        })?;

        let mut stage = SettlementStage::Start;
        let settled = self
            .settle(tx.as_mut(), &codec, order_id, buyer_id, &mut stage)
            .await;

        let receipt = match settled {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(
                    order = order_id,
                    buyer = buyer_id,
                    %stage,
                    kind = ?e.kind(),
                    "settlement aborted: {e}"
                );
                if let Err(rollback) = tx.rollback().await {
                    error!(order = order_id, error = %rollback, "settlement rollback failed");
                    return Err(PaymentError::transaction(format!(
                        "rollback after '{e}' failed: {rollback}"
                    )));
                }
                return Err(e);
            }
        };

        // Once issued, the commit runs to completion even if the caller goes away.
        let committed = tokio::spawn(async move { tx.commit().await })
            .await
            .map_err(|e| PaymentError::transaction(format!("commit task failed: {e}")))
            .and_then(|result| result);
        if let Err(e) = committed {
            error!(order = order_id, error = %e, "settlement commit failed");
            return Err(e);
        }

        info!(
            order = order_id,
            order_num = %receipt.order.order_num,
            buyer = buyer_id,
            seller = receipt.order.seller_id,
            product = receipt.order.product_id,
            quantity = receipt.order.quantity,
            "order paid"
        );
        Ok(receipt)
    }

    async fn settle(
        &self,
        tx: &mut dyn Transaction,
        codec: &BalanceCodec,
        order_id: OrderId,
        buyer_id: UserId,
        stage: &mut SettlementStage,
    ) -> Result<Receipt> {
        let mut order = tx
            .get_order(order_id)
            .await?
            .ok_or(PaymentError::OrderNotFound(order_id))?;
        *stage = SettlementStage::OrderLoaded;

        // Retire first: a concurrent settlement of the same order finds nothing to
        // delete and aborts before touching any balance.
        if tx.delete_order_by_id_and_owner(order.id, buyer_id).await? == 0 {
            return Err(PaymentError::OrderDeleteFailed {
                order: order.id,
                buyer: buyer_id,
            });
        }
        *stage = SettlementStage::OrderRetired;

        let total = order.total()?;

        let buyer = tx
            .get_user(buyer_id)
            .await?
            .ok_or(PaymentError::UserNotFound(buyer_id))?;
        let buyer_before = codec
            .decode(&buyer.balance)
            .map_err(|source| PaymentError::LedgerDecode {
                user: buyer.id,
                source,
            })?;
        *stage = SettlementStage::BuyerLoaded;

        if buyer_before < total {
            return Err(PaymentError::InsufficientFunds { required: total });
        }
        *stage = SettlementStage::SufficiencyChecked;

        let debited = buyer_before.checked_sub(total)?;
        tx.update_balance(buyer.id, codec.encode(debited)).await?;
        *stage = SettlementStage::BuyerDebited;

        // Loaded after the debit so a self-purchase nets to zero.
        let seller = tx
            .get_user(order.seller_id)
            .await?
            .ok_or(PaymentError::UserNotFound(order.seller_id))?;
        let seller_before = codec
            .decode(&seller.balance)
            .map_err(|source| PaymentError::LedgerDecode {
                user: seller.id,
                source,
            })?;
        *stage = SettlementStage::SellerLoaded;

        let seller_balance = seller_before.checked_add(total)?;
        tx.update_balance(seller.id, codec.encode(seller_balance))
            .await?;
        *stage = SettlementStage::SellerCredited;
        // The buyer's committed balance; a self-purchase gets its credit back.
        let buyer_balance = if seller.id == buyer.id {
            seller_balance
        } else {
            debited
        };

        let product = tx
            .get_product(order.product_id)
            .await?
            .ok_or(PaymentError::ProductNotFound(order.product_id))?;
        let remaining_stock = product.stock_after(order.quantity);
        if remaining_stock < 0 && self.config.stock_policy == StockPolicy::RejectShortfall {
            return Err(PaymentError::InsufficientStock {
                product: product.id,
                available: product.stock,
                requested: order.quantity,
            });
        }
        tx.update_stock(product.id, remaining_stock).await?;
        *stage = SettlementStage::StockDecremented;

        order.status = OrderStatus::Paid;
        tx.archive_paid_order(order.clone()).await?;
        *stage = SettlementStage::Archived;

        Ok(Receipt {
            order,
            total,
            buyer_balance,
            seller_balance,
            remaining_stock,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::codec::EncodedBalance;
    use crate::domain::ports::{Store, TransactionBox};
    use crate::domain::product::Product;
    use crate::domain::user::UserAccount;
    use crate::error::ErrorKind;
    use crate::infrastructure::in_memory::InMemoryStore;
    use rust_decimal_macros::dec;

    const KEY: &str = "0123456789abcdef";
    const BUYER: UserId = 1;
    const SELLER: UserId = 2;

    async fn seed(store: &InMemoryStore, buyer: Money, stock: i64) {
        let codec = BalanceCodec::new(KEY).unwrap();
        let mut tx = store.begin().await.unwrap();
        tx.insert_user(UserAccount::new(BUYER, "buyer", codec.encode(buyer)))
            .await
            .unwrap();
        tx.insert_user(UserAccount::new(SELLER, "seller", codec.encode(Money::ZERO)))
            .await
            .unwrap();
        tx.insert_product(Product {
            id: 1,
            name: "kettle".to_string(),
            seller_id: SELLER,
            price: Money::new(dec!(50.00)),
            stock,
        })
        .await
        .unwrap();
        let order = Order::new(1, BUYER, SELLER, 1, 1, 2, Money::new(dec!(50.00))).unwrap();
        tx.insert_order(order).await.unwrap();
        tx.commit().await.unwrap();
    }

    async fn balance(tx: &mut TransactionBox, id: UserId) -> Money {
        let codec = BalanceCodec::new(KEY).unwrap();
        let user = tx.get_user(id).await.unwrap().unwrap();
        codec.decode(&user.balance).unwrap()
    }

    fn service(store: &InMemoryStore) -> SettlementService {
        SettlementService::new(Box::new(store.clone()), SettlementConfig::default())
    }

    #[tokio::test]
    async fn test_pay_moves_funds_and_stock() {
        let store = InMemoryStore::new();
        seed(&store, Money::new(dec!(10000.00)), 10).await;

        let receipt = service(&store).pay(1, BUYER, KEY).await.unwrap();
        assert_eq!(receipt.total, Money::new(dec!(100.00)));
        assert_eq!(receipt.buyer_balance, Money::new(dec!(9900.00)));
        assert_eq!(receipt.seller_balance, Money::new(dec!(100.00)));
        assert_eq!(receipt.remaining_stock, 8);
        assert!(receipt.order.is_paid());

        let mut tx = store.begin().await.unwrap();
        assert_eq!(balance(&mut tx, BUYER).await, Money::new(dec!(9900.00)));
        assert_eq!(balance(&mut tx, SELLER).await, Money::new(dec!(100.00)));
        assert_eq!(tx.get_product(1).await.unwrap().unwrap().stock, 8);
        assert!(tx.get_order(1).await.unwrap().is_none());
        assert!(tx.get_paid_order(1).await.unwrap().unwrap().is_paid());
    }

    #[tokio::test]
    async fn test_insufficient_funds_leaves_state_untouched() {
        let store = InMemoryStore::new();
        seed(&store, Money::new(dec!(50.00)), 10).await;

        let err = service(&store).pay(1, BUYER, KEY).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);

        let mut tx = store.begin().await.unwrap();
        assert_eq!(balance(&mut tx, BUYER).await, Money::new(dec!(50.00)));
        assert_eq!(balance(&mut tx, SELLER).await, Money::ZERO);
        assert_eq!(tx.get_product(1).await.unwrap().unwrap().stock, 10);
        assert!(tx.get_order(1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_invalid_key_fails_before_any_read() {
        let store = InMemoryStore::new();
        seed(&store, Money::new(dec!(10000)), 10).await;

        let err = service(&store).pay(1, BUYER, "too-short").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LedgerDecodeError);

        let mut tx = store.begin().await.unwrap();
        assert!(tx.get_order(1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_wrong_key_aborts_with_decode_error() {
        let store = InMemoryStore::new();
        seed(&store, Money::new(dec!(10000)), 10).await;

        let err = service(&store)
            .pay(1, BUYER, "fedcba9876543210")
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::LedgerDecode { user: BUYER, .. }));

        let mut tx = store.begin().await.unwrap();
        assert!(tx.get_order(1).await.unwrap().is_some());
        assert_eq!(balance(&mut tx, BUYER).await, Money::new(dec!(10000)));
    }

    #[tokio::test]
    async fn test_other_buyer_cannot_retire_order() {
        let store = InMemoryStore::new();
        seed(&store, Money::new(dec!(10000)), 10).await;

        let err = service(&store).pay(1, SELLER, KEY).await.unwrap_err();
        assert!(matches!(
            err,
            PaymentError::OrderDeleteFailed { order: 1, buyer: SELLER }
        ));
    }

    #[tokio::test]
    async fn test_stock_policy() {
        let store = InMemoryStore::new();
        seed(&store, Money::new(dec!(10000)), 1).await;

        let strict = SettlementService::new(
            Box::new(store.clone()),
            SettlementConfig::default().with_stock_policy(StockPolicy::RejectShortfall),
        );
        let err = strict.pay(1, BUYER, KEY).await.unwrap_err();
        assert!(matches!(
            err,
            PaymentError::InsufficientStock { product: 1, available: 1, requested: 2 }
        ));

        let receipt = service(&store).pay(1, BUYER, KEY).await.unwrap();
        assert_eq!(receipt.remaining_stock, -1);
    }

    #[tokio::test]
    async fn test_self_purchase_nets_to_zero() {
        let store = InMemoryStore::new();
        let codec = BalanceCodec::new(KEY).unwrap();
        let mut tx = store.begin().await.unwrap();
        tx.insert_user(UserAccount::new(7, "both", codec.encode(Money::new(dec!(30)))))
            .await
            .unwrap();
        tx.insert_product(Product {
            id: 3,
            name: "pen".to_string(),
            seller_id: 7,
            price: Money::new(dec!(10)),
            stock: 5,
        })
        .await
        .unwrap();
        tx.insert_order(Order::new(1, 7, 7, 3, 0, 3, Money::new(dec!(10))).unwrap())
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let receipt = service(&store).pay(1, 7, KEY).await.unwrap();
        assert_eq!(receipt.seller_balance, Money::new(dec!(30)));
        assert_eq!(receipt.buyer_balance, Money::new(dec!(30)));

        let mut tx = store.begin().await.unwrap();
        let user = tx.get_user(7).await.unwrap().unwrap();
        assert_eq!(codec.decode(&user.balance).unwrap(), Money::new(dec!(30)));
        assert_ne!(user.balance, EncodedBalance(String::new()));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(SettlementStage::BuyerDebited.to_string(), "BuyerDebited");
    }
}
