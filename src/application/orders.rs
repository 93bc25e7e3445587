use crate::domain::order::Order;
use crate::domain::ports::{
    OrderRepository, ProductRepository, StoreBox, Transaction, UserRepository,
};
use crate::domain::{AddressId, OrderId, ProductId, UserId};
use crate::error::{PaymentError, Result};
use tracing::info;

/// What a buyer asks for when placing an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrder {
    pub product_id: ProductId,
    pub address_id: AddressId,
    pub quantity: u32,
}

/// Placement and cancellation of unpaid orders.
pub struct OrderService {
    store: StoreBox,
}

impl OrderService {
    pub fn new(store: StoreBox) -> Self {
        Self { store }
    }

    /// Places an unpaid order; seller and unit price are copied from the product.
    pub async fn place(&self, buyer_id: UserId, request: NewOrder) -> Result<Order> {
        let mut tx = self.store.begin().await?;
        match Self::insert(tx.as_mut(), buyer_id, request).await {
            Ok(order) => {
                tx.commit().await?;
                info!(
                    order = order.id,
                    order_num = %order.order_num,
                    buyer = buyer_id,
                    product = order.product_id,
                    "order placed"
                );
                Ok(order)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    async fn insert(
        tx: &mut dyn Transaction,
        buyer_id: UserId,
        request: NewOrder,
    ) -> Result<Order> {
        if tx.get_user(buyer_id).await?.is_none() {
            return Err(PaymentError::UserNotFound(buyer_id));
        }
        let product = tx
            .get_product(request.product_id)
            .await?
            .ok_or(PaymentError::ProductNotFound(request.product_id))?;
        if tx.get_user(product.seller_id).await?.is_none() {
            return Err(PaymentError::UserNotFound(product.seller_id));
        }

        let id = tx.next_order_id().await?;
        let order = Order::new(
            id,
            buyer_id,
            product.seller_id,
            product.id,
            request.address_id,
            request.quantity,
            product.price,
        )?;
        tx.insert_order(order.clone()).await?;
        Ok(order)
    }

    /// Cancels an unpaid order owned by `buyer_id`.
    pub async fn cancel(&self, order_id: OrderId, buyer_id: UserId) -> Result<()> {
        let mut tx = self.store.begin().await?;
        let outcome = match tx.get_order(order_id).await {
            Ok(None) => Err(PaymentError::OrderNotFound(order_id)),
            Ok(Some(_)) => match tx.delete_order_by_id_and_owner(order_id, buyer_id).await {
                Ok(0) => Err(PaymentError::OrderDeleteFailed {
                    order: order_id,
                    buyer: buyer_id,
                }),
                Ok(_) => Ok(()),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                tx.commit().await?;
                info!(order = order_id, buyer = buyer_id, "order cancelled");
                Ok(())
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    /// Returns the unpaid order `order_id` if it belongs to `buyer_id`.
    pub async fn show(&self, order_id: OrderId, buyer_id: UserId) -> Result<Order> {
        let mut tx = self.store.begin().await?;
        let order = tx.get_order(order_id).await;
        tx.rollback().await?;
        order?
            .filter(|o| o.user_id == buyer_id)
            .ok_or(PaymentError::OrderNotFound(order_id))
    }
}
