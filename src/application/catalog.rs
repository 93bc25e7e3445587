use crate::domain::money::Amount;
use crate::domain::ports::{ProductRepository, StoreBox, Transaction, UserRepository};
use crate::domain::product::Product;
use crate::domain::{ProductId, UserId};
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub id: ProductId,
    pub seller_id: UserId,
    pub name: String,
    pub price: Decimal,
    pub stock: i64,
}

/// Minimal product registration so sellers have something to sell.
pub struct CatalogService {
    store: StoreBox,
}

impl CatalogService {
    pub fn new(store: StoreBox) -> Self {
        Self { store }
    }

    pub async fn register(&self, request: NewProduct) -> Result<Product> {
        let mut tx = self.store.begin().await?;
        match Self::insert(tx.as_mut(), request).await {
            Ok(product) => {
                tx.commit().await?;
                info!(product = product.id, seller = product.seller_id, "product registered");
                Ok(product)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    async fn insert(tx: &mut dyn Transaction, request: NewProduct) -> Result<Product> {
        let price = Amount::new(request.price)?;
        if request.stock < 0 {
            return Err(PaymentError::ValidationError(
                "Initial stock must not be negative".to_string(),
            ));
        }
        if tx.get_user(request.seller_id).await?.is_none() {
            return Err(PaymentError::UserNotFound(request.seller_id));
        }
        if tx.get_product(request.id).await?.is_some() {
            return Err(PaymentError::ValidationError(format!(
                "product {} already exists",
                request.id
            )));
        }

        let product = Product {
            id: request.id,
            name: request.name,
            seller_id: request.seller_id,
            price: price.into(),
            stock: request.stock,
        };
        tx.insert_product(product.clone()).await?;
        Ok(product)
    }
}
