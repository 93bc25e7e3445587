use orderpay::application::accounts::AccountService;
use orderpay::application::catalog::{CatalogService, NewProduct};
use orderpay::application::orders::{NewOrder, OrderService};
use orderpay::domain::money::Money;
use orderpay::domain::ports::StoreBox;
use orderpay::infrastructure::in_memory::InMemoryStore;
use rust_decimal_macros::dec;
use std::collections::BTreeSet;
use std::sync::Arc;

const KEY: &str = "0123456789abcdef";

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_store_as_trait_object_across_tasks() {
    let store = InMemoryStore::new();
    let boxed = |store: &InMemoryStore| -> StoreBox { Box::new(store.clone()) };

    let accounts = AccountService::new(boxed(&store), Money::new(dec!(10000)));
    for (id, name) in [(1, "buyer"), (2, "seller")] {
        accounts.open(id, name, KEY).await.unwrap();
    }
    CatalogService::new(boxed(&store))
        .register(NewProduct {
            id: 1,
            seller_id: 2,
            name: "lamp".to_string(),
            price: dec!(12.50),
            stock: 100,
        })
        .await
        .unwrap();

    let orders = Arc::new(OrderService::new(boxed(&store)));
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let orders = Arc::clone(&orders);
            tokio::spawn(async move {
                orders
                    .place(
                        1,
                        NewOrder {
                            product_id: 1,
                            address_id: 0,
                            quantity: 1,
                        },
                    )
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut ids = BTreeSet::new();
    for handle in handles {
        let order = handle.await.unwrap();
        assert_eq!(order.seller_id, 2);
        assert_eq!(order.unit_price, Money::new(dec!(12.50)));
        ids.insert(order.id);
    }
    assert_eq!(ids, (1..=10).collect());
}
