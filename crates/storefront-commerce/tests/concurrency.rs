mod common;

use common::*;
use std::sync::Arc;
use storefront_commerce::prelude::*;

async fn race(shop: &Arc<Storefront>, orders: Vec<PlaceOrder>) -> Vec<Result<OrderReceipt, CommerceError>> {
    let handles: Vec<_> = orders
        .into_iter()
        .map(|request| {
            let shop = Arc::clone(shop);
            tokio::spawn(async move { shop.place_order(&request).await })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.expect("task panicked"));
    }
    results
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_buyers_for_the_remaining_stock() {
    for fx in backends().await {
        general_category(&fx.shop).await;
        simple_product(&fx.shop, "p", 10_000, 3).await;

        let results = race(&fx.shop, vec![order_for(&[("p", 3)]), order_for(&[("p", 3)])]).await;

        let placed = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(placed, 1, "{}: {:?}", fx.name, results);
        let rejected = results
            .iter()
            .find_map(|r| r.as_ref().err())
            .expect("one order fails");
        assert!(
            matches!(rejected, CommerceError::OutOfStock { .. }),
            "{}: {:?}",
            fx.name,
            rejected
        );
        assert_eq!(stock_of(&fx.shop, "p").await, 0, "{}", fx.name);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_buyers_never_oversell() {
    for fx in backends().await {
        general_category(&fx.shop).await;
        simple_product(&fx.shop, "p", 500, 10).await;
        simple_product(&fx.shop, "q", 700, 25).await;

        let orders: Vec<PlaceOrder> = (0..24)
            .map(|i| order_for(&[("p", 1 + i % 2), ("q", 1)]))
            .collect();
        let results = race(&fx.shop, orders).await;

        let mut sold_p = 0;
        let mut sold_q = 0;
        for result in &results {
            match result {
                Ok(receipt) => {
                    let order = fx.shop.get_order(&receipt.order_id).await.unwrap();
                    assert_eq!(order.items_total().unwrap(), order.total);
                    sold_p += order.items[0].quantity;
                    sold_q += order.items[1].quantity;
                }
                Err(err) => assert!(
                    matches!(err, CommerceError::OutOfStock { .. }),
                    "{}: {:?}",
                    fx.name,
                    err
                ),
            }
        }

        let left_p = stock_of(&fx.shop, "p").await;
        let left_q = stock_of(&fx.shop, "q").await;
        assert!(left_p >= 0 && left_q >= 0, "{}", fx.name);
        assert_eq!(left_p + sold_p, 10, "{}", fx.name);
        assert_eq!(left_q + sold_q, 25, "{}", fx.name);
        assert!(sold_p > 0, "{}", fx.name);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cancels_restore_once() {
    for fx in backends().await {
        general_category(&fx.shop).await;
        simple_product(&fx.shop, "p", 1_000, 5).await;
        let id = fx
            .shop
            .place_order(&order_for(&[("p", 4)]))
            .await
            .unwrap()
            .order_id;

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shop = Arc::clone(&fx.shop);
                let id = id.clone();
                tokio::spawn(async move { shop.cancel_order(&id).await })
            })
            .collect();

        let mut cancelled = 0;
        for handle in handles {
            match handle.await.expect("task panicked") {
                Ok(_) => cancelled += 1,
                Err(err) => assert!(
                    matches!(err, CommerceError::InvalidTransition { .. }),
                    "{}: {:?}",
                    fx.name,
                    err
                ),
            }
        }
        assert_eq!(cancelled, 1, "{}", fx.name);
        assert_eq!(stock_of(&fx.shop, "p").await, 5, "{}", fx.name);
    }
}
