mod common;

use common::*;
use storefront_commerce::prelude::*;

#[tokio::test]
async fn test_last_unit_sells_once() {
    for fx in backends().await {
        general_category(&fx.shop).await;
        simple_product(&fx.shop, "p", 10_000, 1).await;

        let receipt = fx.shop.place_order(&order_for(&[("p", 1)])).await.unwrap();
        assert_eq!(receipt.total, rub(10_000), "{}", fx.name);
        assert_eq!(receipt.status, OrderStatus::Pending);
        assert!(receipt.order_number.starts_with("ORD-"));
        assert_eq!(stock_of(&fx.shop, "p").await, 0, "{}", fx.name);

        let err = fx.shop.place_order(&order_for(&[("p", 1)])).await.unwrap_err();
        assert!(
            matches!(err, CommerceError::OutOfStock { available: 0, requested: 1, .. }),
            "{}: {:?}",
            fx.name,
            err
        );
        assert_eq!(stock_of(&fx.shop, "p").await, 0, "{}", fx.name);
    }
}

#[tokio::test]
async fn test_two_line_order_and_cancel() {
    for fx in backends().await {
        general_category(&fx.shop).await;
        simple_product(&fx.shop, "a", 5_000, 5).await;
        simple_product(&fx.shop, "b", 3_000, 5).await;

        let receipt = fx
            .shop
            .place_order(&order_for(&[("a", 2), ("b", 1)]))
            .await
            .unwrap();
        assert_eq!(receipt.total, rub(13_000), "{}", fx.name);

        let order = fx.shop.get_order(&receipt.order_id).await.unwrap();
        let totals: Vec<i64> = order.items.iter().map(|i| i.total.amount_cents).collect();
        assert_eq!(totals, vec![10_000, 3_000], "{}", fx.name);
        assert_eq!(order.items[0].product_name, "a");
        assert_eq!(order.items[1].sku, "SKU-b");
        assert_eq!(stock_of(&fx.shop, "a").await, 3);
        assert_eq!(stock_of(&fx.shop, "b").await, 4);

        let cancelled = fx.shop.cancel_order(&receipt.order_id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled, "{}", fx.name);
        assert_eq!(stock_of(&fx.shop, "a").await, 5, "{}", fx.name);
        assert_eq!(stock_of(&fx.shop, "b").await, 5, "{}", fx.name);

        let again = fx.shop.cancel_order(&receipt.order_id).await;
        assert!(matches!(again, Err(CommerceError::InvalidTransition { .. })));
        assert_eq!(stock_of(&fx.shop, "a").await, 5, "{}", fx.name);
    }
}

#[tokio::test]
async fn test_total_equals_sum_of_items() {
    for fx in backends().await {
        general_category(&fx.shop).await;
        simple_product(&fx.shop, "a", 1_999, 100).await;
        simple_product(&fx.shop, "b", 333, 100).await;
        simple_product(&fx.shop, "c", 125_050, 100).await;

        for lines in [
            vec![("a", 3)],
            vec![("a", 1), ("b", 7)],
            vec![("c", 2), ("b", 1), ("a", 9)],
        ] {
            let receipt = fx.shop.place_order(&order_for(&lines)).await.unwrap();
            let order = fx.shop.get_order(&receipt.order_id).await.unwrap();
            assert_eq!(order.items_total().unwrap(), order.total, "{}", fx.name);
            assert_eq!(order.total, receipt.total);
            for item in &order.items {
                assert_eq!(item.total.amount_cents, item.price.amount_cents * item.quantity);
            }
        }
    }
}

#[tokio::test]
async fn test_failed_line_rolls_back_whole_order() {
    for fx in backends().await {
        general_category(&fx.shop).await;
        simple_product(&fx.shop, "a", 1_000, 5).await;
        simple_product(&fx.shop, "b", 1_000, 1).await;

        let err = fx
            .shop
            .place_order(&order_for(&[("a", 2), ("b", 2)]))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::OutOfStock { .. }), "{}", fx.name);
        assert_eq!(stock_of(&fx.shop, "a").await, 5, "{}", fx.name);
        assert_eq!(stock_of(&fx.shop, "b").await, 1, "{}", fx.name);

        let orders = fx.shop.list_orders(&OrderListQuery::new()).await.unwrap();
        assert!(orders.is_empty(), "{}", fx.name);
    }
}

#[tokio::test]
async fn test_duplicate_lines_are_merged_before_stock_check() {
    for fx in backends().await {
        general_category(&fx.shop).await;
        simple_product(&fx.shop, "a", 1_000, 1).await;

        let err = fx
            .shop
            .place_order(&order_for(&[("a", 1), ("a", 1)]))
            .await
            .unwrap_err();
        assert!(
            matches!(err, CommerceError::OutOfStock { requested: 2, .. }),
            "{}",
            fx.name
        );
        assert_eq!(stock_of(&fx.shop, "a").await, 1);
    }
}

#[tokio::test]
async fn test_merged_quantity_overflow_is_a_validation_error() {
    let mut config = StorefrontConfig::default();
    config.orders.max_quantity_per_item = i64::MAX;
    for fx in backends_with(config).await {
        general_category(&fx.shop).await;
        simple_product(&fx.shop, "p", 1_000, 5).await;

        let err = fx
            .shop
            .place_order(&order_for(&[("p", i64::MAX), ("p", i64::MAX)]))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)), "{}: {:?}", fx.name, err);
        assert_eq!(stock_of(&fx.shop, "p").await, 5, "{}", fx.name);
    }
}

#[tokio::test]
async fn test_unavailable_and_missing_products() {
    for fx in backends().await {
        general_category(&fx.shop).await;
        simple_product(&fx.shop, "a", 1_000, 5).await;
        fx.shop
            .set_product_availability(&ProductId::new("a"), false)
            .await
            .unwrap();

        let err = fx.shop.place_order(&order_for(&[("a", 1)])).await.unwrap_err();
        assert!(matches!(err, CommerceError::ProductUnavailable(_)), "{}", fx.name);

        let err = fx.shop.place_order(&order_for(&[("ghost", 1)])).await.unwrap_err();
        assert!(matches!(err, CommerceError::ProductUnavailable(_)), "{}", fx.name);
        assert_eq!(stock_of(&fx.shop, "a").await, 5);
    }
}

#[tokio::test]
async fn test_validation_errors_name_fields() {
    for fx in backends().await {
        let request = PlaceOrder::new(
            CustomerInfo::new(" ", "ivan at example", "12-34"),
            vec![OrderLine::new("a", 0)],
        );
        match fx.shop.place_order(&request).await {
            Err(CommerceError::Validation(errors)) => {
                for field in ["name", "email", "phone", "items[0].quantity"] {
                    assert!(errors.has(field), "{}: missing {}", fx.name, field);
                }
            }
            other => panic!("{}: unexpected result: {:?}", fx.name, other),
        }
    }
}

#[tokio::test]
async fn test_item_prices_are_snapshots() {
    for fx in backends().await {
        general_category(&fx.shop).await;
        simple_product(&fx.shop, "a", 1_000, 5).await;
        let receipt = fx.shop.place_order(&order_for(&[("a", 2)])).await.unwrap();

        fx.shop
            .set_product_price(&ProductId::new("a"), rub(9_999))
            .await
            .unwrap();

        let order = fx.shop.get_order(&receipt.order_id).await.unwrap();
        assert_eq!(order.items[0].price, rub(1_000), "{}", fx.name);
        assert_eq!(order.total, rub(2_000), "{}", fx.name);
    }
}

#[tokio::test]
async fn test_commit_rejects_stale_price() {
    for fx in backends().await {
        general_category(&fx.shop).await;
        simple_product(&fx.shop, "a", 1_000, 5).await;
        let receipt = fx.shop.place_order(&order_for(&[("a", 1)])).await.unwrap();

        let mut stale = fx.shop.get_order(&receipt.order_id).await.unwrap();
        stale.id = OrderId::generate();
        stale.order_number = Order::generate_order_number();
        stale.items[0].id = OrderItemId::generate();
        stale.items[0].order_id = stale.id.clone();
        stale.items[0].price = rub(900);

        let err = fx.shop.store().commit_order(&stale).await.unwrap_err();
        assert!(matches!(err, CommerceError::ConcurrencyConflict(_)), "{}: {:?}", fx.name, err);
        assert_eq!(stock_of(&fx.shop, "a").await, 4, "{}", fx.name);
    }
}

#[tokio::test]
async fn test_commit_rejects_duplicate_order_number() {
    for fx in backends().await {
        general_category(&fx.shop).await;
        simple_product(&fx.shop, "a", 1_000, 5).await;
        let receipt = fx.shop.place_order(&order_for(&[("a", 1)])).await.unwrap();

        let mut copy = fx.shop.get_order(&receipt.order_id).await.unwrap();
        copy.id = OrderId::generate();
        copy.items[0].id = OrderItemId::generate();
        copy.items[0].order_id = copy.id.clone();

        let err = fx.shop.store().commit_order(&copy).await.unwrap_err();
        assert!(matches!(err, CommerceError::DuplicateKey { .. }), "{}: {:?}", fx.name, err);
        assert_eq!(stock_of(&fx.shop, "a").await, 4, "{}", fx.name);
    }
}

#[tokio::test]
async fn test_status_transitions() {
    for fx in backends().await {
        general_category(&fx.shop).await;
        simple_product(&fx.shop, "a", 1_000, 5).await;
        let id = fx
            .shop
            .place_order(&order_for(&[("a", 2)]))
            .await
            .unwrap()
            .order_id;

        let skip = fx.shop.set_order_status(&id, OrderStatus::Processing).await;
        assert!(matches!(skip, Err(CommerceError::InvalidTransition { .. })), "{}", fx.name);
        let same = fx.shop.set_order_status(&id, OrderStatus::Pending).await;
        assert!(matches!(same, Err(CommerceError::InvalidTransition { .. })));

        for next in [
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
        ] {
            let order = fx.shop.set_order_status(&id, next).await.unwrap();
            assert_eq!(order.status, next, "{}", fx.name);
        }

        let cancel = fx.shop.cancel_order(&id).await;
        assert!(matches!(cancel, Err(CommerceError::InvalidTransition { .. })), "{}", fx.name);
        assert_eq!(stock_of(&fx.shop, "a").await, 3, "{}", fx.name);

        let delivered = fx.shop.set_order_status(&id, OrderStatus::Delivered).await.unwrap();
        assert!(delivered.status.is_terminal());
        let cancel = fx.shop.set_order_status(&id, OrderStatus::Cancelled).await;
        assert!(matches!(cancel, Err(CommerceError::InvalidTransition { .. })));
        let cancel = fx.shop.cancel_order(&id).await;
        assert!(matches!(cancel, Err(CommerceError::InvalidTransition { .. })));
        assert_eq!(stock_of(&fx.shop, "a").await, 3, "{}", fx.name);
        let order = fx.shop.get_order(&id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Delivered, "{}", fx.name);
    }
}

#[tokio::test]
async fn test_cancel_refuses_to_overflow_stock() {
    for fx in backends().await {
        general_category(&fx.shop).await;
        simple_product(&fx.shop, "a", 1_000, 5).await;
        let id = fx
            .shop
            .place_order(&order_for(&[("a", 2)]))
            .await
            .unwrap()
            .order_id;
        fx.shop
            .restock(&ProductId::new("a"), i64::MAX - 3)
            .await
            .unwrap();
        assert_eq!(stock_of(&fx.shop, "a").await, i64::MAX, "{}", fx.name);

        let err = fx.shop.cancel_order(&id).await.unwrap_err();
        assert!(matches!(err, CommerceError::Overflow), "{}: {:?}", fx.name, err);
        assert_eq!(stock_of(&fx.shop, "a").await, i64::MAX, "{}", fx.name);
        let order = fx.shop.get_order(&id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending, "{}", fx.name);
    }
}

#[tokio::test]
async fn test_cancel_through_set_status_restores_stock() {
    for fx in backends().await {
        general_category(&fx.shop).await;
        simple_product(&fx.shop, "a", 1_000, 5).await;
        let id = fx
            .shop
            .place_order(&order_for(&[("a", 4)]))
            .await
            .unwrap()
            .order_id;
        fx.shop.set_order_status(&id, OrderStatus::Confirmed).await.unwrap();

        let order = fx.shop.set_order_status(&id, OrderStatus::Cancelled).await.unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled, "{}", fx.name);
        assert!(order.cancelled_at.is_some());
        assert_eq!(stock_of(&fx.shop, "a").await, 5, "{}", fx.name);
    }
}

#[tokio::test]
async fn test_unknown_order_ids() {
    for fx in backends().await {
        let missing = OrderId::new("missing");
        assert!(matches!(
            fx.shop.get_order(&missing).await,
            Err(CommerceError::NotFound { .. })
        ));
        assert!(matches!(
            fx.shop.cancel_order(&missing).await,
            Err(CommerceError::NotFound { .. })
        ));
        assert!(matches!(
            fx.shop.set_order_status(&missing, OrderStatus::Confirmed).await,
            Err(CommerceError::NotFound { .. })
        ));
        assert!(matches!(
            fx.shop.find_order_by_number("ORD-0-XXXX").await,
            Err(CommerceError::NotFound { .. })
        ));
    }
}

#[tokio::test]
async fn test_list_and_find_orders() {
    for fx in backends().await {
        general_category(&fx.shop).await;
        simple_product(&fx.shop, "a", 1_000, 50).await;

        let mut numbers = Vec::new();
        for email in ["a@example.ru", "b@example.ru", "a@example.ru"] {
            let request = PlaceOrder::new(
                CustomerInfo::new("Buyer", email, "+7 900 000 00 00"),
                vec![OrderLine::new("a", 1)],
            )
            .with_delivery("courier", Some("Moscow, Tverskaya 1".to_string()));
            numbers.push(fx.shop.place_order(&request).await.unwrap().order_number);
        }

        let all = fx.shop.list_orders(&OrderListQuery::new()).await.unwrap();
        assert_eq!(all.pagination.total, 3, "{}", fx.name);
        let listed: Vec<&str> = all.items.iter().map(|o| o.order_number.as_str()).collect();
        assert_eq!(listed, vec![numbers[2].as_str(), numbers[1].as_str(), numbers[0].as_str()], "{}", fx.name);

        let by_email = fx
            .shop
            .list_orders(&OrderListQuery::new().with_customer_email("a@example.ru"))
            .await
            .unwrap();
        assert_eq!(by_email.pagination.total, 2, "{}", fx.name);

        let paged = fx
            .shop
            .list_orders(&OrderListQuery::new().with_pagination(2, 2))
            .await
            .unwrap();
        assert_eq!(paged.len(), 1);
        assert_eq!(paged.items[0].order_number, numbers[0]);

        let found = fx.shop.find_order_by_number(&numbers[1]).await.unwrap();
        assert_eq!(found.customer.email, "b@example.ru", "{}", fx.name);
        assert_eq!(found.delivery_method.as_deref(), Some("courier"));
        fx.shop.cancel_order(&found.id).await.unwrap();

        let cancelled = fx
            .shop
            .list_orders(&OrderListQuery::new().with_status(OrderStatus::Cancelled))
            .await
            .unwrap();
        assert_eq!(cancelled.pagination.total, 1, "{}", fx.name);
        assert_eq!(cancelled.items[0].id, found.id);
    }
}

#[tokio::test]
async fn test_update_notes() {
    for fx in backends().await {
        general_category(&fx.shop).await;
        simple_product(&fx.shop, "a", 1_000, 5).await;
        let id = fx
            .shop
            .place_order(&order_for(&[("a", 1)]).with_notes("call first"))
            .await
            .unwrap()
            .order_id;
        assert_eq!(
            fx.shop.get_order(&id).await.unwrap().notes.as_deref(),
            Some("call first")
        );

        let order = fx.shop.update_order_notes(&id, Some(" gate code 42 ")).await.unwrap();
        assert_eq!(order.notes.as_deref(), Some("gate code 42"), "{}", fx.name);
        let order = fx.shop.update_order_notes(&id, None).await.unwrap();
        assert_eq!(order.notes, None, "{}", fx.name);
    }
}

#[tokio::test]
async fn test_order_from_cart() {
    for fx in backends().await {
        general_category(&fx.shop).await;
        simple_product(&fx.shop, "a", 2_500, 5).await;
        simple_product(&fx.shop, "b", 1_000, 5).await;

        let mut cart = Cart::new();
        cart.add_item("a", 1).unwrap();
        cart.add_item("b", 2).unwrap();
        cart.add_item("a", 1).unwrap();

        let receipt = fx
            .shop
            .place_order(&PlaceOrder::from_cart(customer(), &cart))
            .await
            .unwrap();
        assert_eq!(receipt.total, rub(7_000), "{}", fx.name);
    }
}
