//! Order transaction engine.
//!
//! Placement reads current products, prices the lines, and hands the
//! finished order to [`Store::commit_order`], which re-checks every line
//! and decrements stock atomically. Conflicts detected at commit time are
//! retried from the top with fresh reads.

use crate::checkout::{build_items, Order, OrderListQuery, OrderReceipt, OrderStatus, PlaceOrder};
use crate::config::OrderConfig;
use crate::error::CommerceError;
use crate::ids::OrderId;
use crate::search::{offset, Page, Pagination};
use crate::storage::Store;
use crate::time::current_timestamp;
use crate::validation::optional;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Largest page an order listing may request.
pub const MAX_ORDER_PAGE_SIZE: i64 = 100;

/// Places orders and drives them through the status state machine.
pub struct OrderService {
    store: Arc<dyn Store>,
    config: OrderConfig,
}

impl OrderService {
    pub fn new(store: Arc<dyn Store>, config: OrderConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &OrderConfig {
        &self.config
    }

    fn attempts(&self) -> u32 {
        self.config.max_retries.saturating_add(1)
    }

    /// Validate, price and atomically commit a new order.
    ///
    /// Either the order, all of its items and every stock decrement are
    /// stored, or nothing is.
    #[instrument(skip(self, request), fields(lines = request.items.len()))]
    pub async fn place_order(&self, request: &PlaceOrder) -> Result<OrderReceipt, CommerceError> {
        let request = request.normalized(self.config.max_quantity_per_item)?;
        let attempts = self.attempts();

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_place(&request).await {
                Ok(order) => {
                    info!(
                        order_number = %order.order_number,
                        total = %order.total,
                        items = order.items.len(),
                        "order placed"
                    );
                    return Ok(OrderReceipt::from(&order));
                }
                Err(err @ CommerceError::ConcurrencyConflict(_))
                | Err(err @ CommerceError::DuplicateKey { .. })
                    if attempt < attempts =>
                {
                    warn!(attempt, error = %err, "order commit conflicted, retrying");
                }
                Err(err) => {
                    warn!(error = %err, code = err.code(), "order rejected");
                    return Err(err);
                }
            }
        }
    }

    async fn try_place(&self, request: &PlaceOrder) -> Result<Order, CommerceError> {
        let mut lines = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let product = self
                .store
                .get_product(&line.product_id)
                .await?
                .filter(|p| p.is_available)
                .ok_or_else(|| CommerceError::ProductUnavailable(line.product_id.to_string()))?;

            if product.stock < line.quantity {
                return Err(CommerceError::OutOfStock {
                    product_id: line.product_id.to_string(),
                    requested: line.quantity,
                    available: product.stock,
                });
            }
            lines.push((product, line.quantity));
        }

        let order_id = OrderId::generate();
        let (items, total) = build_items(&order_id, &lines, self.config.currency)?;
        let now = current_timestamp();

        let order = Order {
            id: order_id,
            order_number: Order::generate_order_number(),
            customer: request.customer.clone(),
            delivery_method: request.delivery_method.clone(),
            delivery_address: request.delivery_address.clone(),
            payment_method: request.payment_method.clone(),
            notes: request.notes.clone(),
            total,
            status: OrderStatus::Pending,
            items,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        };

        self.store.commit_order(&order).await?;
        Ok(order)
    }

    pub async fn get_order(&self, id: &OrderId) -> Result<Order, CommerceError> {
        self.store
            .get_order(id)
            .await?
            .ok_or_else(|| CommerceError::not_found("Order", id))
    }

    pub async fn find_order_by_number(&self, order_number: &str) -> Result<Order, CommerceError> {
        self.store
            .find_order_by_number(order_number.trim())
            .await?
            .ok_or_else(|| CommerceError::not_found("Order", order_number))
    }

    /// Orders newest first.
    pub async fn list_orders(&self, query: &OrderListQuery) -> Result<Page<Order>, CommerceError> {
        let page = query.page.max(1);
        let per_page = query
            .per_page
            .unwrap_or(self.config.page_size)
            .clamp(1, MAX_ORDER_PAGE_SIZE);

        let (orders, total) = self
            .store
            .list_orders(query, offset(page, per_page), per_page)
            .await?;
        Ok(Page::new(orders, Pagination::new(page, per_page, total)))
    }

    /// Cancel an order and put its items back in stock.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, id: &OrderId) -> Result<Order, CommerceError> {
        for attempt in 1..=self.attempts() {
            let order = self.get_order(id).await?;
            if !order.status.can_cancel() {
                return Err(CommerceError::InvalidTransition {
                    from: order.status.as_str().to_string(),
                    to: OrderStatus::Cancelled.as_str().to_string(),
                });
            }

            if self
                .store
                .cancel_order(id, order.status, current_timestamp())
                .await?
            {
                info!(order_number = %order.order_number, from = %order.status, "order cancelled");
                return self.get_order(id).await;
            }
            warn!(attempt, "order status changed during cancel, re-reading");
        }
        Err(CommerceError::ConcurrencyConflict(format!(
            "order {} kept changing during cancel",
            id
        )))
    }

    /// Move an order one step through the state machine. `CANCELLED` goes
    /// through [`OrderService::cancel_order`] so stock is restored.
    #[instrument(skip(self))]
    pub async fn set_status(&self, id: &OrderId, next: OrderStatus) -> Result<Order, CommerceError> {
        if next == OrderStatus::Cancelled {
            return self.cancel_order(id).await;
        }

        for attempt in 1..=self.attempts() {
            let order = self.get_order(id).await?;
            order.status.validate_transition(next)?;

            if self
                .store
                .update_order_status(id, order.status, next, current_timestamp())
                .await?
            {
                info!(order_number = %order.order_number, from = %order.status, to = %next, "order status changed");
                return self.get_order(id).await;
            }
            warn!(attempt, "order status changed concurrently, re-reading");
        }
        Err(CommerceError::ConcurrencyConflict(format!(
            "order {} kept changing",
            id
        )))
    }

    /// Replace the order notes. Blank notes clear them.
    pub async fn update_notes(
        &self,
        id: &OrderId,
        notes: Option<&str>,
    ) -> Result<Order, CommerceError> {
        let notes = optional(notes);
        if !self
            .store
            .update_order_notes(id, notes.as_deref(), current_timestamp())
            .await?
        {
            return Err(CommerceError::not_found("Order", id));
        }
        self.get_order(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Category, Product};
    use crate::checkout::{CustomerInfo, OrderLine};
    use crate::ids::{CategoryId, ProductId};
    use crate::money::{Currency, Money};
    use crate::storage::MemoryStore;

    async fn setup(stock: i64) -> (OrderService, Arc<dyn Store>) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        store
            .insert_category(&Category::new("Scanners", "scanners").with_id("scanners"))
            .await
            .unwrap();
        store
            .insert_product(
                &Product::new(
                    "Barcode scanner",
                    "barcode-scanner",
                    "BS-1",
                    CategoryId::new("scanners"),
                    Money::new(10_000, Currency::RUB),
                )
                .with_id("p-1")
                .with_stock(stock),
            )
            .await
            .unwrap();
        (
            OrderService::new(store.clone(), OrderConfig::default()),
            store,
        )
    }

    fn request(quantity: i64) -> PlaceOrder {
        PlaceOrder::new(
            CustomerInfo::new("Olga", "olga@example.ru", "+7 999 000-11-22"),
            vec![OrderLine::new("p-1", quantity)],
        )
    }

    #[tokio::test]
    async fn test_place_and_cancel() {
        let (service, store) = setup(5).await;
        let receipt = service.place_order(&request(2)).await.unwrap();
        assert_eq!(receipt.status, OrderStatus::Pending);
        assert_eq!(receipt.total.amount_cents, 20_000);

        let product = store.get_product(&ProductId::new("p-1")).await.unwrap().unwrap();
        assert_eq!(product.stock, 3);

        let cancelled = service.cancel_order(&receipt.order_id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());
        let product = store.get_product(&ProductId::new("p-1")).await.unwrap().unwrap();
        assert_eq!(product.stock, 5);
    }

    #[tokio::test]
    async fn test_out_of_stock_leaves_stock_alone() {
        let (service, store) = setup(1).await;
        let err = service.place_order(&request(2)).await.unwrap_err();
        assert!(matches!(err, CommerceError::OutOfStock { available: 1, .. }));
        let product = store.get_product(&ProductId::new("p-1")).await.unwrap().unwrap();
        assert_eq!(product.stock, 1);
    }

    #[tokio::test]
    async fn test_status_walk() {
        let (service, _) = setup(5).await;
        let receipt = service.place_order(&request(1)).await.unwrap();
        let id = receipt.order_id;

        assert!(matches!(
            service.set_status(&id, OrderStatus::Shipped).await,
            Err(CommerceError::InvalidTransition { .. })
        ));
        assert!(matches!(
            service.set_status(&id, OrderStatus::Pending).await,
            Err(CommerceError::InvalidTransition { .. })
        ));

        for next in [
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
        ] {
            assert_eq!(service.set_status(&id, next).await.unwrap().status, next);
        }
        assert!(matches!(
            service.cancel_order(&id).await,
            Err(CommerceError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let (service, _) = setup(1).await;
        let missing = OrderId::new("nope");
        assert!(matches!(
            service.cancel_order(&missing).await,
            Err(CommerceError::NotFound { .. })
        ));
        assert!(matches!(
            service.update_notes(&missing, Some("x")).await,
            Err(CommerceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_notes_trims_and_clears() {
        let (service, _) = setup(5).await;
        let receipt = service.place_order(&request(1)).await.unwrap();
        let order = service
            .update_notes(&receipt.order_id, Some("  leave at door "))
            .await
            .unwrap();
        assert_eq!(order.notes.as_deref(), Some("leave at door"));
        let order = service.update_notes(&receipt.order_id, Some(" ")).await.unwrap();
        assert_eq!(order.notes, None);
    }
}
