//! Persistence backends.
//!
//! Every backend implements [`Store`]. Writes that must be atomic (order
//! commit, cancellation, status changes) are single trait calls so each
//! backend can run them inside its own critical section or transaction.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::catalog::{Brand, BrandSummary, Category, CategorySummary, Product};
use crate::checkout::{Order, OrderListQuery, OrderStatus};
use crate::contact::{ContactRequest, ContactStatus};
use crate::error::CommerceError;
use crate::ids::{BrandId, CategoryId, ContactRequestId, OrderId, ProductId};
use crate::money::Money;
use crate::search::Filter;
use async_trait::async_trait;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, CommerceError>;

/// Storage for catalog, orders and contact requests.
#[async_trait]
pub trait Store: Send + Sync {
    // Catalog writes

    /// Insert a category. Duplicate id or slug is `DuplicateKey`.
    async fn insert_category(&self, category: &Category) -> StoreResult<()>;

    /// Insert a brand. Duplicate id or slug is `DuplicateKey`.
    async fn insert_brand(&self, brand: &Brand) -> StoreResult<()>;

    /// Insert a product. Duplicate id, slug or SKU is `DuplicateKey`.
    async fn insert_product(&self, product: &Product) -> StoreResult<()>;

    /// Add units to a product's stock.
    async fn restock(&self, id: &ProductId, quantity: i64, at: i64) -> StoreResult<Product>;

    async fn set_product_price(&self, id: &ProductId, price: Money, at: i64)
        -> StoreResult<Product>;

    async fn set_product_availability(
        &self,
        id: &ProductId,
        available: bool,
        at: i64,
    ) -> StoreResult<Product>;

    // Catalog reads

    async fn get_category(&self, id: &CategoryId) -> StoreResult<Option<Category>>;

    async fn get_brand(&self, id: &BrandId) -> StoreResult<Option<Brand>>;

    async fn get_product(&self, id: &ProductId) -> StoreResult<Option<Product>>;

    /// One page of matching products in listing order plus the total match
    /// count.
    async fn query_products(
        &self,
        filter: &Filter,
        offset: i64,
        limit: i64,
    ) -> StoreResult<(Vec<Product>, i64)>;

    /// Lowest and highest price (minor units) among matching products, or
    /// `None` when nothing matches.
    async fn price_bounds(&self, filter: &Filter) -> StoreResult<Option<(i64, i64)>>;

    /// Active categories by sort order, with available product counts.
    async fn list_categories(&self) -> StoreResult<Vec<CategorySummary>>;

    /// Active brands by name, with available product counts.
    async fn list_brands(&self) -> StoreResult<Vec<BrandSummary>>;

    // Orders

    /// Atomically persist a new order and decrement stock for every item.
    ///
    /// Each item's product must still be available, hold at least the
    /// item's quantity and still cost the item's price. On any failure
    /// nothing is written:
    /// - missing or unavailable product: `ProductUnavailable`
    /// - price changed: `ConcurrencyConflict`
    /// - not enough stock: `OutOfStock`
    /// - order number or id taken: `DuplicateKey`
    async fn commit_order(&self, order: &Order) -> StoreResult<()>;

    async fn get_order(&self, id: &OrderId) -> StoreResult<Option<Order>>;

    async fn find_order_by_number(&self, order_number: &str) -> StoreResult<Option<Order>>;

    /// One page of matching orders, newest first, plus the total count.
    async fn list_orders(
        &self,
        query: &OrderListQuery,
        offset: i64,
        limit: i64,
    ) -> StoreResult<(Vec<Order>, i64)>;

    /// Set the status if it is still `expected`. Returns `false` when the
    /// order is missing or its status has moved on.
    async fn update_order_status(
        &self,
        id: &OrderId,
        expected: OrderStatus,
        next: OrderStatus,
        at: i64,
    ) -> StoreResult<bool>;

    /// Cancel the order if its status is still `expected`, returning every
    /// item's quantity to stock in the same atomic step. Returns `false`
    /// when the order is missing or its status has moved on.
    async fn cancel_order(&self, id: &OrderId, expected: OrderStatus, at: i64)
        -> StoreResult<bool>;

    /// Replace the notes. Returns `false` when the order is missing.
    async fn update_order_notes(
        &self,
        id: &OrderId,
        notes: Option<&str>,
        at: i64,
    ) -> StoreResult<bool>;

    // Contact requests

    async fn insert_contact_request(&self, request: &ContactRequest) -> StoreResult<()>;

    async fn get_contact_request(&self, id: &ContactRequestId)
        -> StoreResult<Option<ContactRequest>>;

    /// Most recent requests first.
    async fn list_contact_requests(&self, limit: i64) -> StoreResult<Vec<ContactRequest>>;

    /// Set the status if it is still `expected`.
    async fn update_contact_status(
        &self,
        id: &ContactRequestId,
        expected: ContactStatus,
        next: ContactStatus,
        at: i64,
    ) -> StoreResult<bool>;
}
