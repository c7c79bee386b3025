//! The storefront facade.

use crate::catalog::{Brand, BrandSummary, CatalogService, Category, CategorySummary, Product};
use crate::checkout::{Order, OrderListQuery, OrderReceipt, OrderService, OrderStatus, PlaceOrder};
use crate::config::StorefrontConfig;
use crate::contact::{
    ContactForm, ContactIntake, ContactReceipt, ContactRequest, ContactStatus, RateLimiter,
};
use crate::error::CommerceError;
use crate::ids::{ContactRequestId, OrderId, ProductId};
use crate::money::Money;
use crate::search::{Page, PriceRange, ProductQuery};
use crate::storage::{MemoryStore, SqliteStore, Store};
use std::sync::Arc;
use storefront_db::DbOptions;
use tracing::info;

/// Every storefront operation behind one handle.
///
/// Cheap to share: wrap it in an `Arc` and hand it to request handlers.
pub struct Storefront {
    config: StorefrontConfig,
    store: Arc<dyn Store>,
    catalog: CatalogService,
    orders: OrderService,
    contacts: ContactIntake,
    limiter: RateLimiter,
}

impl Storefront {
    /// Open the store named by `database.url` and wire up the services.
    pub async fn open(config: StorefrontConfig) -> Result<Self, CommerceError> {
        config.validate()?;

        let store: Arc<dyn Store> = if config.database.is_memory() {
            Arc::new(MemoryStore::new())
        } else if config.database.url.starts_with("sqlite:") {
            let options = DbOptions::new(config.database.url.clone())
                .with_max_connections(config.database.max_connections)
                .with_busy_timeout(config.database.busy_timeout());
            Arc::new(SqliteStore::open_with(options).await?)
        } else {
            return Err(CommerceError::Config(format!(
                "unsupported database url: {}",
                config.database.url
            )));
        };

        info!(database = %config.database.url, "storefront opened");
        Ok(Self::with_store(config, store))
    }

    /// In-memory storefront with default settings.
    pub fn in_memory() -> Self {
        Self::with_store(StorefrontConfig::default(), Arc::new(MemoryStore::new()))
    }

    /// Wire the services over an existing store.
    pub fn with_store(config: StorefrontConfig, store: Arc<dyn Store>) -> Self {
        let catalog = CatalogService::new(
            store.clone(),
            config.catalog.clone(),
            config.orders.currency,
        );
        let orders = OrderService::new(store.clone(), config.orders.clone());
        let contacts = ContactIntake::new(store.clone(), config.contact.clone());
        let limiter = RateLimiter::from_config(&config.contact);
        Self {
            config,
            store,
            catalog,
            orders,
            contacts,
            limiter,
        }
    }

    pub fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    pub fn orders(&self) -> &OrderService {
        &self.orders
    }

    pub fn contacts(&self) -> &ContactIntake {
        &self.contacts
    }

    // Catalog

    pub async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>, CommerceError> {
        self.catalog.list_products(query).await
    }

    pub async fn get_price_range(&self, query: &ProductQuery) -> Result<PriceRange, CommerceError> {
        self.catalog.get_price_range(query).await
    }

    pub async fn get_product(&self, id: &ProductId) -> Result<Product, CommerceError> {
        self.catalog.get_product(id).await
    }

    pub async fn list_categories(&self) -> Result<Vec<CategorySummary>, CommerceError> {
        self.catalog.list_categories().await
    }

    pub async fn list_brands(&self) -> Result<Vec<BrandSummary>, CommerceError> {
        self.catalog.list_brands().await
    }

    pub async fn add_category(&self, category: Category) -> Result<Category, CommerceError> {
        self.catalog.add_category(category).await
    }

    pub async fn add_brand(&self, brand: Brand) -> Result<Brand, CommerceError> {
        self.catalog.add_brand(brand).await
    }

    pub async fn add_product(&self, product: Product) -> Result<Product, CommerceError> {
        self.catalog.add_product(product).await
    }

    pub async fn restock(&self, id: &ProductId, quantity: i64) -> Result<Product, CommerceError> {
        self.catalog.restock(id, quantity).await
    }

    pub async fn set_product_price(&self, id: &ProductId, price: Money) -> Result<Product, CommerceError> {
        self.catalog.set_product_price(id, price).await
    }

    pub async fn set_product_availability(
        &self,
        id: &ProductId,
        available: bool,
    ) -> Result<Product, CommerceError> {
        self.catalog.set_product_availability(id, available).await
    }

    // Orders

    pub async fn place_order(&self, request: &PlaceOrder) -> Result<OrderReceipt, CommerceError> {
        self.orders.place_order(request).await
    }

    pub async fn get_order(&self, id: &OrderId) -> Result<Order, CommerceError> {
        self.orders.get_order(id).await
    }

    pub async fn find_order_by_number(&self, order_number: &str) -> Result<Order, CommerceError> {
        self.orders.find_order_by_number(order_number).await
    }

    pub async fn list_orders(&self, query: &OrderListQuery) -> Result<Page<Order>, CommerceError> {
        self.orders.list_orders(query).await
    }

    pub async fn set_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, CommerceError> {
        self.orders.set_status(id, status).await
    }

    /// Cancel an order and return its items to stock.
    pub async fn cancel_order(&self, id: &OrderId) -> Result<Order, CommerceError> {
        self.orders.cancel_order(id).await
    }

    pub async fn update_order_notes(
        &self,
        id: &OrderId,
        notes: Option<&str>,
    ) -> Result<Order, CommerceError> {
        self.orders.update_notes(id, notes).await
    }

    // Contact requests

    pub async fn submit_contact_request(&self, form: ContactForm) -> Result<ContactReceipt, CommerceError> {
        self.contacts.submit(form).await
    }

    /// Submit on behalf of `source` (e.g. a client address), subject to the
    /// per-source rate limit.
    pub async fn submit_contact_request_from(
        &self,
        source: &str,
        form: ContactForm,
    ) -> Result<ContactReceipt, CommerceError> {
        self.limiter.check(source).await?;
        self.contacts.submit(form).await
    }

    pub async fn list_contact_requests(
        &self,
        limit: Option<i64>,
    ) -> Result<Vec<ContactRequest>, CommerceError> {
        self.contacts.list(limit).await
    }

    pub async fn set_contact_status(
        &self,
        id: &ContactRequestId,
        status: ContactStatus,
    ) -> Result<ContactRequest, CommerceError> {
        self.contacts.set_status(id, status).await
    }
}
