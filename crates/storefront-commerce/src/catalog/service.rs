//! Catalog reads and the admin writes used for seeding.

use crate::catalog::{Brand, BrandSummary, Category, CategorySummary, Product};
use crate::config::CatalogConfig;
use crate::error::CommerceError;
use crate::ids::ProductId;
use crate::money::{Currency, Money};
use crate::search::{offset, Page, Pagination, PriceRange, ProductQuery};
use crate::storage::Store;
use crate::time::current_timestamp;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Catalog listing, lookup and maintenance.
pub struct CatalogService {
    store: Arc<dyn Store>,
    config: CatalogConfig,
    currency: Currency,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>, config: CatalogConfig, currency: Currency) -> Self {
        Self {
            store,
            config,
            currency,
        }
    }

    /// One page of available products matching the query, featured first.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>, CommerceError> {
        let (page, per_page) =
            query.page_request(self.config.default_page_size, self.config.max_page_size);
        let (products, total) = self
            .store
            .query_products(&query.filter(), offset(page, per_page), per_page)
            .await?;

        debug!(total, returned = products.len(), "products listed");
        Ok(Page::new(products, Pagination::new(page, per_page, total)))
    }

    /// Price bounds over the query's filters minus its own price filter.
    /// Falls back to the configured range when nothing matches.
    pub async fn get_price_range(&self, query: &ProductQuery) -> Result<PriceRange, CommerceError> {
        let bounds = self
            .store
            .price_bounds(&query.filter_without_price())
            .await?;

        let (min, max) = match bounds {
            Some((min, max)) => (
                Money::new(min, self.currency),
                Money::new(max, self.currency),
            ),
            None => self.config.default_price_range(self.currency),
        };
        Ok(PriceRange { min, max })
    }

    pub async fn get_product(&self, id: &ProductId) -> Result<Product, CommerceError> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| CommerceError::not_found("Product", id))
    }

    pub async fn list_categories(&self) -> Result<Vec<CategorySummary>, CommerceError> {
        self.store.list_categories().await
    }

    pub async fn list_brands(&self) -> Result<Vec<BrandSummary>, CommerceError> {
        self.store.list_brands().await
    }

    pub async fn add_category(&self, category: Category) -> Result<Category, CommerceError> {
        category.validate()?;
        if let Some(parent) = &category.parent_id {
            if self.store.get_category(parent).await?.is_none() {
                return Err(CommerceError::not_found("Category", parent));
            }
        }
        self.store.insert_category(&category).await?;
        info!(id = %category.id, slug = %category.slug, "category added");
        Ok(category)
    }

    pub async fn add_brand(&self, brand: Brand) -> Result<Brand, CommerceError> {
        brand.validate()?;
        self.store.insert_brand(&brand).await?;
        info!(id = %brand.id, slug = %brand.slug, "brand added");
        Ok(brand)
    }

    /// Add a product. Its category (and brand, if set) must already exist and
    /// its prices must be in the store currency.
    pub async fn add_product(&self, mut product: Product) -> Result<Product, CommerceError> {
        product.validate()?;
        product.sort_specifications();
        self.ensure_currency(&product.price)?;
        if let Some(old_price) = &product.old_price {
            self.ensure_currency(old_price)?;
        }

        if self.store.get_category(&product.category_id).await?.is_none() {
            return Err(CommerceError::not_found("Category", &product.category_id));
        }
        if let Some(brand_id) = &product.brand_id {
            if self.store.get_brand(brand_id).await?.is_none() {
                return Err(CommerceError::not_found("Brand", brand_id));
            }
        }

        self.store.insert_product(&product).await?;
        info!(id = %product.id, sku = %product.sku, stock = product.stock, "product added");
        Ok(product)
    }

    /// Add units to stock.
    pub async fn restock(&self, id: &ProductId, quantity: i64) -> Result<Product, CommerceError> {
        if quantity < 1 {
            return Err(CommerceError::invalid(
                "quantity",
                "Restock quantity must be positive",
            ));
        }
        let product = self.store.restock(id, quantity, current_timestamp()).await?;
        info!(id = %id, added = quantity, stock = product.stock, "product restocked");
        Ok(product)
    }

    pub async fn set_product_price(&self, id: &ProductId, price: Money) -> Result<Product, CommerceError> {
        if price.is_negative() {
            return Err(CommerceError::invalid("price", "Price cannot be negative"));
        }
        self.ensure_currency(&price)?;
        let product = self
            .store
            .set_product_price(id, price, current_timestamp())
            .await?;
        info!(id = %id, price = %price, "product repriced");
        Ok(product)
    }

    pub async fn set_product_availability(
        &self,
        id: &ProductId,
        available: bool,
    ) -> Result<Product, CommerceError> {
        let product = self
            .store
            .set_product_availability(id, available, current_timestamp())
            .await?;
        info!(id = %id, available, "product availability changed");
        Ok(product)
    }

    fn ensure_currency(&self, money: &Money) -> Result<(), CommerceError> {
        if money.currency == self.currency {
            Ok(())
        } else {
            Err(CommerceError::CurrencyMismatch {
                expected: self.currency.code().to_string(),
                got: money.currency.code().to_string(),
            })
        }
    }
}
