//! Product types.

use crate::error::CommerceError;
use crate::ids::{BrandId, CategoryId, ProductId};
use crate::money::Money;
use crate::time::current_timestamp;
use crate::validation::ValidationErrors;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Separator between fields in [`Product::search_text`].
pub const SEARCH_FIELD_SEPARATOR: &str = "\u{1f}";

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// URL-friendly slug (unique).
    pub slug: String,
    /// Stock keeping unit (unique).
    pub sku: String,
    /// Full description.
    #[serde(default)]
    pub description: Option<String>,
    /// Short description for listings.
    #[serde(default)]
    pub short_description: Option<String>,
    /// Current selling price.
    pub price: Money,
    /// Previous price, shown crossed out.
    #[serde(default)]
    pub old_price: Option<Money>,
    /// Units on hand. Never negative.
    pub stock: i64,
    /// Whether the product is offered for sale.
    pub is_available: bool,
    /// Pinned to the top of listings.
    #[serde(default)]
    pub is_featured: bool,
    /// Marked as a new arrival.
    #[serde(default)]
    pub is_new: bool,
    /// Owning category.
    pub category_id: CategoryId,
    /// Manufacturer, if known.
    #[serde(default)]
    pub brand_id: Option<BrandId>,
    /// Technical specifications in display order.
    #[serde(default)]
    pub specifications: Vec<Specification>,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last update.
    pub updated_at: i64,
}

impl Product {
    /// Create an available product with no stock.
    pub fn new(
        name: impl Into<String>,
        slug: impl Into<String>,
        sku: impl Into<String>,
        category_id: CategoryId,
        price: Money,
    ) -> Self {
        let now = current_timestamp();
        Self {
            id: ProductId::generate(),
            name: name.into(),
            slug: slug.into(),
            sku: sku.into(),
            description: None,
            short_description: None,
            price,
            old_price: None,
            stock: 0,
            is_available: true,
            is_featured: false,
            is_new: false,
            category_id,
            brand_id: None,
            specifications: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: impl Into<ProductId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_brand(mut self, brand_id: impl Into<BrandId>) -> Self {
        self.brand_id = Some(brand_id.into());
        self
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = stock;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_short_description(mut self, text: impl Into<String>) -> Self {
        self.short_description = Some(text.into());
        self
    }

    pub fn with_old_price(mut self, old_price: Money) -> Self {
        self.old_price = Some(old_price);
        self
    }

    pub fn with_availability(mut self, available: bool) -> Self {
        self.is_available = available;
        self
    }

    pub fn with_featured(mut self, featured: bool) -> Self {
        self.is_featured = featured;
        self
    }

    pub fn with_new(mut self, is_new: bool) -> Self {
        self.is_new = is_new;
        self
    }

    /// Override the creation time (used when importing existing catalogs).
    pub fn with_created_at(mut self, created_at: i64) -> Self {
        self.created_at = created_at;
        self.updated_at = self.updated_at.max(created_at);
        self
    }

    /// Append a specification row.
    pub fn with_specification(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let sort_order = self.specifications.len() as i32;
        self.specifications.push(Specification {
            name: name.into(),
            value: value.into(),
            group: None,
            sort_order,
        });
        self
    }

    /// Put specifications in display order. Rows sharing a `sort_order`
    /// keep their relative order.
    pub fn sort_specifications(&mut self) {
        self.specifications.sort_by_key(|spec| spec.sort_order);
    }

    /// Check if the product can be ordered at all.
    pub fn is_in_stock(&self) -> bool {
        self.is_available && self.stock > 0
    }

    /// Check if the product is on sale (old price above current).
    pub fn is_on_sale(&self) -> bool {
        self.old_price
            .map(|old| old.amount_cents > self.price.amount_cents)
            .unwrap_or(false)
    }

    /// Lowercased searchable text: name, descriptions, SKU and every
    /// specification name and value, separated by [`SEARCH_FIELD_SEPARATOR`].
    pub fn search_text(&self) -> String {
        let mut fields: Vec<&str> = vec![self.name.as_str()];
        fields.extend(self.description.as_deref());
        fields.extend(self.short_description.as_deref());
        fields.push(&self.sku);
        for spec in &self.specifications {
            fields.push(&spec.name);
            fields.push(&spec.value);
        }
        fields.join(SEARCH_FIELD_SEPARATOR).to_lowercase()
    }

    /// Check the record-level invariants before it is stored.
    pub fn validate(&self) -> Result<(), CommerceError> {
        let mut errors = ValidationErrors::new();
        if self.id.as_str().trim().is_empty() {
            errors.add("id", "Product id is required");
        }
        if self.name.trim().is_empty() {
            errors.add("name", "Product name is required");
        }
        if self.slug.trim().is_empty() {
            errors.add("slug", "Slug is required");
        }
        if self.sku.trim().is_empty() {
            errors.add("sku", "SKU is required");
        }
        if self.price.is_negative() {
            errors.add("price", "Price cannot be negative");
        }
        if self.old_price.is_some_and(|p| p.is_negative()) {
            errors.add("old_price", "Old price cannot be negative");
        }
        if self.stock < 0 {
            errors.add("stock", "Stock cannot be negative");
        }
        errors.into_result().map_err(CommerceError::from)
    }

    /// Listing order: featured first, then new, then most recent. Callers
    /// break remaining ties by insertion order.
    pub fn listing_cmp(&self, other: &Product) -> Ordering {
        other
            .is_featured
            .cmp(&self.is_featured)
            .then_with(|| other.is_new.cmp(&self.is_new))
            .then_with(|| other.created_at.cmp(&self.created_at))
    }
}

/// A technical specification row (e.g., "Print speed: 30 ppm").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Specification {
    /// Specification name.
    pub name: String,
    /// Specification value.
    pub value: String,
    /// Optional grouping heading.
    #[serde(default)]
    pub group: Option<String>,
    /// Display position.
    #[serde(default)]
    pub sort_order: i32,
}
