//! Storefront core: catalog queries, atomic order placement, the order
//! status state machine and contact intake.
//!
//! - **Catalog**: Products, categories, brands, specifications
//! - **Search**: Filter expressions, query builder, pagination
//! - **Cart**: Client-held cart converted into an order request
//! - **Checkout**: Order placement, cancellation, status transitions
//! - **Contact**: Lead intake with per-source rate limiting
//! - **Storage**: In-memory and SQLite backends behind one trait
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_commerce::prelude::*;
//!
//! let shop = Storefront::open(StorefrontConfig::default()).await?;
//!
//! shop.add_category(Category::new("Printers", "printers").with_id("printers")).await?;
//! shop.add_product(
//!     Product::new("Label printer", "label-printer", "LP-1", CategoryId::new("printers"),
//!         Money::new(499_900, Currency::RUB))
//!         .with_id("lp-1")
//!         .with_stock(10),
//! ).await?;
//!
//! let page = shop.list_products(&ProductQuery::new().with_search("label")).await?;
//!
//! let receipt = shop.place_order(&PlaceOrder::new(
//!     CustomerInfo::new("Ivan", "ivan@example.ru", "+7 916 123-45-67"),
//!     vec![OrderLine::new("lp-1", 2)],
//! )).await?;
//! println!("{} {}", receipt.order_number, receipt.total.display());
//! ```

mod time;

pub mod error;
pub mod ids;
pub mod money;
pub mod validation;

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod contact;
pub mod search;
pub mod service;
pub mod storage;

pub use config::StorefrontConfig;
pub use error::CommerceError;
pub use ids::*;
pub use money::{Currency, Money};
pub use service::Storefront;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::StorefrontConfig;
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};
    pub use crate::service::Storefront;

    // Catalog
    pub use crate::catalog::{
        Brand, BrandSummary, CatalogService, Category, CategorySummary, Product, Specification,
    };

    // Search
    pub use crate::search::{Filter, Page, Pagination, PriceRange, ProductQuery};

    // Cart
    pub use crate::cart::{Cart, CartLine};

    // Checkout
    pub use crate::checkout::{
        CustomerInfo, Order, OrderItem, OrderLine, OrderListQuery, OrderReceipt, OrderService,
        OrderStatus, PlaceOrder,
    };

    // Contact
    pub use crate::contact::{ContactForm, ContactReceipt, ContactRequest, ContactStatus};

    // Storage
    pub use crate::storage::{MemoryStore, SqliteStore, Store};
}
