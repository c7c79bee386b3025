//! Product catalog module.
//!
//! Contains products, categories and brands, and the service that lists
//! and maintains them.

mod category;
mod product;
mod service;

pub use category::{Brand, BrandSummary, Category, CategorySummary};
pub use product::{Product, Specification, SEARCH_FIELD_SEPARATOR};
pub use service::CatalogService;
