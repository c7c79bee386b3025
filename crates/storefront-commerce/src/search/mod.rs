//! Search module.
//!
//! Contains the filter expressions, the catalog query builder and pagination.

mod filter;
mod query;
mod results;

pub use filter::{Filter, NO_PREDICATE};
pub use query::{ProductQuery, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use results::{offset, Page, Pagination, PriceRange};
