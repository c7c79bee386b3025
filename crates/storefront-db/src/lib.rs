//! Type-safe SQLite database layer for the storefront.
//!
//! Wraps an `sqlx` SQLite pool behind a small, ergonomic API with
//! dynamically typed parameters and serde-based row decoding.
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_db::{Db, params};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Product {
//!     id: String,
//!     name: String,
//!     price_cents: i64,
//! }
//!
//! let db = Db::connect("sqlite://shop.db").await?;
//!
//! db.execute(
//!     "INSERT INTO products (id, name, price_cents) VALUES (?, ?, ?)",
//!     params!["p-1", "Thermal printer", 1_250_000],
//! ).await?;
//!
//! let cheap: Vec<Product> = db
//!     .query_as("SELECT id, name, price_cents FROM products WHERE price_cents < ?", params![2_000_000])
//!     .await?;
//!
//! let mut tx = db.begin().await?;
//! let updated = tx
//!     .execute("UPDATE products SET stock = stock - ? WHERE id = ? AND stock >= ?", params![1, "p-1", 1])
//!     .await?;
//! if updated == 1 {
//!     tx.commit().await?;
//! }
//! ```

mod db;
mod error;
mod types;

pub use db::{Db, DbOptions, Transaction};
pub use error::DbError;
pub use types::{QueryResult, Row, Value};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{params, Db, DbError, DbOptions, QueryResult, Row, Transaction, Value};
}

/// Create a parameter list for SQL queries.
///
/// # Example
///
/// ```rust
/// use storefront_db::params;
///
/// let params = params!["value1", 42, 3.14];
/// assert_eq!(params.len(), 3);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        &[] as &[$crate::Value]
    };
    ($($param:expr),+ $(,)?) => {
        &[$($crate::Value::from($param)),+]
    };
}
