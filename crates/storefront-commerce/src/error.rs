//! Commerce error types.

use crate::validation::ValidationErrors;
use storefront_db::DbError;
use thiserror::Error;

/// Errors that can occur in storefront operations.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Input failed validation; carries one message per offending field.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Not enough stock to satisfy a line.
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    OutOfStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// The product is missing or not offered for sale.
    #[error("Product unavailable: {0}")]
    ProductUnavailable(String),

    /// Status change not allowed by the state machine.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// A concurrent writer changed the record between read and write.
    #[error("Concurrent modification: {0}")]
    ConcurrencyConflict(String),

    /// A unique key is already taken.
    #[error("Duplicate {entity}: {key}")]
    DuplicateKey { entity: &'static str, key: String },

    /// Too many requests from one source.
    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Currency mismatch.
    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CommerceError {
    /// Shorthand for [`CommerceError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CommerceError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for a validation error on a single field.
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        CommerceError::Validation(errors)
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            CommerceError::Validation(_) => "validation_error",
            CommerceError::NotFound { .. } => "not_found",
            CommerceError::OutOfStock { .. } => "out_of_stock",
            CommerceError::ProductUnavailable(_) => "product_unavailable",
            CommerceError::InvalidTransition { .. } => "invalid_transition",
            CommerceError::ConcurrencyConflict(_) => "concurrency_conflict",
            CommerceError::DuplicateKey { .. } => "duplicate_key",
            CommerceError::RateLimited { .. } => "rate_limited",
            CommerceError::CurrencyMismatch { .. } => "currency_mismatch",
            CommerceError::Overflow => "overflow",
            CommerceError::Storage(_) => "storage_error",
            CommerceError::Serialization(_) => "serialization_error",
            CommerceError::Config(_) => "config_error",
        }
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CommerceError::ConcurrencyConflict(_)
                | CommerceError::RateLimited { .. }
                | CommerceError::Storage(_)
        )
    }

    /// Message safe to show to a customer.
    pub fn user_message(&self) -> String {
        match self {
            CommerceError::Validation(errors) => errors.to_string(),
            CommerceError::NotFound { entity, .. } => format!("{} not found", entity),
            CommerceError::OutOfStock { available, .. } => {
                format!("Not enough items in stock (available: {})", available)
            }
            CommerceError::ProductUnavailable(_) => "Product is not available".to_string(),
            CommerceError::InvalidTransition { from, to } => {
                format!("Cannot change status from {} to {}", from, to)
            }
            CommerceError::ConcurrencyConflict(_) => {
                "The item changed while you were ordering, please try again".to_string()
            }
            CommerceError::RateLimited { retry_after_secs } => {
                format!("Too many requests, try again in {} seconds", retry_after_secs)
            }
            _ => "Internal error, please try again later".to_string(),
        }
    }
}

impl From<ValidationErrors> for CommerceError {
    fn from(errors: ValidationErrors) -> Self {
        CommerceError::Validation(errors)
    }
}

impl From<DbError> for CommerceError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::UniqueViolation(key) => CommerceError::DuplicateKey {
                entity: "record",
                key,
            },
            other => CommerceError::Storage(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::Serialization(e.to_string())
    }
}
