//! Storefront configuration.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration backed by the in-memory store.

use crate::error::CommerceError;
use crate::money::{Currency, Money};
use crate::search::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding `database.url`.
pub const ENV_DATABASE_URL: &str = "STOREFRONT_DATABASE_URL";
/// Environment variable overriding `logging.level`.
pub const ENV_LOG_LEVEL: &str = "STOREFRONT_LOG_LEVEL";
/// Environment variable overriding `orders.currency`.
pub const ENV_CURRENCY: &str = "STOREFRONT_CURRENCY";

/// Largest accepted `orders.max_quantity_per_item`.
pub const MAX_QUANTITY_PER_ITEM_LIMIT: i64 = 1_000_000;

/// `database.url` value selecting the in-memory store.
pub const MEMORY_URL: &str = "memory";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorefrontConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub orders: OrderConfig,

    #[serde(default)]
    pub contact: ContactConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StorefrontConfig {
    /// Load config from a file; `.json` files are JSON, anything else TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CommerceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CommerceError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&content)
        } else {
            Self::from_toml(&content)
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, CommerceError> {
        toml::from_str(content).map_err(|e| CommerceError::Config(e.to_string()))
    }

    pub fn from_json(content: &str) -> Result<Self, CommerceError> {
        serde_json::from_str(content).map_err(|e| CommerceError::Config(e.to_string()))
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, CommerceError> {
        toml::to_string_pretty(self).map_err(|e| CommerceError::Config(e.to_string()))
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), CommerceError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), CommerceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_DATABASE_URL) {
            self.database.url = url;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Some(code) = lookup(ENV_CURRENCY) {
            self.orders.currency = Currency::from_code(&code).ok_or_else(|| {
                CommerceError::Config(format!("unknown currency in {}: {}", ENV_CURRENCY, code))
            })?;
        }
        Ok(())
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), CommerceError> {
        if self.catalog.default_page_size < 1 || self.catalog.max_page_size < 1 {
            return Err(CommerceError::Config("page sizes must be positive".into()));
        }
        if self.catalog.default_min_price > self.catalog.default_max_price {
            return Err(CommerceError::Config(
                "catalog.default_min_price exceeds default_max_price".into(),
            ));
        }
        if !(1..=MAX_QUANTITY_PER_ITEM_LIMIT).contains(&self.orders.max_quantity_per_item) {
            return Err(CommerceError::Config(format!(
                "orders.max_quantity_per_item must be between 1 and {}",
                MAX_QUANTITY_PER_ITEM_LIMIT
            )));
        }
        if self.contact.rate_limit_requests == 0 || self.contact.rate_limit_window_secs == 0 {
            return Err(CommerceError::Config(
                "contact rate limit must allow at least one request per window".into(),
            ));
        }
        Ok(())
    }
}

/// Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    /// `memory`, or an SQLite URL such as `sqlite://shop.db`.
    #[serde(default = "default_database_url")]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a writer waits on a locked database.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url == MEMORY_URL
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

fn default_database_url() -> String {
    MEMORY_URL.to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Catalog listing settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,

    /// Lower bound reported when no product matches (minor units).
    #[serde(default)]
    pub default_min_price: i64,

    /// Upper bound reported when no product matches (minor units).
    #[serde(default = "default_max_price")]
    pub default_max_price: i64,
}

impl CatalogConfig {
    /// The fallback price range in `currency`.
    pub fn default_price_range(&self, currency: Currency) -> (Money, Money) {
        (
            Money::new(self.default_min_price, currency),
            Money::new(self.default_max_price, currency),
        )
    }
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> i64 {
    MAX_PAGE_SIZE
}

fn default_max_price() -> i64 {
    20_000_000
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            default_min_price: 0,
            default_max_price: default_max_price(),
        }
    }
}

/// Order engine settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderConfig {
    /// Placement attempts after a concurrency conflict or number collision.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_max_quantity")]
    pub max_quantity_per_item: i64,

    /// Currency every order total is computed in.
    #[serde(default)]
    pub currency: Currency,

    /// Default page size for order listings.
    #[serde(default = "default_order_page_size")]
    pub page_size: i64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_quantity() -> i64 {
    crate::cart::MAX_QUANTITY_PER_ITEM
}

fn default_order_page_size() -> i64 {
    20
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            max_quantity_per_item: default_max_quantity(),
            currency: Currency::default(),
            page_size: default_order_page_size(),
        }
    }
}

/// Contact intake settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactConfig {
    /// Submissions allowed per source per window.
    #[serde(default = "default_rate_limit_requests")]
    pub rate_limit_requests: u32,

    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    /// Sources tracked before the oldest windows are dropped.
    #[serde(default = "default_rate_limit_max_sources")]
    pub rate_limit_max_sources: usize,

    /// Default number of requests returned by listings.
    #[serde(default = "default_list_limit")]
    pub list_limit: i64,
}

impl ContactConfig {
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

fn default_rate_limit_requests() -> u32 {
    5
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

fn default_rate_limit_max_sources() -> usize {
    10_000
}

fn default_list_limit() -> i64 {
    50
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            rate_limit_requests: default_rate_limit_requests(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            rate_limit_max_sources: default_rate_limit_max_sources(),
            list_limit: default_list_limit(),
        }
    }
}

/// Log output settings, read by the binary that installs the subscriber.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `storefront_commerce=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = StorefrontConfig::from_toml("").unwrap();
        assert_eq!(config, StorefrontConfig::default());
        assert!(config.database.is_memory());
        assert_eq!(config.catalog.default_page_size, 12);
        assert_eq!(config.orders.max_retries, 3);
        assert_eq!(config.contact.rate_limit_requests, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = StorefrontConfig::from_toml(
            r#"
            [database]
            url = "sqlite://shop.db"

            [orders]
            currency = "USD"
            "#,
        )
        .unwrap();
        assert_eq!(config.database.url, "sqlite://shop.db");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.orders.currency, Currency::USD);
        assert_eq!(config.orders.max_quantity_per_item, 9999);
    }

    #[test]
    fn test_json_config() {
        let config =
            StorefrontConfig::from_json(r#"{"contact": {"rate_limit_requests": 2}}"#).unwrap();
        assert_eq!(config.contact.rate_limit_requests, 2);
        assert_eq!(config.contact.rate_limit_window_secs, 60);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_DATABASE_URL, "sqlite::memory:"),
            (ENV_CURRENCY, "eur"),
            (ENV_LOG_LEVEL, "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = StorefrontConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.orders.currency, Currency::EUR);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_bad_currency_override() {
        let mut config = StorefrontConfig::default();
        let result = config.apply_overrides(|key| (key == ENV_CURRENCY).then(|| "XXX".to_string()));
        assert!(matches!(result, Err(CommerceError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_inverted_price_range() {
        let mut config = StorefrontConfig::default();
        config.catalog.default_min_price = 10;
        config.catalog.default_max_price = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_quantity_cap() {
        let mut config = StorefrontConfig::default();
        config.orders.max_quantity_per_item = i64::MAX;
        assert!(matches!(config.validate(), Err(CommerceError::Config(_))));

        config.orders.max_quantity_per_item = 0;
        assert!(config.validate().is_err());

        config.orders.max_quantity_per_item = MAX_QUANTITY_PER_ITEM_LIMIT;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storefront.toml");
        std::fs::write(&path, "[logging]\nformat = \"json\"\n").unwrap();
        let config = StorefrontConfig::load(&path).unwrap();
        assert_eq!(config.logging.format, "json");
        assert!(StorefrontConfig::load(dir.path().join("missing.toml")).is_err());
    }
}
