//! CLI configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use storefront_commerce::StorefrontConfig;

/// Config file names searched from the working directory upwards.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["storefront.toml", ".storefront.toml", "storefront.json"];

/// Database used when no config file is found. The in-memory store would
/// forget everything between invocations.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://storefront.db";

/// Load config from a file, then apply environment overrides.
pub fn load(path: &Path) -> Result<StorefrontConfig> {
    let mut config = StorefrontConfig::load(path)
        .with_context(|| format!("Failed to load config file: {}", path.display()))?;
    config
        .apply_env()
        .context("Invalid environment override")?;
    Ok(config)
}

/// Defaults for running without a config file.
pub fn standalone() -> Result<StorefrontConfig> {
    let mut config = StorefrontConfig::default();
    config.database.url = DEFAULT_DATABASE_URL.to_string();
    config
        .apply_env()
        .context("Invalid environment override")?;
    Ok(config)
}

/// Find a config file in `start` or any of its parents.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        for name in CONFIG_FILE_NAMES {
            let candidate = current.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Generate the contents of a fresh `storefront.toml`.
pub fn generate_default_config() -> Result<String> {
    let mut config = StorefrontConfig::default();
    config.database.url = DEFAULT_DATABASE_URL.to_string();
    let body = config.to_toml().context("Failed to render config")?;
    Ok(format!(
        "# Storefront configuration\n# Environment overrides: {}, {}, {}\n\n{}",
        storefront_commerce::config::ENV_DATABASE_URL,
        storefront_commerce::config::ENV_LOG_LEVEL,
        storefront_commerce::config::ENV_CURRENCY,
        body
    ))
}
