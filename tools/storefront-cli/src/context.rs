//! CLI execution context.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use storefront_commerce::{Storefront, StorefrontConfig};
use tokio::sync::OnceCell;

use crate::config;
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// Effective storefront configuration.
    pub config: StorefrontConfig,
    /// File the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
    storefront: OnceCell<Storefront>,
}

impl Context {
    /// Load context from config file.
    pub async fn load(
        config_path: Option<&str>,
        database: Option<&str>,
        output: Output,
    ) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let config_path = match config_path {
            Some(path) => Some(PathBuf::from(path)),
            // Try to find config in current directory or parent directories
            None => config::find_config_file(&cwd),
        };

        let mut config = match &config_path {
            Some(path) => config::load(path)?,
            None => config::standalone()?,
        };
        if let Some(url) = database {
            config.database.url = url.to_string();
        }

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
            storefront: OnceCell::new(),
        })
    }

    /// Open the storefront on first use.
    pub async fn storefront(&self) -> Result<&Storefront> {
        self.storefront
            .get_or_try_init(|| async {
                self.output
                    .debug(&format!("Opening database {}", self.config.database.url));
                Storefront::open(self.config.clone())
                    .await
                    .with_context(|| {
                        format!("Failed to open database: {}", self.config.database.url)
                    })
            })
            .await
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if PathBuf::from(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }
}
