//! Storefront CLI - Command line tool for operating the storefront.
//!
//! Commands:
//! - `storefront seed` - Load categories, brands and products from a file
//! - `storefront products` - Browse the catalog with filters
//! - `storefront price-range` - Show the price bounds of a listing
//! - `storefront categories` / `storefront brands` - Reference data with counts
//! - `storefront order` - Place and manage orders
//! - `storefront contact` - Submit and process contact requests
//! - `storefront config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use commands::{
    ConfigArgs, ContactArgs, OrderArgs, PriceRangeArgs, ProductsArgs, SeedArgs,
};
use storefront_commerce::config::LoggingConfig;

/// Storefront CLI - Manage the catalog, orders and contact requests
#[derive(Parser)]
#[command(name = "storefront")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Database URL (overrides the config file)
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load catalog data from a JSON file
    Seed(SeedArgs),

    /// List products with filters and pagination
    Products(ProductsArgs),

    /// Show the lowest and highest price of a listing
    PriceRange(PriceRangeArgs),

    /// List active categories
    Categories,

    /// List active brands
    Brands,

    /// Place and manage orders
    Order(OrderArgs),

    /// Submit and process contact requests
    Contact(ContactArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = match context::Context::load(config_path, cli.database.as_deref(), output.clone())
        .await
    {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    init_logging(&ctx.config.logging, cli.verbose);

    // Execute command
    let result = match cli.command {
        Commands::Seed(args) => commands::seed::run(args, &ctx).await,
        Commands::Products(args) => commands::catalog::products(args, &ctx).await,
        Commands::PriceRange(args) => commands::catalog::price_range(args, &ctx).await,
        Commands::Categories => commands::catalog::categories(&ctx).await,
        Commands::Brands => commands::catalog::brands(&ctx).await,
        Commands::Order(args) => commands::order::run(args, &ctx).await,
        Commands::Contact(args) => commands::contact::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

/// Send `tracing` events to stderr. `RUST_LOG` wins over the config level.
fn init_logging(config: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
