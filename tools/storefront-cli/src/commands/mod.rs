//! CLI command implementations.

pub mod catalog;
pub mod config;
pub mod contact;
pub mod order;
pub mod seed;

use clap::{Args, Subcommand};

/// Arguments for the seed command.
#[derive(Args)]
pub struct SeedArgs {
    /// JSON file with categories, brands and products.
    #[arg(default_value = "seed.json")]
    pub file: String,

    /// Skip records whose id, slug or SKU already exists.
    #[arg(long)]
    pub skip_existing: bool,
}

/// Arguments for the products command.
///
/// Values are read the same way as storefront query-string parameters.
#[derive(Args)]
pub struct ProductsArgs {
    /// Comma-separated category ids, or `all`.
    #[arg(long)]
    pub category: Option<String>,

    /// Comma-separated brand ids, or `all`.
    #[arg(short, long)]
    pub brand: Option<String>,

    /// Inclusive lower price bound, e.g. `1500.00`.
    #[arg(long)]
    pub min_price: Option<String>,

    /// Inclusive upper price bound.
    #[arg(long)]
    pub max_price: Option<String>,

    /// Search in names, descriptions, SKUs and specifications.
    #[arg(short, long)]
    pub search: Option<String>,

    /// Page number (1-indexed).
    #[arg(short, long)]
    pub page: Option<String>,

    /// Products per page.
    #[arg(short, long)]
    pub limit: Option<String>,
}

impl ProductsArgs {
    /// The arguments as query-string pairs.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        [
            ("category", &self.category),
            ("brand", &self.brand),
            ("minPrice", &self.min_price),
            ("maxPrice", &self.max_price),
            ("search", &self.search),
            ("page", &self.page),
            ("limit", &self.limit),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
        .collect()
    }
}

/// Arguments for the price-range command.
#[derive(Args)]
pub struct PriceRangeArgs {
    /// Comma-separated category ids, or `all`.
    #[arg(long)]
    pub category: Option<String>,

    /// Comma-separated brand ids, or `all`.
    #[arg(short, long)]
    pub brand: Option<String>,

    /// Search text.
    #[arg(short, long)]
    pub search: Option<String>,
}

/// Arguments for the order command.
#[derive(Args)]
pub struct OrderArgs {
    #[command(subcommand)]
    pub command: OrderCommand,
}

#[derive(Subcommand)]
pub enum OrderCommand {
    /// Place an order.
    Place {
        /// Line as `PRODUCT_ID[:QUANTITY]`; repeat for more lines.
        #[arg(short, long = "item", required = true)]
        items: Vec<String>,

        /// Customer name.
        #[arg(long)]
        name: String,

        /// Customer email.
        #[arg(long)]
        email: String,

        /// Customer phone.
        #[arg(long)]
        phone: String,

        /// Customer company.
        #[arg(long)]
        company: Option<String>,

        /// Delivery method.
        #[arg(long)]
        delivery: Option<String>,

        /// Delivery address.
        #[arg(long)]
        address: Option<String>,

        /// Payment method.
        #[arg(long)]
        payment: Option<String>,

        /// Order notes.
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show one order by id or order number.
    Show {
        /// Order id or `ORD-...` number.
        order: String,
    },
    /// List orders, newest first.
    List {
        /// Only orders from this email.
        #[arg(short, long)]
        email: Option<String>,

        /// Only orders in this status, or `all`.
        #[arg(short, long)]
        status: Option<String>,

        /// Page number (1-indexed).
        #[arg(short, long, default_value = "1")]
        page: i64,

        /// Orders per page.
        #[arg(short, long)]
        limit: Option<i64>,
    },
    /// Move an order to a new status.
    Status {
        /// Order id or `ORD-...` number.
        order: String,

        /// Target status, e.g. `confirmed`.
        status: String,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Cancel an order and return its items to stock.
    Cancel {
        /// Order id or `ORD-...` number.
        order: String,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Replace the order notes; no text clears them.
    Notes {
        /// Order id or `ORD-...` number.
        order: String,

        /// New notes.
        text: Option<String>,
    },
}

/// Arguments for the contact command.
#[derive(Args)]
pub struct ContactArgs {
    #[command(subcommand)]
    pub command: ContactCommand,
}

#[derive(Subcommand)]
pub enum ContactCommand {
    /// Submit a contact request.
    Submit {
        /// Contact name.
        #[arg(long)]
        name: String,

        /// Contact phone.
        #[arg(long)]
        phone: String,

        /// Message text.
        #[arg(short, long)]
        message: String,

        /// Contact email.
        #[arg(long)]
        email: Option<String>,

        /// Company name.
        #[arg(long)]
        company: Option<String>,

        /// Equipment the request is about.
        #[arg(long)]
        equipment: Option<String>,
    },
    /// List contact requests, newest first.
    List {
        /// Show at most N requests.
        #[arg(short, long)]
        limit: Option<i64>,
    },
    /// Move a contact request to a new status.
    Status {
        /// Contact request id.
        id: String,

        /// Target status, e.g. `in-progress`.
        status: String,
    },
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration.
    Show,
    /// Print the path of the config file in use.
    Path,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the effective configuration.
    Validate,
}
