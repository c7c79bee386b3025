//! Load catalog data from a JSON file.

use std::fs;

use anyhow::{anyhow, Context as _, Result};
use serde::Deserialize;
use storefront_commerce::catalog::{Brand, Category, Product};
use storefront_commerce::{CategoryId, CommerceError, Currency, Money};

use super::SeedArgs;
use crate::context::Context;

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub brands: Vec<Brand>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

/// A product as written in a seed file. Prices are decimal strings in the
/// store currency, e.g. `"15000.00"`.
#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub sku: String,
    pub category: String,
    #[serde(default)]
    pub brand: Option<String>,
    pub price: String,
    #[serde(default)]
    pub old_price: Option<String>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub new: bool,
    /// `[name, value]` pairs in display order.
    #[serde(default)]
    pub specifications: Vec<(String, String)>,
}

fn default_true() -> bool {
    true
}

impl SeedProduct {
    /// Build the catalog product, pricing it in `currency`.
    pub fn into_product(self, currency: Currency) -> Result<Product> {
        let price = parse_price(&self.price, currency)
            .with_context(|| format!("Product '{}'", self.id))?;

        let mut product = Product::new(
            self.name,
            self.slug,
            self.sku,
            CategoryId::new(self.category),
            price,
        )
        .with_id(self.id.as_str())
        .with_stock(self.stock)
        .with_availability(self.available)
        .with_featured(self.featured)
        .with_new(self.new);

        if let Some(old_price) = &self.old_price {
            let old_price = parse_price(old_price, currency)
                .with_context(|| format!("Product '{}'", self.id))?;
            product = product.with_old_price(old_price);
        }
        if let Some(brand) = self.brand {
            product = product.with_brand(brand);
        }
        if let Some(description) = self.description {
            product = product.with_description(description);
        }
        if let Some(text) = self.short_description {
            product = product.with_short_description(text);
        }
        for (name, value) in self.specifications {
            product = product.with_specification(name, value);
        }
        Ok(product)
    }
}

fn parse_price(value: &str, currency: Currency) -> Result<Money> {
    Money::parse(value, currency).ok_or_else(|| anyhow!("Invalid price: '{}'", value))
}

/// Run the seed command.
pub async fn run(args: SeedArgs, ctx: &Context) -> Result<()> {
    let path = ctx.resolve_path(&args.file);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
    let seed: SeedFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse seed file: {}", path.display()))?;

    let shop = ctx.storefront().await?;
    let currency = ctx.config.orders.currency;
    let mut report = SeedReport::default();

    ctx.output.header(&format!("Seeding from {}", path.display()));

    ctx.output.step(1, 3, &format!("{} categories", seed.categories.len()));
    // Parents first, so a child never references a missing parent.
    let (roots, children): (Vec<_>, Vec<_>) = seed
        .categories
        .into_iter()
        .partition(|c| c.parent_id.is_none());
    for category in roots.into_iter().chain(children) {
        let id = category.id.to_string();
        report.record(&id, shop.add_category(category).await, args.skip_existing, ctx)?;
    }

    ctx.output.step(2, 3, &format!("{} brands", seed.brands.len()));
    for brand in seed.brands {
        let id = brand.id.to_string();
        report.record(&id, shop.add_brand(brand).await, args.skip_existing, ctx)?;
    }

    ctx.output.step(3, 3, &format!("{} products", seed.products.len()));
    let pb = ctx.output.progress(seed.products.len() as u64, "products");
    for seed_product in seed.products {
        let id = seed_product.id.clone();
        pb.set_message(id.clone());
        let product = seed_product.into_product(currency)?;
        let result = shop.add_product(product).await;
        if let Err(e) = report.record(&id, result, args.skip_existing, ctx) {
            pb.abandon();
            return Err(e);
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "created": report.created,
            "skipped": report.skipped,
        }));
        return Ok(());
    }
    ctx.output.success(&format!(
        "Seeded {} record(s), skipped {}",
        report.created, report.skipped
    ));
    Ok(())
}

#[derive(Default)]
struct SeedReport {
    created: usize,
    skipped: usize,
}

impl SeedReport {
    fn record<T>(
        &mut self,
        id: &str,
        result: Result<T, CommerceError>,
        skip_existing: bool,
        ctx: &Context,
    ) -> Result<()> {
        match result {
            Ok(_) => {
                self.created += 1;
                ctx.output.debug(&format!("Created {}", id));
                Ok(())
            }
            Err(CommerceError::DuplicateKey { entity, key }) if skip_existing => {
                self.skipped += 1;
                ctx.output
                    .warn(&format!("Skipping {} '{}': {} already exists", entity, id, key));
                Ok(())
            }
            Err(e) => Err(anyhow!(e).context(format!("Failed to seed '{}'", id))),
        }
    }
}
