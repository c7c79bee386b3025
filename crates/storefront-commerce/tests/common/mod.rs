//! Shared fixtures: every scenario runs against each storage backend.

#![allow(dead_code)]

use std::sync::Arc;
use storefront_commerce::prelude::*;
use tempfile::TempDir;

pub struct Fixture {
    pub name: &'static str,
    pub shop: Arc<Storefront>,
    _dir: Option<TempDir>,
}

fn fixture(
    name: &'static str,
    config: &StorefrontConfig,
    store: Arc<dyn Store>,
    dir: Option<TempDir>,
) -> Fixture {
    Fixture {
        name,
        shop: Arc::new(Storefront::with_store(config.clone(), store)),
        _dir: dir,
    }
}

/// The in-memory store, an in-memory SQLite database and a file-backed one.
pub async fn backends() -> Vec<Fixture> {
    backends_with(StorefrontConfig::default()).await
}

pub async fn backends_with(config: StorefrontConfig) -> Vec<Fixture> {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}", dir.path().join("shop.db").display());
    vec![
        fixture("memory", &config, Arc::new(MemoryStore::new()), None),
        fixture(
            "sqlite-memory",
            &config,
            Arc::new(SqliteStore::in_memory().await.expect("sqlite memory")),
            None,
        ),
        fixture(
            "sqlite-file",
            &config,
            Arc::new(SqliteStore::open(&url).await.expect("sqlite file")),
            Some(dir),
        ),
    ]
}

pub fn rub(cents: i64) -> Money {
    Money::new(cents, Currency::RUB)
}

pub fn customer() -> CustomerInfo {
    CustomerInfo::new("Ivan Petrov", "ivan@example.ru", "+7 916 123-45-67")
}

pub fn order_for(lines: &[(&str, i64)]) -> PlaceOrder {
    PlaceOrder::new(
        customer(),
        lines
            .iter()
            .map(|(id, qty)| OrderLine::new(*id, *qty))
            .collect(),
    )
}

pub async fn stock_of(shop: &Storefront, id: &str) -> i64 {
    shop.get_product(&ProductId::new(id))
        .await
        .expect("product")
        .stock
}

/// A single "general" category to hang ad-hoc products on.
pub async fn general_category(shop: &Storefront) {
    shop.add_category(Category::new("General", "general").with_id("general"))
        .await
        .expect("category");
}

pub async fn simple_product(shop: &Storefront, id: &str, cents: i64, stock: i64) -> Product {
    shop.add_product(
        Product::new(id, id, format!("SKU-{}", id), CategoryId::new("general"), rub(cents))
            .with_id(id)
            .with_stock(stock),
    )
    .await
    .expect("product")
}

/// Catalog used by the listing tests.
///
/// | id              | category  | brand     | price     | flags              |
/// |-----------------|-----------|-----------|-----------|--------------------|
/// | zebra-printer   | printers  | zebra     | 15 000.00 | created 100        |
/// | honey-scanner   | scanners  | honeywell |  8 000.00 | created 200, spec  |
/// | zebra-scanner   | scanners  | zebra     |  6 500.00 | featured           |
/// | atol-terminal   | terminals | atol      | 25 000.00 | new                |
/// | zebra-old       | printers  | zebra     |  1 000.00 | not available      |
pub async fn seed_catalog(shop: &Storefront) {
    for category in [
        Category::new("Printers", "printers").with_id("printers").with_sort_order(2),
        Category::new("Scanners", "scanners").with_id("scanners").with_sort_order(1),
        Category::new("Terminals", "terminals").with_id("terminals").with_sort_order(3),
        Category::new("Archive", "archive").with_id("archive").with_active(false),
    ] {
        shop.add_category(category).await.expect("category");
    }

    for brand in [
        Brand::new("Zebra", "zebra").with_id("zebra"),
        Brand::new("Honeywell", "honeywell").with_id("honeywell"),
        Brand::new("Atol", "atol").with_id("atol"),
    ] {
        shop.add_brand(brand).await.expect("brand");
    }

    let products = [
        Product::new("Zebra ZD421", "zebra-zd421", "ZD421", CategoryId::new("printers"), rub(1_500_000))
            .with_id("zebra-printer")
            .with_brand("zebra")
            .with_stock(5)
            .with_description("Desktop label printer")
            .with_created_at(100),
        Product::new("Honeywell Voyager", "voyager", "HV-1470", CategoryId::new("scanners"), rub(800_000))
            .with_id("honey-scanner")
            .with_brand("honeywell")
            .with_stock(3)
            .with_specification("Interface", "Bluetooth")
            .with_created_at(200),
        Product::new("Zebra DS2208", "zebra-ds2208", "DS2208", CategoryId::new("scanners"), rub(650_000))
            .with_id("zebra-scanner")
            .with_brand("zebra")
            .with_stock(10)
            .with_featured(true)
            .with_created_at(300),
        Product::new("Atol Sigma", "atol-sigma", "SIGMA-10", CategoryId::new("terminals"), rub(2_500_000))
            .with_id("atol-terminal")
            .with_brand("atol")
            .with_stock(2)
            .with_new(true)
            .with_short_description("Smart cash terminal")
            .with_created_at(400),
        Product::new("Zebra GK420", "zebra-gk420", "GK420", CategoryId::new("printers"), rub(100_000))
            .with_id("zebra-old")
            .with_brand("zebra")
            .with_stock(5)
            .with_availability(false)
            .with_created_at(500),
    ];
    for product in products {
        shop.add_product(product).await.expect("product");
    }
}

pub fn ids(products: &[Product]) -> Vec<&str> {
    products.iter().map(|p| p.id.as_str()).collect()
}
