//! Catalog browsing commands.

use anyhow::Result;
use storefront_commerce::catalog::Product;
use storefront_commerce::search::ProductQuery;

use super::{PriceRangeArgs, ProductsArgs};
use crate::context::Context;
use crate::output::truncate;

const PRODUCT_WIDTHS: [usize; 5] = [18, 32, 16, 6, 10];

/// List products matching the filters.
pub async fn products(args: ProductsArgs, ctx: &Context) -> Result<()> {
    let query = ProductQuery::from_pairs(args.pairs(), ctx.config.orders.currency);
    ctx.output.debug(&format!("Query: {:?}", query));

    let page = ctx.storefront().await?.list_products(&query).await?;

    if ctx.output.is_json() {
        ctx.output.json(&page);
        return Ok(());
    }

    ctx.output.header("Products");
    if page.is_empty() {
        ctx.output.info("No products match the filters.");
        return Ok(());
    }

    ctx.output
        .table_header(&["ID", "NAME", "PRICE", "STOCK", "FLAGS"], &PRODUCT_WIDTHS);
    for product in &page.items {
        let name = truncate(&product.name, PRODUCT_WIDTHS[1]);
        let price = product.price.display();
        let stock = product.stock.to_string();
        let flags = flags(product);
        ctx.output.table_row(
            &[product.id.as_str(), &name, &price, &stock, &flags],
            &PRODUCT_WIDTHS,
        );
    }

    let p = &page.pagination;
    ctx.output.info("");
    ctx.output.info(&format!(
        "Page {} of {} ({} product(s))",
        p.page, p.total_pages, p.total
    ));
    if p.has_next {
        ctx.output
            .info(&format!("Next page: storefront products --page {}", p.page + 1));
    }

    Ok(())
}

/// Show the price bounds of a listing, ignoring any price filter.
pub async fn price_range(args: PriceRangeArgs, ctx: &Context) -> Result<()> {
    let pairs: Vec<(&str, &str)> = [
        ("category", &args.category),
        ("brand", &args.brand),
        ("search", &args.search),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
    .collect();
    let query = ProductQuery::from_pairs(pairs, ctx.config.orders.currency);

    let range = ctx.storefront().await?.get_price_range(&query).await?;

    if ctx.output.is_json() {
        ctx.output.json(&range);
        return Ok(());
    }

    ctx.output.header("Price range");
    ctx.output.kv("min", &range.min.display());
    ctx.output.kv("max", &range.max.display());
    Ok(())
}

/// List active categories with their product counts.
pub async fn categories(ctx: &Context) -> Result<()> {
    let categories = ctx.storefront().await?.list_categories().await?;

    if ctx.output.is_json() {
        ctx.output.json(&categories);
        return Ok(());
    }

    ctx.output.header("Categories");
    if categories.is_empty() {
        ctx.output.info("No categories yet. Run `storefront seed` to load some.");
        return Ok(());
    }

    let widths = [18, 32, 8];
    ctx.output.table_header(&["ID", "NAME", "PRODUCTS"], &widths);
    for summary in &categories {
        let category = &summary.category;
        let name = match &category.parent_id {
            Some(parent) => format!("{} ({})", category.name, parent),
            None => category.name.clone(),
        };
        ctx.output.table_row(
            &[
                category.id.as_str(),
                &truncate(&name, widths[1]),
                &summary.product_count.to_string(),
            ],
            &widths,
        );
    }
    Ok(())
}

/// List active brands with their product counts.
pub async fn brands(ctx: &Context) -> Result<()> {
    let brands = ctx.storefront().await?.list_brands().await?;

    if ctx.output.is_json() {
        ctx.output.json(&brands);
        return Ok(());
    }

    ctx.output.header("Brands");
    if brands.is_empty() {
        ctx.output.info("No brands yet.");
        return Ok(());
    }

    let widths = [18, 32, 8];
    ctx.output.table_header(&["ID", "NAME", "PRODUCTS"], &widths);
    for summary in &brands {
        ctx.output.table_row(
            &[
                summary.brand.id.as_str(),
                &truncate(&summary.brand.name, widths[1]),
                &summary.product_count.to_string(),
            ],
            &widths,
        );
    }
    Ok(())
}

fn flags(product: &Product) -> String {
    let mut flags = Vec::new();
    if product.is_featured {
        flags.push("featured");
    }
    if product.is_new {
        flags.push("new");
    }
    if product.is_on_sale() {
        flags.push("sale");
    }
    if !product.is_in_stock() {
        flags.push("sold out");
    }
    flags.join(",")
}
