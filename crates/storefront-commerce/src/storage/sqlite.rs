//! SQLite store.
//!
//! Order placement runs the conditional stock decrement as the first write
//! of its transaction: `stock >= quantity` is checked by the same statement
//! that changes it, so concurrent checkouts cannot oversell.

use super::{Store, StoreResult};
use crate::catalog::{Brand, BrandSummary, Category, CategorySummary, Product, Specification};
use crate::checkout::{CustomerInfo, Order, OrderItem, OrderListQuery, OrderStatus};
use crate::contact::{ContactRequest, ContactStatus};
use crate::error::CommerceError;
use crate::ids::{BrandId, CategoryId, ContactRequestId, OrderId, ProductId};
use crate::money::{Currency, Money};
use crate::search::Filter;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use storefront_db::{params, Db, DbError, DbOptions, Transaction, Value};
use tracing::{debug, info};

const SCHEMA: &str = include_str!("schema.sql");

const PRODUCT_COLUMNS: &str = "id, name, slug, sku, description, short_description, \
     price_cents, old_price_cents, currency, stock, is_available, is_featured, is_new, \
     category_id, brand_id, created_at, updated_at";

const PRODUCT_ORDER: &str = "ORDER BY is_featured DESC, is_new DESC, created_at DESC, rowid ASC";

const ORDER_COLUMNS: &str = "id, order_number, customer_name, customer_email, customer_phone, \
     customer_company, delivery_method, delivery_address, payment_method, notes, total_cents, \
     currency, status, created_at, updated_at, cancelled_at";

const CONTACT_COLUMNS: &str =
    "id, name, phone, email, company, equipment, message, status, created_at, updated_at";

/// A [`Store`] backed by SQLite through `storefront-db`.
#[derive(Clone)]
pub struct SqliteStore {
    db: Db,
}

impl SqliteStore {
    /// Open (or create) the database at `url` and apply the schema.
    pub async fn open(url: &str) -> StoreResult<Self> {
        Self::open_with(DbOptions::new(url)).await
    }

    /// Open with explicit connection options and apply the schema.
    pub async fn open_with(options: DbOptions) -> StoreResult<Self> {
        let db = Db::connect_with(options).await?;
        let store = Self { db };
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-memory database, mostly for tests.
    pub async fn in_memory() -> StoreResult<Self> {
        Self::open("sqlite::memory:").await
    }

    /// Apply the schema. Safe to run on every start.
    pub async fn migrate(&self) -> StoreResult<()> {
        self.db.execute_script(SCHEMA).await?;
        info!("storefront schema applied");
        Ok(())
    }

    /// The underlying database handle.
    pub fn db(&self) -> &Db {
        &self.db
    }

    async fn fetch_product(&self, id: &ProductId) -> StoreResult<Product> {
        self.get_product(id)
            .await?
            .ok_or_else(|| CommerceError::not_found("Product", id))
    }

    async fn product_exists(&self, id: &ProductId) -> StoreResult<bool> {
        let row: Option<CountRow> = self
            .db
            .query_optional(
                "SELECT COUNT(*) AS total FROM products WHERE id = ?",
                params![id.as_str()],
            )
            .await?;
        Ok(row.is_some_and(|r| r.total > 0))
    }
}

// Row shapes as stored. Booleans are INTEGER columns.

#[derive(Debug, Deserialize)]
struct CountRow {
    total: i64,
}

#[derive(Debug, Deserialize)]
struct BoundsRow {
    min_price: Option<i64>,
    max_price: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CategoryRow {
    id: String,
    name: String,
    slug: String,
    description: Option<String>,
    parent_id: Option<String>,
    is_active: i64,
    sort_order: i64,
    #[serde(default)]
    product_count: i64,
}

impl CategoryRow {
    fn into_category(self) -> Category {
        Category {
            id: CategoryId::new(self.id),
            name: self.name,
            slug: self.slug,
            description: self.description,
            parent_id: self.parent_id.map(CategoryId::new),
            is_active: self.is_active != 0,
            sort_order: self.sort_order as i32,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BrandRow {
    id: String,
    name: String,
    slug: String,
    description: Option<String>,
    website: Option<String>,
    is_active: i64,
    #[serde(default)]
    product_count: i64,
}

impl BrandRow {
    fn into_brand(self) -> Brand {
        Brand {
            id: BrandId::new(self.id),
            name: self.name,
            slug: self.slug,
            description: self.description,
            website: self.website,
            is_active: self.is_active != 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProductRow {
    id: String,
    name: String,
    slug: String,
    sku: String,
    description: Option<String>,
    short_description: Option<String>,
    price_cents: i64,
    old_price_cents: Option<i64>,
    currency: String,
    stock: i64,
    is_available: i64,
    is_featured: i64,
    is_new: i64,
    category_id: String,
    brand_id: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl ProductRow {
    fn into_product(self, specifications: Vec<Specification>) -> StoreResult<Product> {
        let currency = parse_currency(&self.currency)?;
        Ok(Product {
            id: ProductId::new(self.id),
            name: self.name,
            slug: self.slug,
            sku: self.sku,
            description: self.description,
            short_description: self.short_description,
            price: Money::new(self.price_cents, currency),
            old_price: self.old_price_cents.map(|c| Money::new(c, currency)),
            stock: self.stock,
            is_available: self.is_available != 0,
            is_featured: self.is_featured != 0,
            is_new: self.is_new != 0,
            category_id: CategoryId::new(self.category_id),
            brand_id: self.brand_id.map(BrandId::new),
            specifications,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SpecificationRow {
    product_id: String,
    name: String,
    value: String,
    spec_group: Option<String>,
    sort_order: i64,
}

#[derive(Debug, Deserialize)]
struct StockRow {
    is_available: i64,
    stock: i64,
    price_cents: i64,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct OrderRow {
    id: String,
    order_number: String,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    customer_company: Option<String>,
    delivery_method: Option<String>,
    delivery_address: Option<String>,
    payment_method: Option<String>,
    notes: Option<String>,
    total_cents: i64,
    currency: String,
    status: String,
    created_at: i64,
    updated_at: i64,
    cancelled_at: Option<i64>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> StoreResult<Order> {
        let currency = parse_currency(&self.currency)?;
        Ok(Order {
            id: OrderId::new(self.id),
            order_number: self.order_number,
            customer: CustomerInfo {
                name: self.customer_name,
                email: self.customer_email,
                phone: self.customer_phone,
                company: self.customer_company,
            },
            delivery_method: self.delivery_method,
            delivery_address: self.delivery_address,
            payment_method: self.payment_method,
            notes: self.notes,
            total: Money::new(self.total_cents, currency),
            status: self.status.parse()?,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
            cancelled_at: self.cancelled_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OrderItemRow {
    id: String,
    order_id: String,
    product_id: String,
    product_name: String,
    sku: String,
    quantity: i64,
    price_cents: i64,
    total_cents: i64,
    currency: String,
}

impl OrderItemRow {
    fn into_item(self) -> StoreResult<OrderItem> {
        let currency = parse_currency(&self.currency)?;
        Ok(OrderItem {
            id: self.id.into(),
            order_id: OrderId::new(self.order_id),
            product_id: ProductId::new(self.product_id),
            product_name: self.product_name,
            sku: self.sku,
            quantity: self.quantity,
            price: Money::new(self.price_cents, currency),
            total: Money::new(self.total_cents, currency),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ContactRow {
    id: String,
    name: String,
    phone: String,
    email: Option<String>,
    company: Option<String>,
    equipment: Option<String>,
    message: String,
    status: String,
    created_at: i64,
    updated_at: i64,
}

impl ContactRow {
    fn into_request(self) -> StoreResult<ContactRequest> {
        Ok(ContactRequest {
            id: ContactRequestId::new(self.id),
            name: self.name,
            phone: self.phone,
            email: self.email,
            company: self.company,
            equipment: self.equipment,
            message: self.message,
            status: self.status.parse()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn parse_currency(code: &str) -> StoreResult<Currency> {
    Currency::from_code(code)
        .ok_or_else(|| CommerceError::Serialization(format!("unknown currency '{}'", code)))
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Map a unique violation to the key that caused it. `columns` pairs the
/// column name SQLite reports with the value that was written.
fn unique_violation(entity: &'static str, columns: &[(&str, &str)], err: DbError) -> CommerceError {
    match err {
        DbError::UniqueViolation(message) => {
            let key = columns
                .iter()
                .find(|(column, _)| message.contains(&format!(".{}", column)))
                .or(columns.first())
                .map(|(_, value)| value.to_string())
                .unwrap_or(message);
            CommerceError::DuplicateKey { entity, key }
        }
        other => other.into(),
    }
}

async fn load_specifications(
    tx: &mut Transaction,
    product_ids: &[&str],
) -> StoreResult<HashMap<String, Vec<Specification>>> {
    let mut grouped: HashMap<String, Vec<Specification>> = HashMap::new();
    if product_ids.is_empty() {
        return Ok(grouped);
    }
    let sql = format!(
        "SELECT product_id, name, value, spec_group, sort_order FROM product_specifications \
         WHERE product_id IN ({}) ORDER BY product_id, sort_order, position",
        placeholders(product_ids.len())
    );
    let params: Vec<Value> = product_ids.iter().map(|id| Value::from(*id)).collect();
    let rows: Vec<SpecificationRow> = tx.query_as(&sql, &params).await?;
    for row in rows {
        grouped.entry(row.product_id).or_default().push(Specification {
            name: row.name,
            value: row.value,
            group: row.spec_group,
            sort_order: row.sort_order as i32,
        });
    }
    Ok(grouped)
}

async fn hydrate_products(tx: &mut Transaction, rows: Vec<ProductRow>) -> StoreResult<Vec<Product>> {
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    let mut specifications = load_specifications(tx, &ids).await?;
    rows.into_iter()
        .map(|row| {
            let specs = specifications.remove(&row.id).unwrap_or_default();
            row.into_product(specs)
        })
        .collect()
}

async fn load_items(
    tx: &mut Transaction,
    order_ids: &[&str],
) -> StoreResult<HashMap<String, Vec<OrderItem>>> {
    let mut grouped: HashMap<String, Vec<OrderItem>> = HashMap::new();
    if order_ids.is_empty() {
        return Ok(grouped);
    }
    let sql = format!(
        "SELECT id, order_id, product_id, product_name, sku, quantity, price_cents, total_cents, \
         currency FROM order_items WHERE order_id IN ({}) ORDER BY order_id, position",
        placeholders(order_ids.len())
    );
    let params: Vec<Value> = order_ids.iter().map(|id| Value::from(*id)).collect();
    let rows: Vec<OrderItemRow> = tx.query_as(&sql, &params).await?;
    for row in rows {
        let order_id = row.order_id.clone();
        grouped.entry(order_id).or_default().push(row.into_item()?);
    }
    Ok(grouped)
}

async fn hydrate_orders(tx: &mut Transaction, rows: Vec<OrderRow>) -> StoreResult<Vec<Order>> {
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    let mut items = load_items(tx, &ids).await?;
    rows.into_iter()
        .map(|row| {
            let order_items = items.remove(&row.id).unwrap_or_default();
            row.into_order(order_items)
        })
        .collect()
}

/// Work out why the conditional decrement for one item matched no row.
async fn classify_stock_failure(tx: &mut Transaction, item: &OrderItem) -> StoreResult<CommerceError> {
    let row: Option<StockRow> = tx
        .query_optional(
            "SELECT is_available, stock, price_cents, currency FROM products WHERE id = ?",
            params![item.product_id.as_str()],
        )
        .await?;

    let error = match row {
        Some(row) if row.is_available != 0 => {
            if row.price_cents != item.price.amount_cents
                || row.currency != item.price.currency.code()
            {
                CommerceError::ConcurrencyConflict(format!("price of {} changed", item.product_id))
            } else {
                CommerceError::OutOfStock {
                    product_id: item.product_id.to_string(),
                    requested: item.quantity,
                    available: row.stock,
                }
            }
        }
        _ => CommerceError::ProductUnavailable(item.product_id.to_string()),
    };
    Ok(error)
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_category(&self, category: &Category) -> StoreResult<()> {
        self.db
            .execute(
                "INSERT INTO categories (id, name, slug, description, parent_id, is_active, sort_order) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    category.id.as_str(),
                    category.name.as_str(),
                    category.slug.as_str(),
                    category.description.as_deref(),
                    category.parent_id.as_ref().map(|p| p.as_str()),
                    category.is_active,
                    category.sort_order,
                ],
            )
            .await
            .map_err(|e| {
                unique_violation(
                    "category",
                    &[("slug", category.slug.as_str()), ("id", category.id.as_str())],
                    e,
                )
            })?;
        Ok(())
    }

    async fn insert_brand(&self, brand: &Brand) -> StoreResult<()> {
        self.db
            .execute(
                "INSERT INTO brands (id, name, slug, description, website, is_active) \
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    brand.id.as_str(),
                    brand.name.as_str(),
                    brand.slug.as_str(),
                    brand.description.as_deref(),
                    brand.website.as_deref(),
                    brand.is_active,
                ],
            )
            .await
            .map_err(|e| {
                unique_violation(
                    "brand",
                    &[("slug", brand.slug.as_str()), ("id", brand.id.as_str())],
                    e,
                )
            })?;
        Ok(())
    }

    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        let mut tx = self.db.begin().await?;
        tx.execute(
            &format!(
                "INSERT INTO products ({}, search_text) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                PRODUCT_COLUMNS
            ),
            params![
                product.id.as_str(),
                product.name.as_str(),
                product.slug.as_str(),
                product.sku.as_str(),
                product.description.as_deref(),
                product.short_description.as_deref(),
                product.price.amount_cents,
                product.old_price.map(|p| p.amount_cents),
                product.price.currency.code(),
                product.stock,
                product.is_available,
                product.is_featured,
                product.is_new,
                product.category_id.as_str(),
                product.brand_id.as_ref().map(|b| b.as_str()),
                product.created_at,
                product.updated_at,
                product.search_text(),
            ],
        )
        .await
        .map_err(|e| {
            unique_violation(
                "product",
                &[
                    ("sku", product.sku.as_str()),
                    ("slug", product.slug.as_str()),
                    ("id", product.id.as_str()),
                ],
                e,
            )
        })?;

        for (position, spec) in product.specifications.iter().enumerate() {
            tx.execute(
                "INSERT INTO product_specifications \
                 (product_id, position, name, value, spec_group, sort_order) \
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    product.id.as_str(),
                    position as i64,
                    spec.name.as_str(),
                    spec.value.as_str(),
                    spec.group.as_deref(),
                    spec.sort_order,
                ],
            )
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn restock(&self, id: &ProductId, quantity: i64, at: i64) -> StoreResult<Product> {
        let updated = self
            .db
            .execute(
                "UPDATE products SET stock = stock + ?, updated_at = ? WHERE id = ? AND stock <= ?",
                params![quantity, at, id.as_str(), i64::MAX - quantity.max(0)],
            )
            .await?;
        if updated == 0 {
            return Err(if self.product_exists(id).await? {
                CommerceError::Overflow
            } else {
                CommerceError::not_found("Product", id)
            });
        }
        self.fetch_product(id).await
    }

    async fn set_product_price(
        &self,
        id: &ProductId,
        price: Money,
        at: i64,
    ) -> StoreResult<Product> {
        let updated = self
            .db
            .execute(
                "UPDATE products SET price_cents = ?, currency = ?, updated_at = ? WHERE id = ?",
                params![price.amount_cents, price.currency.code(), at, id.as_str()],
            )
            .await?;
        if updated == 0 {
            return Err(CommerceError::not_found("Product", id));
        }
        self.fetch_product(id).await
    }

    async fn set_product_availability(
        &self,
        id: &ProductId,
        available: bool,
        at: i64,
    ) -> StoreResult<Product> {
        let updated = self
            .db
            .execute(
                "UPDATE products SET is_available = ?, updated_at = ? WHERE id = ?",
                params![available, at, id.as_str()],
            )
            .await?;
        if updated == 0 {
            return Err(CommerceError::not_found("Product", id));
        }
        self.fetch_product(id).await
    }

    async fn get_category(&self, id: &CategoryId) -> StoreResult<Option<Category>> {
        let row: Option<CategoryRow> = self
            .db
            .query_optional(
                "SELECT id, name, slug, description, parent_id, is_active, sort_order \
                 FROM categories WHERE id = ?",
                params![id.as_str()],
            )
            .await?;
        Ok(row.map(CategoryRow::into_category))
    }

    async fn get_brand(&self, id: &BrandId) -> StoreResult<Option<Brand>> {
        let row: Option<BrandRow> = self
            .db
            .query_optional(
                "SELECT id, name, slug, description, website, is_active FROM brands WHERE id = ?",
                params![id.as_str()],
            )
            .await?;
        Ok(row.map(BrandRow::into_brand))
    }

    async fn get_product(&self, id: &ProductId) -> StoreResult<Option<Product>> {
        let mut tx = self.db.begin().await?;
        let row: Option<ProductRow> = tx
            .query_optional(
                &format!("SELECT {} FROM products WHERE id = ?", PRODUCT_COLUMNS),
                params![id.as_str()],
            )
            .await?;
        let product = match row {
            Some(row) => hydrate_products(&mut tx, vec![row]).await?.pop(),
            None => None,
        };
        tx.commit().await?;
        Ok(product)
    }

    async fn query_products(
        &self,
        filter: &Filter,
        offset: i64,
        limit: i64,
    ) -> StoreResult<(Vec<Product>, i64)> {
        let (predicate, mut params) = filter.to_sql();

        let mut tx = self.db.begin().await?;
        let count: Option<CountRow> = tx
            .query_optional(
                &format!("SELECT COUNT(*) AS total FROM products WHERE {}", predicate),
                &params,
            )
            .await?;
        let total = count.map_or(0, |c| c.total);

        params.push(Value::from(limit.max(0)));
        params.push(Value::from(offset.max(0)));
        let rows: Vec<ProductRow> = tx
            .query_as(
                &format!(
                    "SELECT {} FROM products WHERE {} {} LIMIT ? OFFSET ?",
                    PRODUCT_COLUMNS, predicate, PRODUCT_ORDER
                ),
                &params,
            )
            .await?;
        let products = hydrate_products(&mut tx, rows).await?;
        tx.commit().await?;

        debug!(%predicate, total, offset, limit, "sqlite product query");
        Ok((products, total))
    }

    async fn price_bounds(&self, filter: &Filter) -> StoreResult<Option<(i64, i64)>> {
        let (predicate, params) = filter.to_sql();
        let row: Option<BoundsRow> = self
            .db
            .query_optional(
                &format!(
                    "SELECT MIN(price_cents) AS min_price, MAX(price_cents) AS max_price \
                     FROM products WHERE {}",
                    predicate
                ),
                &params,
            )
            .await?;
        Ok(row.and_then(|r| r.min_price.zip(r.max_price)))
    }

    async fn list_categories(&self) -> StoreResult<Vec<CategorySummary>> {
        let rows: Vec<CategoryRow> = self
            .db
            .query_as(
                "SELECT c.id, c.name, c.slug, c.description, c.parent_id, c.is_active, c.sort_order, \
                 (SELECT COUNT(*) FROM products p WHERE p.category_id = c.id AND p.is_available = 1) \
                 AS product_count \
                 FROM categories c WHERE c.is_active = 1 ORDER BY c.sort_order ASC, c.rowid ASC",
                params![],
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let product_count = row.product_count;
                CategorySummary {
                    category: row.into_category(),
                    product_count,
                }
            })
            .collect())
    }

    async fn list_brands(&self) -> StoreResult<Vec<BrandSummary>> {
        let rows: Vec<BrandRow> = self
            .db
            .query_as(
                "SELECT b.id, b.name, b.slug, b.description, b.website, b.is_active, \
                 (SELECT COUNT(*) FROM products p WHERE p.brand_id = b.id AND p.is_available = 1) \
                 AS product_count \
                 FROM brands b WHERE b.is_active = 1 ORDER BY b.name ASC, b.rowid ASC",
                params![],
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let product_count = row.product_count;
                BrandSummary {
                    brand: row.into_brand(),
                    product_count,
                }
            })
            .collect())
    }

    async fn commit_order(&self, order: &Order) -> StoreResult<()> {
        let mut tx = self.db.begin().await?;

        for item in &order.items {
            let updated = tx
                .execute(
                    "UPDATE products SET stock = stock - ?, updated_at = ? \
                     WHERE id = ? AND is_available = 1 AND stock >= ? \
                     AND price_cents = ? AND currency = ?",
                    params![
                        item.quantity,
                        order.created_at,
                        item.product_id.as_str(),
                        item.quantity,
                        item.price.amount_cents,
                        item.price.currency.code(),
                    ],
                )
                .await?;
            if updated == 0 {
                let error = classify_stock_failure(&mut tx, item).await?;
                tx.rollback().await?;
                debug!(order_number = %order.order_number, error = %error, "order commit rejected");
                return Err(error);
            }
        }

        tx.execute(
            &format!(
                "INSERT INTO orders ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                ORDER_COLUMNS
            ),
            params![
                order.id.as_str(),
                order.order_number.as_str(),
                order.customer.name.as_str(),
                order.customer.email.as_str(),
                order.customer.phone.as_str(),
                order.customer.company.as_deref(),
                order.delivery_method.as_deref(),
                order.delivery_address.as_deref(),
                order.payment_method.as_deref(),
                order.notes.as_deref(),
                order.total.amount_cents,
                order.total.currency.code(),
                order.status.as_str(),
                order.created_at,
                order.updated_at,
                order.cancelled_at,
            ],
        )
        .await
        .map_err(|e| {
            unique_violation(
                "order",
                &[
                    ("order_number", order.order_number.as_str()),
                    ("id", order.id.as_str()),
                ],
                e,
            )
        })?;

        for (position, item) in order.items.iter().enumerate() {
            tx.execute(
                "INSERT INTO order_items (id, order_id, position, product_id, product_name, sku, \
                 quantity, price_cents, total_cents, currency) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    item.id.as_str(),
                    order.id.as_str(),
                    position as i64,
                    item.product_id.as_str(),
                    item.product_name.as_str(),
                    item.sku.as_str(),
                    item.quantity,
                    item.price.amount_cents,
                    item.total.amount_cents,
                    item.total.currency.code(),
                ],
            )
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_order(&self, id: &OrderId) -> StoreResult<Option<Order>> {
        let mut tx = self.db.begin().await?;
        let row: Option<OrderRow> = tx
            .query_optional(
                &format!("SELECT {} FROM orders WHERE id = ?", ORDER_COLUMNS),
                params![id.as_str()],
            )
            .await?;
        let order = match row {
            Some(row) => hydrate_orders(&mut tx, vec![row]).await?.pop(),
            None => None,
        };
        tx.commit().await?;
        Ok(order)
    }

    async fn find_order_by_number(&self, order_number: &str) -> StoreResult<Option<Order>> {
        let mut tx = self.db.begin().await?;
        let row: Option<OrderRow> = tx
            .query_optional(
                &format!("SELECT {} FROM orders WHERE order_number = ?", ORDER_COLUMNS),
                params![order_number],
            )
            .await?;
        let order = match row {
            Some(row) => hydrate_orders(&mut tx, vec![row]).await?.pop(),
            None => None,
        };
        tx.commit().await?;
        Ok(order)
    }

    async fn list_orders(
        &self,
        query: &OrderListQuery,
        offset: i64,
        limit: i64,
    ) -> StoreResult<(Vec<Order>, i64)> {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        if let Some(email) = &query.customer_email {
            clauses.push("customer_email = ?");
            params.push(Value::from(email.as_str()));
        }
        if let Some(status) = query.status {
            clauses.push("status = ?");
            params.push(Value::from(status.as_str()));
        }
        let predicate = if clauses.is_empty() {
            crate::search::NO_PREDICATE.to_string()
        } else {
            clauses.join(" AND ")
        };

        let mut tx = self.db.begin().await?;
        let count: Option<CountRow> = tx
            .query_optional(
                &format!("SELECT COUNT(*) AS total FROM orders WHERE {}", predicate),
                &params,
            )
            .await?;
        let total = count.map_or(0, |c| c.total);

        params.push(Value::from(limit.max(0)));
        params.push(Value::from(offset.max(0)));
        let rows: Vec<OrderRow> = tx
            .query_as(
                &format!(
                    "SELECT {} FROM orders WHERE {} ORDER BY created_at DESC, rowid DESC \
                     LIMIT ? OFFSET ?",
                    ORDER_COLUMNS, predicate
                ),
                &params,
            )
            .await?;
        let orders = hydrate_orders(&mut tx, rows).await?;
        tx.commit().await?;
        Ok((orders, total))
    }

    async fn update_order_status(
        &self,
        id: &OrderId,
        expected: OrderStatus,
        next: OrderStatus,
        at: i64,
    ) -> StoreResult<bool> {
        let updated = self
            .db
            .execute(
                "UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
                params![next.as_str(), at, id.as_str(), expected.as_str()],
            )
            .await?;
        Ok(updated == 1)
    }

    async fn cancel_order(&self, id: &OrderId, expected: OrderStatus, at: i64) -> StoreResult<bool> {
        let mut tx = self.db.begin().await?;
        let updated = tx
            .execute(
                "UPDATE orders SET status = ?, cancelled_at = ?, updated_at = ? \
                 WHERE id = ? AND status = ?",
                params![
                    OrderStatus::Cancelled.as_str(),
                    at,
                    at,
                    id.as_str(),
                    expected.as_str(),
                ],
            )
            .await?;
        if updated == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        // SQLite turns integer overflow into REAL, so reject it up front.
        let overflowing = tx
            .query(
                "SELECT p.id FROM products p \
                 WHERE p.id IN (SELECT product_id FROM order_items WHERE order_id = ?) \
                 AND p.stock > ? - (SELECT SUM(i.quantity) FROM order_items i \
                                    WHERE i.order_id = ? AND i.product_id = p.id) \
                 LIMIT 1",
                params![id.as_str(), i64::MAX, id.as_str()],
            )
            .await?;
        if overflowing.first().is_some() {
            tx.rollback().await?;
            return Err(CommerceError::Overflow);
        }

        let restored = tx
            .execute(
                "UPDATE products SET \
                 stock = stock + (SELECT SUM(i.quantity) FROM order_items i \
                                  WHERE i.order_id = ? AND i.product_id = products.id), \
                 updated_at = ? \
                 WHERE id IN (SELECT product_id FROM order_items WHERE order_id = ?)",
                params![id.as_str(), at, id.as_str()],
            )
            .await?;
        tx.commit().await?;

        debug!(order_id = %id, products = restored, "stock restored");
        Ok(true)
    }

    async fn update_order_notes(
        &self,
        id: &OrderId,
        notes: Option<&str>,
        at: i64,
    ) -> StoreResult<bool> {
        let updated = self
            .db
            .execute(
                "UPDATE orders SET notes = ?, updated_at = ? WHERE id = ?",
                params![notes, at, id.as_str()],
            )
            .await?;
        Ok(updated == 1)
    }

    async fn insert_contact_request(&self, request: &ContactRequest) -> StoreResult<()> {
        self.db
            .execute(
                &format!(
                    "INSERT INTO contact_requests ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    CONTACT_COLUMNS
                ),
                params![
                    request.id.as_str(),
                    request.name.as_str(),
                    request.phone.as_str(),
                    request.email.as_deref(),
                    request.company.as_deref(),
                    request.equipment.as_deref(),
                    request.message.as_str(),
                    request.status.as_str(),
                    request.created_at,
                    request.updated_at,
                ],
            )
            .await
            .map_err(|e| unique_violation("contact request", &[("id", request.id.as_str())], e))?;
        Ok(())
    }

    async fn get_contact_request(
        &self,
        id: &ContactRequestId,
    ) -> StoreResult<Option<ContactRequest>> {
        let row: Option<ContactRow> = self
            .db
            .query_optional(
                &format!("SELECT {} FROM contact_requests WHERE id = ?", CONTACT_COLUMNS),
                params![id.as_str()],
            )
            .await?;
        row.map(ContactRow::into_request).transpose()
    }

    async fn list_contact_requests(&self, limit: i64) -> StoreResult<Vec<ContactRequest>> {
        let rows: Vec<ContactRow> = self
            .db
            .query_as(
                &format!(
                    "SELECT {} FROM contact_requests ORDER BY created_at DESC, rowid DESC LIMIT ?",
                    CONTACT_COLUMNS
                ),
                params![limit.max(0)],
            )
            .await?;
        rows.into_iter().map(ContactRow::into_request).collect()
    }

    async fn update_contact_status(
        &self,
        id: &ContactRequestId,
        expected: ContactStatus,
        next: ContactStatus,
        at: i64,
    ) -> StoreResult<bool> {
        let updated = self
            .db
            .execute(
                "UPDATE contact_requests SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
                params![next.as_str(), at, id.as_str(), expected.as_str()],
            )
            .await?;
        Ok(updated == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_product(stock: i64) -> (SqliteStore, Product) {
        let store = SqliteStore::in_memory().await.unwrap();
        let category = Category::new("Printers", "printers").with_id("printers");
        store.insert_category(&category).await.unwrap();
        let product = Product::new(
            "Label printer",
            "label-printer",
            "LP-1",
            category.id.clone(),
            Money::new(4_999, Currency::RUB),
        )
        .with_id("p-1")
        .with_stock(stock)
        .with_specification("Width", "104 mm");
        store.insert_product(&product).await.unwrap();
        (store, product)
    }

    #[tokio::test]
    async fn test_product_round_trips_with_specifications() {
        let (store, product) = store_with_product(3).await;
        let loaded = store.get_product(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded, product);
    }

    #[tokio::test]
    async fn test_duplicate_sku_reports_key() {
        let (store, product) = store_with_product(3).await;
        let copy = product.clone().with_id("p-2");
        let copy = Product {
            slug: "other-slug".to_string(),
            ..copy
        };
        match store.insert_product(&copy).await {
            Err(CommerceError::DuplicateKey { entity, key }) => {
                assert_eq!(entity, "product");
                assert_eq!(key, "LP-1");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_restock_missing_product() {
        let (store, _) = store_with_product(3).await;
        let result = store.restock(&ProductId::new("nope"), 5, 1).await;
        assert!(matches!(result, Err(CommerceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_price_bounds_empty() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert_eq!(store.price_bounds(&Filter::All).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let (store, _) = store_with_product(1).await;
        store.migrate().await.unwrap();
        assert!(store.get_product(&ProductId::new("p-1")).await.unwrap().is_some());
    }
}
