//! In-process store guarded by a single async lock.

use super::{Store, StoreResult};
use crate::catalog::{Brand, BrandSummary, Category, CategorySummary, Product};
use crate::checkout::{Order, OrderListQuery, OrderStatus};
use crate::contact::{ContactRequest, ContactStatus};
use crate::error::CommerceError;
use crate::ids::{BrandId, CategoryId, ContactRequestId, OrderId, ProductId};
use crate::money::Money;
use crate::search::Filter;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// A [`Store`] that keeps everything in memory.
///
/// Vectors preserve insertion order, which breaks listing ties. Every
/// mutation validates and applies under one write guard, so readers never
/// observe a half-applied commit.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    categories: Vec<Category>,
    brands: Vec<Brand>,
    products: Vec<Product>,
    product_index: HashMap<ProductId, usize>,
    orders: Vec<Order>,
    order_index: HashMap<OrderId, usize>,
    order_numbers: HashMap<String, usize>,
    contacts: Vec<ContactRequest>,
    contact_index: HashMap<ContactRequestId, usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl State {
    fn product_mut(&mut self, id: &ProductId) -> StoreResult<&mut Product> {
        match self.product_index.get(id) {
            Some(&index) => Ok(&mut self.products[index]),
            None => Err(CommerceError::not_found("Product", id)),
        }
    }

    fn order_mut(&mut self, id: &OrderId) -> Option<&mut Order> {
        let index = *self.order_index.get(id)?;
        Some(&mut self.orders[index])
    }

    fn available_count(&self, pred: impl Fn(&Product) -> bool) -> i64 {
        self.products
            .iter()
            .filter(|p| p.is_available && pred(p))
            .count() as i64
    }

    /// Check one order item against current stock, mirroring the
    /// conditional update used by the SQL store.
    fn check_item(&self, product_id: &ProductId, quantity: i64, price: &Money) -> StoreResult<()> {
        let product = self
            .product_index
            .get(product_id)
            .map(|&index| &self.products[index])
            .filter(|p| p.is_available)
            .ok_or_else(|| CommerceError::ProductUnavailable(product_id.to_string()))?;

        if product.price != *price {
            return Err(CommerceError::ConcurrencyConflict(format!(
                "price of {} changed",
                product_id
            )));
        }
        if product.stock < quantity {
            return Err(CommerceError::OutOfStock {
                product_id: product_id.to_string(),
                requested: quantity,
                available: product.stock,
            });
        }
        Ok(())
    }
}

fn duplicate(entity: &'static str, key: impl ToString) -> CommerceError {
    CommerceError::DuplicateKey {
        entity,
        key: key.to_string(),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_category(&self, category: &Category) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if let Some(existing) = state
            .categories
            .iter()
            .find(|c| c.id == category.id || c.slug == category.slug)
        {
            let key = if existing.id == category.id {
                category.id.to_string()
            } else {
                category.slug.clone()
            };
            return Err(duplicate("category", key));
        }
        state.categories.push(category.clone());
        Ok(())
    }

    async fn insert_brand(&self, brand: &Brand) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if let Some(existing) = state
            .brands
            .iter()
            .find(|b| b.id == brand.id || b.slug == brand.slug)
        {
            let key = if existing.id == brand.id {
                brand.id.to_string()
            } else {
                brand.slug.clone()
            };
            return Err(duplicate("brand", key));
        }
        state.brands.push(brand.clone());
        Ok(())
    }

    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.product_index.contains_key(&product.id) {
            return Err(duplicate("product", &product.id));
        }
        if let Some(existing) = state
            .products
            .iter()
            .find(|p| p.slug == product.slug || p.sku == product.sku)
        {
            let key = if existing.slug == product.slug {
                &product.slug
            } else {
                &product.sku
            };
            return Err(duplicate("product", key));
        }
        let mut product = product.clone();
        product.sort_specifications();
        let index = state.products.len();
        state.product_index.insert(product.id.clone(), index);
        state.products.push(product);
        Ok(())
    }

    async fn restock(&self, id: &ProductId, quantity: i64, at: i64) -> StoreResult<Product> {
        let mut state = self.state.write().await;
        let product = state.product_mut(id)?;
        product.stock = product
            .stock
            .checked_add(quantity)
            .ok_or(CommerceError::Overflow)?;
        product.updated_at = at;
        Ok(product.clone())
    }

    async fn set_product_price(
        &self,
        id: &ProductId,
        price: Money,
        at: i64,
    ) -> StoreResult<Product> {
        let mut state = self.state.write().await;
        let product = state.product_mut(id)?;
        product.price = price;
        product.updated_at = at;
        Ok(product.clone())
    }

    async fn set_product_availability(
        &self,
        id: &ProductId,
        available: bool,
        at: i64,
    ) -> StoreResult<Product> {
        let mut state = self.state.write().await;
        let product = state.product_mut(id)?;
        product.is_available = available;
        product.updated_at = at;
        Ok(product.clone())
    }

    async fn get_category(&self, id: &CategoryId) -> StoreResult<Option<Category>> {
        let state = self.state.read().await;
        Ok(state.categories.iter().find(|c| &c.id == id).cloned())
    }

    async fn get_brand(&self, id: &BrandId) -> StoreResult<Option<Brand>> {
        let state = self.state.read().await;
        Ok(state.brands.iter().find(|b| &b.id == id).cloned())
    }

    async fn get_product(&self, id: &ProductId) -> StoreResult<Option<Product>> {
        let state = self.state.read().await;
        Ok(state
            .product_index
            .get(id)
            .map(|&index| state.products[index].clone()))
    }

    async fn query_products(
        &self,
        filter: &Filter,
        offset: i64,
        limit: i64,
    ) -> StoreResult<(Vec<Product>, i64)> {
        let state = self.state.read().await;
        let mut matched: Vec<(usize, &Product)> = state
            .products
            .iter()
            .enumerate()
            .filter(|(_, p)| filter.matches(p))
            .collect();
        matched.sort_by(|(ia, a), (ib, b)| a.listing_cmp(b).then(ia.cmp(ib)));

        let total = matched.len() as i64;
        let page = matched
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|(_, p)| p.clone())
            .collect();
        debug!(total, offset, limit, "memory product query");
        Ok((page, total))
    }

    async fn price_bounds(&self, filter: &Filter) -> StoreResult<Option<(i64, i64)>> {
        let state = self.state.read().await;
        let bounds = state
            .products
            .iter()
            .filter(|p| filter.matches(p))
            .map(|p| p.price.amount_cents)
            .fold(None, |acc: Option<(i64, i64)>, price| match acc {
                None => Some((price, price)),
                Some((min, max)) => Some((min.min(price), max.max(price))),
            });
        Ok(bounds)
    }

    async fn list_categories(&self) -> StoreResult<Vec<CategorySummary>> {
        let state = self.state.read().await;
        let mut categories: Vec<&Category> =
            state.categories.iter().filter(|c| c.is_active).collect();
        categories.sort_by_key(|c| c.sort_order);
        Ok(categories
            .into_iter()
            .map(|c| CategorySummary {
                category: c.clone(),
                product_count: state.available_count(|p| p.category_id == c.id),
            })
            .collect())
    }

    async fn list_brands(&self) -> StoreResult<Vec<BrandSummary>> {
        let state = self.state.read().await;
        let mut brands: Vec<&Brand> = state.brands.iter().filter(|b| b.is_active).collect();
        brands.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(brands
            .into_iter()
            .map(|b| BrandSummary {
                brand: b.clone(),
                product_count: state.available_count(|p| p.brand_id.as_ref() == Some(&b.id)),
            })
            .collect())
    }

    async fn commit_order(&self, order: &Order) -> StoreResult<()> {
        let mut state = self.state.write().await;

        for item in &order.items {
            state.check_item(&item.product_id, item.quantity, &item.price)?;
        }
        if state.order_index.contains_key(&order.id) {
            return Err(duplicate("order", &order.id));
        }
        if state.order_numbers.contains_key(&order.order_number) {
            return Err(duplicate("order", &order.order_number));
        }

        for item in &order.items {
            let product = state.product_mut(&item.product_id)?;
            product.stock -= item.quantity;
            product.updated_at = order.created_at;
        }

        let index = state.orders.len();
        state.order_index.insert(order.id.clone(), index);
        state.order_numbers.insert(order.order_number.clone(), index);
        state.orders.push(order.clone());
        Ok(())
    }

    async fn get_order(&self, id: &OrderId) -> StoreResult<Option<Order>> {
        let state = self.state.read().await;
        Ok(state
            .order_index
            .get(id)
            .map(|&index| state.orders[index].clone()))
    }

    async fn find_order_by_number(&self, order_number: &str) -> StoreResult<Option<Order>> {
        let state = self.state.read().await;
        Ok(state
            .order_numbers
            .get(order_number)
            .map(|&index| state.orders[index].clone()))
    }

    async fn list_orders(
        &self,
        query: &OrderListQuery,
        offset: i64,
        limit: i64,
    ) -> StoreResult<(Vec<Order>, i64)> {
        let state = self.state.read().await;
        let mut matched: Vec<(usize, &Order)> = state
            .orders
            .iter()
            .enumerate()
            .filter(|(_, o)| query.matches(o))
            .collect();
        matched.sort_by(|(ia, a), (ib, b)| {
            b.created_at.cmp(&a.created_at).then(ib.cmp(ia))
        });

        let total = matched.len() as i64;
        let page = matched
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|(_, o)| o.clone())
            .collect();
        Ok((page, total))
    }

    async fn update_order_status(
        &self,
        id: &OrderId,
        expected: OrderStatus,
        next: OrderStatus,
        at: i64,
    ) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        match state.order_mut(id) {
            Some(order) if order.status == expected => {
                order.status = next;
                order.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn cancel_order(&self, id: &OrderId, expected: OrderStatus, at: i64) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let items: Vec<(ProductId, i64)> = match state.order_mut(id) {
            Some(order) if order.status == expected => order
                .items
                .iter()
                .map(|i| (i.product_id.clone(), i.quantity))
                .collect(),
            _ => return Ok(false),
        };

        // Compute every restored level before writing anything.
        let mut restored: Vec<(usize, i64)> = Vec::with_capacity(items.len());
        for (product_id, quantity) in items {
            // Products are never deleted, but a missing one must not block the cancel.
            let Some(&index) = state.product_index.get(&product_id) else {
                continue;
            };
            let current = restored
                .iter()
                .find(|(i, _)| *i == index)
                .map_or(state.products[index].stock, |(_, stock)| *stock);
            let stock = current.checked_add(quantity).ok_or(CommerceError::Overflow)?;
            match restored.iter_mut().find(|(i, _)| *i == index) {
                Some(entry) => entry.1 = stock,
                None => restored.push((index, stock)),
            }
        }

        for (index, stock) in restored {
            let product = &mut state.products[index];
            product.stock = stock;
            product.updated_at = at;
        }
        if let Some(order) = state.order_mut(id) {
            order.status = OrderStatus::Cancelled;
            order.cancelled_at = Some(at);
            order.updated_at = at;
        }
        Ok(true)
    }

    async fn update_order_notes(
        &self,
        id: &OrderId,
        notes: Option<&str>,
        at: i64,
    ) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        match state.order_mut(id) {
            Some(order) => {
                order.notes = notes.map(str::to_string);
                order.updated_at = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_contact_request(&self, request: &ContactRequest) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.contact_index.contains_key(&request.id) {
            return Err(duplicate("contact request", &request.id));
        }
        let index = state.contacts.len();
        state.contact_index.insert(request.id.clone(), index);
        state.contacts.push(request.clone());
        Ok(())
    }

    async fn get_contact_request(
        &self,
        id: &ContactRequestId,
    ) -> StoreResult<Option<ContactRequest>> {
        let state = self.state.read().await;
        Ok(state
            .contact_index
            .get(id)
            .map(|&index| state.contacts[index].clone()))
    }

    async fn list_contact_requests(&self, limit: i64) -> StoreResult<Vec<ContactRequest>> {
        let state = self.state.read().await;
        let mut requests: Vec<(usize, &ContactRequest)> =
            state.contacts.iter().enumerate().collect();
        requests.sort_by(|(ia, a), (ib, b)| b.created_at.cmp(&a.created_at).then(ib.cmp(ia)));
        Ok(requests
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn update_contact_status(
        &self,
        id: &ContactRequestId,
        expected: ContactStatus,
        next: ContactStatus,
        at: i64,
    ) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let Some(&index) = state.contact_index.get(id) else {
            return Ok(false);
        };
        let request = &mut state.contacts[index];
        if request.status != expected {
            return Ok(false);
        }
        request.status = next;
        request.updated_at = at;
        Ok(true)
    }
}
