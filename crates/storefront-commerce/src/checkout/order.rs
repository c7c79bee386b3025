//! Order types.

use crate::cart::Cart;
use crate::catalog::Product;
use crate::checkout::OrderStatus;
use crate::error::CommerceError;
use crate::ids::{OrderId, OrderItemId, ProductId};
use crate::money::{Currency, Money};
use crate::validation::{is_valid_email, is_valid_phone, optional, required, ValidationErrors};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Prefix of every order number.
pub const ORDER_NUMBER_PREFIX: &str = "ORD";

const SUFFIX_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SUFFIX_LEN: usize = 4;

/// Who placed the order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub company: Option<String>,
}

impl CustomerInfo {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            company: None,
        }
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }
}

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Unique order identifier.
    pub id: OrderId,
    /// Human-readable order number (`ORD-<millis>-<suffix>`).
    pub order_number: String,
    /// Contact details of the buyer.
    pub customer: CustomerInfo,
    /// Delivery method chosen at checkout.
    pub delivery_method: Option<String>,
    /// Delivery address.
    pub delivery_address: Option<String>,
    /// Payment method chosen at checkout.
    pub payment_method: Option<String>,
    /// Customer or manager notes.
    pub notes: Option<String>,
    /// Sum of item totals, computed server-side.
    pub total: Money,
    /// Order status.
    pub status: OrderStatus,
    /// Items in the order.
    pub items: Vec<OrderItem>,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last update.
    pub updated_at: i64,
    /// Unix timestamp when cancelled (if applicable).
    pub cancelled_at: Option<i64>,
}

impl Order {
    /// Generate a new order number from the current time.
    pub fn generate_order_number() -> String {
        generate_order_number(crate::time::current_millis(), &mut rand::thread_rng())
    }

    /// Get total item count.
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Recompute the total from the items.
    pub fn items_total(&self) -> Result<Money, CommerceError> {
        Money::sum(self.items.iter().map(|i| &i.total), self.total.currency)
    }
}

/// A line of a placed order. Name, SKU and price are snapshots taken when
/// the order was placed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    /// Product name at time of order.
    pub product_name: String,
    /// SKU at time of order.
    pub sku: String,
    pub quantity: i64,
    /// Unit price at time of order.
    pub price: Money,
    /// `price * quantity`.
    pub total: Money,
}

/// One requested line of a new order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl OrderLine {
    pub fn new(product_id: impl Into<ProductId>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A request to place an order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaceOrder {
    pub customer: CustomerInfo,
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub delivery_method: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PlaceOrder {
    pub fn new(customer: CustomerInfo, items: Vec<OrderLine>) -> Self {
        Self {
            customer,
            items,
            ..Default::default()
        }
    }

    /// Build an order request from a cart.
    pub fn from_cart(customer: CustomerInfo, cart: &Cart) -> Self {
        let items = cart
            .items
            .iter()
            .map(|line| OrderLine::new(line.product_id.clone(), line.quantity))
            .collect();
        Self::new(customer, items)
    }

    pub fn with_delivery(
        mut self,
        method: impl Into<String>,
        address: Option<String>,
    ) -> Self {
        self.delivery_method = Some(method.into());
        self.delivery_address = address;
        self
    }

    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Validate the request and return a cleaned copy: text trimmed, blank
    /// optionals dropped, lines for the same product merged in order of first
    /// appearance.
    pub fn normalized(&self, max_quantity: i64) -> Result<PlaceOrder, CommerceError> {
        let mut errors = ValidationErrors::new();

        let customer = CustomerInfo {
            name: required(&self.customer.name),
            email: required(&self.customer.email),
            phone: required(&self.customer.phone),
            company: optional(self.customer.company.as_deref()),
        };

        if customer.name.is_empty() {
            errors.add("name", "Name is required");
        }
        if customer.email.is_empty() {
            errors.add("email", "Email is required");
        } else if !is_valid_email(&customer.email) {
            errors.add("email", "Invalid email address");
        }
        if customer.phone.is_empty() {
            errors.add("phone", "Phone is required");
        } else if !is_valid_phone(&customer.phone) {
            errors.add("phone", "Invalid phone number");
        }

        if self.items.is_empty() {
            errors.add("items", "Order must contain at least one item");
        }

        let mut merged: Vec<OrderLine> = Vec::with_capacity(self.items.len());
        for (index, line) in self.items.iter().enumerate() {
            let field = format!("items[{}]", index);
            if line.product_id.as_str().trim().is_empty() {
                errors.add(format!("{}.product_id", field), "Product is required");
                continue;
            }
            if line.quantity < 1 || line.quantity > max_quantity {
                errors.add(
                    format!("{}.quantity", field),
                    format!("Quantity must be between 1 and {}", max_quantity),
                );
                continue;
            }
            match merged.iter_mut().find(|m| m.product_id == line.product_id) {
                Some(existing) => {
                    let total = existing.quantity.checked_add(line.quantity);
                    if let Some(total) = total {
                        existing.quantity = total;
                    }
                    if total.map_or(true, |total| total > max_quantity) {
                        errors.add(
                            format!("{}.quantity", field),
                            format!(
                                "Total quantity of {} exceeds {}",
                                line.product_id, max_quantity
                            ),
                        );
                    }
                }
                None => merged.push(line.clone()),
            }
        }

        errors.into_result()?;

        Ok(PlaceOrder {
            customer,
            items: merged,
            delivery_method: optional(self.delivery_method.as_deref()),
            delivery_address: optional(self.delivery_address.as_deref()),
            payment_method: optional(self.payment_method.as_deref()),
            notes: optional(self.notes.as_deref()),
        })
    }
}

/// Summary returned to the customer after a successful placement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub order_number: String,
    pub total: Money,
    pub status: OrderStatus,
}

impl From<&Order> for OrderReceipt {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id.clone(),
            order_number: order.order_number.clone(),
            total: order.total,
            status: order.status,
        }
    }
}

/// Admin order listing request, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderListQuery {
    /// Exact customer email.
    #[serde(default)]
    pub customer_email: Option<String>,
    /// Only this status.
    #[serde(default)]
    pub status: Option<OrderStatus>,
    /// Current page (1-indexed).
    #[serde(default)]
    pub page: i64,
    /// Items per page.
    #[serde(default)]
    pub per_page: Option<i64>,
}

impl OrderListQuery {
    pub fn new() -> Self {
        Self {
            page: 1,
            ..Default::default()
        }
    }

    pub fn with_customer_email(mut self, email: impl Into<String>) -> Self {
        let email = email.into();
        self.customer_email = optional(Some(email.as_str()));
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the status filter from a request parameter; `all` clears it.
    pub fn with_status_param(mut self, status: &str) -> Result<Self, CommerceError> {
        let status = status.trim();
        self.status = if status.is_empty() || status.eq_ignore_ascii_case("all") {
            None
        } else {
            Some(status.parse()?)
        };
        Ok(self)
    }

    pub fn with_pagination(mut self, page: i64, per_page: i64) -> Self {
        self.page = page.max(1);
        self.per_page = Some(per_page.max(1));
        self
    }

    /// Whether an order passes the email and status filters.
    pub fn matches(&self, order: &Order) -> bool {
        self.customer_email
            .as_ref()
            .map_or(true, |email| &order.customer.email == email)
            && self.status.map_or(true, |status| order.status == status)
    }
}

/// Format an order number: `ORD-<unix millis>-<4 base36 chars>`.
pub fn generate_order_number<R: Rng + ?Sized>(millis: i64, rng: &mut R) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}-{}", ORDER_NUMBER_PREFIX, millis, suffix)
}

/// Build order items from validated lines priced at the products' current
/// prices, returning the items and their sum.
pub(crate) fn build_items(
    order_id: &OrderId,
    lines: &[(Product, i64)],
    currency: Currency,
) -> Result<(Vec<OrderItem>, Money), CommerceError> {
    let mut items = Vec::with_capacity(lines.len());
    let mut total = Money::zero(currency);
    for (product, quantity) in lines {
        let line_total = product.price.checked_mul(*quantity)?;
        total = total.checked_add(&line_total)?;
        items.push(OrderItem {
            id: OrderItemId::generate(),
            order_id: order_id.clone(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            sku: product.sku.clone(),
            quantity: *quantity,
            price: product.price,
            total: line_total,
        });
    }
    Ok((items, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::CategoryId;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn customer() -> CustomerInfo {
        CustomerInfo::new(" Ivan Petrov ", "ivan@example.ru", "+7 916 123-45-67")
    }

    #[test]
    fn test_order_number_format() {
        let mut rng = StdRng::seed_from_u64(7);
        let number = generate_order_number(1_700_000_000_123, &mut rng);
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert_eq!(parts[1], "1700000000123");
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_normalized_trims_and_merges() {
        let request = PlaceOrder::new(
            customer().with_company("  "),
            vec![
                OrderLine::new("a", 2),
                OrderLine::new("b", 1),
                OrderLine::new("a", 3),
            ],
        )
        .with_notes("  call first ");

        let normalized = request.normalized(9999).unwrap();
        assert_eq!(normalized.customer.name, "Ivan Petrov");
        assert_eq!(normalized.customer.company, None);
        assert_eq!(normalized.notes.as_deref(), Some("call first"));
        assert_eq!(
            normalized.items,
            vec![OrderLine::new("a", 5), OrderLine::new("b", 1)]
        );
    }

    #[test]
    fn test_normalized_collects_field_errors() {
        let request = PlaceOrder::new(
            CustomerInfo::new("", "not-an-email", "123"),
            vec![OrderLine::new("a", 0), OrderLine::new("b", 10_000)],
        );

        match request.normalized(9999) {
            Err(CommerceError::Validation(errors)) => {
                assert!(errors.has("name"));
                assert!(errors.has("email"));
                assert!(errors.has("phone"));
                assert!(errors.has("items[0].quantity"));
                assert!(errors.has("items[1].quantity"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_empty_items_rejected() {
        let request = PlaceOrder::new(customer(), vec![]);
        match request.normalized(9999) {
            Err(CommerceError::Validation(errors)) => assert!(errors.has("items")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_merged_quantity_over_cap_rejected() {
        let request = PlaceOrder::new(
            customer(),
            vec![OrderLine::new("a", 6000), OrderLine::new("a", 6000)],
        );
        assert!(request.normalized(9999).is_err());
    }

    #[test]
    fn test_merged_quantity_overflow_rejected() {
        let request = PlaceOrder::new(
            customer(),
            vec![OrderLine::new("a", i64::MAX), OrderLine::new("a", i64::MAX)],
        );
        match request.normalized(i64::MAX) {
            Err(CommerceError::Validation(errors)) => assert!(errors.has("items[1].quantity")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_from_cart() {
        let mut cart = Cart::new();
        cart.add_item("a", 2).unwrap();
        cart.add_item("b", 1).unwrap();
        let request = PlaceOrder::from_cart(customer(), &cart);
        assert_eq!(request.items.len(), 2);
        assert_eq!(request.items[0], OrderLine::new("a", 2));
    }

    #[test]
    fn test_build_items_totals() {
        let product = |id: &str, cents: i64| {
            Product::new(id, id, id, CategoryId::new("c"), Money::new(cents, Currency::RUB))
                .with_id(id)
        };
        let order_id = OrderId::new("o-1");
        let (items, total) = build_items(
            &order_id,
            &[(product("a", 5000), 2), (product("b", 3000), 1)],
            Currency::RUB,
        )
        .unwrap();
        assert_eq!(total.amount_cents, 13000);
        assert_eq!(items[0].total.amount_cents, 10000);
        assert_eq!(items[1].order_id, order_id);
        assert_eq!(items[1].sku, "b");
    }

    #[test]
    fn test_build_items_currency_mismatch() {
        let product = Product::new("a", "a", "a", CategoryId::new("c"), Money::new(100, Currency::USD));
        let result = build_items(&OrderId::new("o-1"), &[(product, 1)], Currency::RUB);
        assert!(matches!(result, Err(CommerceError::CurrencyMismatch { .. })));
    }

    #[test]
    fn test_list_query_status_param() {
        let query = OrderListQuery::new().with_status_param("all").unwrap();
        assert_eq!(query.status, None);
        let query = OrderListQuery::new().with_status_param("shipped").unwrap();
        assert_eq!(query.status, Some(OrderStatus::Shipped));
        assert!(OrderListQuery::new().with_status_param("lost").is_err());
    }
}
