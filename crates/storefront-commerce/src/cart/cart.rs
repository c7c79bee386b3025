//! Client-held shopping cart.

use crate::error::CommerceError;
use crate::ids::ProductId;
use serde::{Deserialize, Serialize};

/// Maximum quantity allowed per line.
pub const MAX_QUANTITY_PER_ITEM: i64 = 9999;

/// A shopping cart.
///
/// The cart only records what the customer intends to buy. Prices and
/// stock are re-read from the catalog when the order is placed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cart {
    /// Lines in the order they were first added.
    pub items: Vec<CartLine>,
}

/// One product and the quantity wanted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item to the cart, merging with an existing line.
    ///
    /// Returns an error if:
    /// - Quantity is not positive
    /// - Adding would exceed MAX_QUANTITY_PER_ITEM
    pub fn add_item(
        &mut self,
        product_id: impl Into<ProductId>,
        quantity: i64,
    ) -> Result<(), CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::invalid(
                "quantity",
                format!("Quantity must be positive, got {}", quantity),
            ));
        }

        let product_id = product_id.into();
        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            let new_quantity = existing
                .quantity
                .checked_add(quantity)
                .ok_or(CommerceError::Overflow)?;
            check_limit(new_quantity)?;
            existing.quantity = new_quantity;
            return Ok(());
        }

        check_limit(quantity)?;
        self.items.push(CartLine {
            product_id,
            quantity,
        });
        Ok(())
    }

    /// Set a line's quantity. Zero or less removes the line.
    ///
    /// Returns whether the cart changed.
    pub fn set_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<bool, CommerceError> {
        if quantity <= 0 {
            return Ok(self.remove_item(product_id));
        }
        check_limit(quantity)?;

        match self.items.iter_mut().find(|i| &i.product_id == product_id) {
            Some(item) => {
                item.quantity = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove an item from the cart.
    pub fn remove_item(&mut self, product_id: &ProductId) -> bool {
        let len_before = self.items.len();
        self.items.retain(|i| &i.product_id != product_id);
        self.items.len() < len_before
    }

    /// Clear all items from the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Get total item count (sum of quantities).
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Check if cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Quantity of one product, 0 if absent.
    pub fn quantity_of(&self, product_id: &ProductId) -> i64 {
        self.items
            .iter()
            .find(|i| &i.product_id == product_id)
            .map(|i| i.quantity)
            .unwrap_or(0)
    }
}

fn check_limit(quantity: i64) -> Result<(), CommerceError> {
    if quantity > MAX_QUANTITY_PER_ITEM {
        return Err(CommerceError::invalid(
            "quantity",
            format!(
                "Quantity {} exceeds maximum allowed ({})",
                quantity, MAX_QUANTITY_PER_ITEM
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_item() {
        let mut cart = Cart::new();
        cart.add_item("prod-1", 2).unwrap();
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.items.len(), 1);
    }

    #[test]
    fn test_add_same_item_increases_quantity() {
        let mut cart = Cart::new();
        cart.add_item("prod-1", 1).unwrap();
        cart.add_item("prod-2", 1).unwrap();
        cart.add_item("prod-1", 2).unwrap();

        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.items[0].product_id.as_str(), "prod-1");
        assert_eq!(cart.quantity_of(&ProductId::new("prod-1")), 3);
    }

    #[test]
    fn test_set_quantity() {
        let mut cart = Cart::new();
        cart.add_item("prod-1", 1).unwrap();
        assert!(cart.set_quantity(&ProductId::new("prod-1"), 5).unwrap());
        assert_eq!(cart.item_count(), 5);
        assert!(!cart.set_quantity(&ProductId::new("missing"), 5).unwrap());
    }

    #[test]
    fn test_set_zero_removes() {
        let mut cart = Cart::new();
        cart.add_item("prod-1", 1).unwrap();
        assert!(cart.set_quantity(&ProductId::new("prod-1"), 0).unwrap());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quantity_limit() {
        let mut cart = Cart::new();
        assert!(cart.add_item("prod-1", MAX_QUANTITY_PER_ITEM + 1).is_err());
        cart.add_item("prod-1", MAX_QUANTITY_PER_ITEM).unwrap();
        assert!(cart.add_item("prod-1", 1).is_err());
        assert_eq!(cart.item_count(), MAX_QUANTITY_PER_ITEM);
    }

    #[test]
    fn test_invalid_quantity() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.add_item("prod-1", 0),
            Err(CommerceError::Validation(_))
        ));
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_item("prod-1", 1).unwrap();
        cart.clear();
        assert!(cart.is_empty());
    }
}
