//! Cart aggregate entity.
//!
//! # Design Decisions
//!
//! - **One active cart per owner**: enforced by a partial unique index at
//!   the storage layer, because concurrent add-to-cart requests from the
//!   same user's sessions can race past application checks.
//! - **Explicit settlement state**: a single `CartState` enum replaces the
//!   `is_ordered`/`is_paid` flag pair the API exposes, so there is no window
//!   where one flag is set and the other is not. The wire flags are both
//!   derived from the one state.
//! - **No prices inside the aggregate**: items reference products by id and
//!   are priced through the catalog contract at read time. Orders freeze
//!   their own price copies at settlement.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CartId, CartItemId, ProductId, StateMachine, Timestamp, UserId, ValidationError,
};

/// Lifecycle state of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartState {
    /// Open for mutation and checkout initiation.
    Active,
    /// Frozen by a successful payment. Terminal.
    Settled,
}

impl StateMachine for CartState {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!((self, target), (CartState::Active, CartState::Settled))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            CartState::Active => vec![CartState::Settled],
            CartState::Settled => vec![],
        }
    }
}

/// A line item within a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Unique identifier for this line.
    pub id: CartItemId,

    /// The product being purchased.
    pub product_id: ProductId,

    /// Units of the product. Always at least 1.
    pub quantity: u32,

    /// When the line was first added.
    pub added_at: Timestamp,
}

/// Cart aggregate - the mutable staging area for a purchase.
///
/// # Invariants
///
/// - At most one `(cart, product)` line; adding an existing product merges
///   quantities.
/// - Every line has `quantity >= 1`.
/// - `Settled` is terminal; a settled cart rejects all mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    /// Unique identifier.
    pub id: CartId,

    /// The customer who owns this cart.
    pub owner: UserId,

    /// Lifecycle state.
    pub state: CartState,

    /// Line items, one per product.
    pub items: Vec<CartItem>,

    /// When the cart was created.
    pub created_at: Timestamp,

    /// When the cart was last modified.
    pub updated_at: Timestamp,
}

impl Cart {
    /// Creates a new empty active cart for `owner`.
    pub fn new(owner: UserId) -> Self {
        let now = Timestamp::now();
        Self {
            id: CartId::new(),
            owner,
            state: CartState::Active,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// True while the cart may be mutated or checked out.
    pub fn is_active(&self) -> bool {
        self.state == CartState::Active
    }

    /// True once payment has settled the cart into an order.
    pub fn is_settled(&self) -> bool {
        self.state == CartState::Settled
    }

    /// True if the cart holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    pub fn total_units(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Adds `quantity` units of a product, merging into an existing line.
    ///
    /// Returns the id of the affected line.
    pub fn add_item(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItemId, ValidationError> {
        self.ensure_active()?;
        if quantity == 0 {
            return Err(ValidationError::below_minimum("quantity", 1, 0));
        }

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity += quantity;
            let id = item.id;
            self.updated_at = Timestamp::now();
            return Ok(id);
        }

        let item = CartItem {
            id: CartItemId::new(),
            product_id,
            quantity,
            added_at: Timestamp::now(),
        };
        let id = item.id;
        self.items.push(item);
        self.updated_at = Timestamp::now();
        Ok(id)
    }

    /// Replaces the quantity of an existing line.
    pub fn update_quantity(
        &mut self,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<(), ValidationError> {
        self.ensure_active()?;
        if quantity == 0 {
            return Err(ValidationError::below_minimum("quantity", 1, 0));
        }
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| ValidationError::invalid_format("item_id", "no such item in cart"))?;
        item.quantity = quantity;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Removes a line from the cart.
    pub fn remove_item(&mut self, item_id: CartItemId) -> Result<(), ValidationError> {
        self.ensure_active()?;
        let before = self.items.len();
        self.items.retain(|i| i.id != item_id);
        if self.items.len() == before {
            return Err(ValidationError::invalid_format(
                "item_id",
                "no such item in cart",
            ));
        }
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Freezes the cart after successful payment. Valid exactly once.
    pub fn settle(&mut self) -> Result<(), ValidationError> {
        self.state = self.state.transition_to(CartState::Settled)?;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), ValidationError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(ValidationError::invalid_format(
                "cart",
                "cart is settled and can no longer change",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> UserId {
        UserId::new("customer-1").unwrap()
    }

    #[test]
    fn new_cart_is_active_and_empty() {
        let cart = Cart::new(owner());
        assert!(cart.is_active());
        assert!(cart.is_empty());
    }

    #[test]
    fn add_item_creates_line() {
        let mut cart = Cart::new(owner());
        let product = ProductId::new();
        cart.add_item(product, 2).unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 2);
    }

    #[test]
    fn add_item_merges_same_product() {
        let mut cart = Cart::new(owner());
        let product = ProductId::new();
        let first = cart.add_item(product, 2).unwrap();
        let second = cart.add_item(product, 1).unwrap();

        assert_eq!(first, second);
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
    }

    #[test]
    fn add_item_rejects_zero_quantity() {
        let mut cart = Cart::new(owner());
        assert!(cart.add_item(ProductId::new(), 0).is_err());
    }

    #[test]
    fn update_quantity_replaces_value() {
        let mut cart = Cart::new(owner());
        let item_id = cart.add_item(ProductId::new(), 2).unwrap();
        cart.update_quantity(item_id, 5).unwrap();
        assert_eq!(cart.items[0].quantity, 5);
    }

    #[test]
    fn remove_item_deletes_line() {
        let mut cart = Cart::new(owner());
        let item_id = cart.add_item(ProductId::new(), 1).unwrap();
        cart.remove_item(item_id).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn remove_unknown_item_fails() {
        let mut cart = Cart::new(owner());
        assert!(cart.remove_item(CartItemId::new()).is_err());
    }

    #[test]
    fn settle_freezes_the_cart() {
        let mut cart = Cart::new(owner());
        cart.add_item(ProductId::new(), 1).unwrap();
        cart.settle().unwrap();

        assert!(cart.is_settled());
        assert!(cart.add_item(ProductId::new(), 1).is_err());
        assert!(cart.settle().is_err());
    }

    #[test]
    fn total_units_sums_lines() {
        let mut cart = Cart::new(owner());
        cart.add_item(ProductId::new(), 2).unwrap();
        cart.add_item(ProductId::new(), 1).unwrap();
        assert_eq!(cart.total_units(), 3);
    }
}
