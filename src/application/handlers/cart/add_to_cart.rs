//! AddToCartHandler - command handler for adding items to the active cart.

use std::sync::Arc;

use crate::domain::cart::CartError;
use crate::domain::foundation::{CartId, CartItemId, ProductId, UserId};
use crate::ports::{CartRepository, ProductCatalog};

use super::load_or_create_active;

/// Command to add a product to the caller's active cart.
#[derive(Debug, Clone)]
pub struct AddToCartCommand {
    pub owner: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Result of adding to the cart.
#[derive(Debug, Clone)]
pub struct AddToCartResult {
    pub cart_id: CartId,
    pub item_id: CartItemId,
    /// Line quantity after merging.
    pub quantity: u32,
}

/// Handler for add-to-cart.
pub struct AddToCartHandler {
    carts: Arc<dyn CartRepository>,
    catalog: Arc<dyn ProductCatalog>,
}

impl AddToCartHandler {
    pub fn new(carts: Arc<dyn CartRepository>, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { carts, catalog }
    }

    /// Adds the product, creating the active cart lazily.
    ///
    /// # Errors
    ///
    /// - `ProductNotFound` - the catalog has no such product.
    /// - `ProductUnavailable` - the product has no positive price.
    /// - `InsufficientStock` - stock does not cover the merged quantity.
    /// - `ValidationFailed` - zero quantity.
    pub async fn handle(&self, cmd: AddToCartCommand) -> Result<AddToCartResult, CartError> {
        let snapshot = self
            .catalog
            .snapshot(&cmd.product_id)
            .await?
            .ok_or(CartError::ProductNotFound(cmd.product_id))?;

        if !snapshot.unit_price.is_positive() {
            return Err(CartError::ProductUnavailable(cmd.product_id));
        }

        let mut cart = load_or_create_active(&self.carts, &cmd.owner).await?;

        let merged_quantity = cart
            .items
            .iter()
            .find(|i| i.product_id == cmd.product_id)
            .map(|i| i.quantity)
            .unwrap_or(0)
            + cmd.quantity;
        if !snapshot.covers(merged_quantity) {
            return Err(CartError::InsufficientStock {
                product_id: cmd.product_id,
                available: snapshot.stock,
                requested: merged_quantity,
            });
        }

        let item_id = cart.add_item(cmd.product_id, cmd.quantity)?;
        self.carts.update(&cart).await?;

        Ok(AddToCartResult {
            cart_id: cart.id,
            item_id,
            quantity: merged_quantity,
        })
    }
}
