//! Cart line mutation handlers: quantity update and removal.
//!
//! Both operate on the owner's active cart only; settled carts are frozen.

use std::sync::Arc;

use crate::domain::cart::{Cart, CartError};
use crate::domain::foundation::{CartItemId, UserId};
use crate::ports::{CartRepository, ProductCatalog};

/// Command to set a line's quantity.
#[derive(Debug, Clone)]
pub struct UpdateCartItemCommand {
    pub owner: UserId,
    pub item_id: CartItemId,
    pub quantity: u32,
}

/// Handler for quantity updates.
pub struct UpdateCartItemHandler {
    carts: Arc<dyn CartRepository>,
    catalog: Arc<dyn ProductCatalog>,
}

impl UpdateCartItemHandler {
    pub fn new(carts: Arc<dyn CartRepository>, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { carts, catalog }
    }

    pub async fn handle(&self, cmd: UpdateCartItemCommand) -> Result<Cart, CartError> {
        let mut cart = active_cart_of(&self.carts, &cmd.owner).await?;

        let product_id = cart
            .items
            .iter()
            .find(|i| i.id == cmd.item_id)
            .map(|i| i.product_id)
            .ok_or_else(|| {
                CartError::ValidationFailed(
                    crate::domain::foundation::ValidationError::invalid_format(
                        "item_id",
                        "no such item in active cart",
                    ),
                )
            })?;

        if let Some(snapshot) = self.catalog.snapshot(&product_id).await? {
            if !snapshot.covers(cmd.quantity) {
                return Err(CartError::InsufficientStock {
                    product_id,
                    available: snapshot.stock,
                    requested: cmd.quantity,
                });
            }
        }

        cart.update_quantity(cmd.item_id, cmd.quantity)?;
        self.carts.update(&cart).await?;
        Ok(cart)
    }
}

/// Command to remove a line.
#[derive(Debug, Clone)]
pub struct RemoveCartItemCommand {
    pub owner: UserId,
    pub item_id: CartItemId,
}

/// Handler for line removal.
pub struct RemoveCartItemHandler {
    carts: Arc<dyn CartRepository>,
}

impl RemoveCartItemHandler {
    pub fn new(carts: Arc<dyn CartRepository>) -> Self {
        Self { carts }
    }

    pub async fn handle(&self, cmd: RemoveCartItemCommand) -> Result<Cart, CartError> {
        let mut cart = active_cart_of(&self.carts, &cmd.owner).await?;
        cart.remove_item(cmd.item_id)?;
        self.carts.update(&cart).await?;
        Ok(cart)
    }
}

async fn active_cart_of(
    carts: &Arc<dyn CartRepository>,
    owner: &UserId,
) -> Result<Cart, CartError> {
    carts
        .find_active_by_owner(owner)
        .await?
        .ok_or_else(|| {
            CartError::ValidationFailed(
                crate::domain::foundation::ValidationError::invalid_format(
                    "cart",
                    "no active cart for this user",
                ),
            )
        })
}
