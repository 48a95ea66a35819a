//! Cart handlers: view, add, update, remove.

mod add_to_cart;
mod get_active_cart;
mod update_cart_item;

pub use add_to_cart::{AddToCartCommand, AddToCartHandler, AddToCartResult};
pub use get_active_cart::{GetActiveCartHandler, PricedCart, PricedLine};
pub use update_cart_item::{
    RemoveCartItemCommand, RemoveCartItemHandler, UpdateCartItemCommand, UpdateCartItemHandler,
};

use std::sync::Arc;

use crate::domain::cart::{Cart, CartError};
use crate::domain::foundation::{ErrorCode, UserId};
use crate::ports::CartRepository;

/// Loads the owner's active cart, creating one lazily on first use.
///
/// A concurrent request may win the creation race; the storage constraint
/// turns the loser's insert into `ActiveCartExists`, after which the
/// winner's cart is simply re-read.
pub(crate) async fn load_or_create_active(
    carts: &Arc<dyn CartRepository>,
    owner: &UserId,
) -> Result<Cart, CartError> {
    if let Some(cart) = carts.find_active_by_owner(owner).await? {
        return Ok(cart);
    }

    let cart = Cart::new(owner.clone());
    match carts.create(&cart).await {
        Ok(()) => Ok(cart),
        Err(err) if err.code == ErrorCode::ActiveCartExists => carts
            .find_active_by_owner(owner)
            .await?
            .ok_or_else(|| CartError::Infrastructure("active cart vanished mid-race".to_string())),
        Err(err) => Err(err.into()),
    }
}
