//! Axum router configuration for cart endpoints.

use axum::routing::{get, patch, post};
use axum::Router;

use super::handlers::{
    add_to_cart, get_active_cart, remove_cart_item, update_cart_item, CartAppState,
};

/// Create the cart API router.
///
/// # Routes
///
/// - `GET    /` - the caller's active cart (created lazily)
/// - `POST   /items` - add a product
/// - `PATCH  /items/:item_id` - change quantity
/// - `DELETE /items/:item_id` - remove a line
pub fn cart_routes() -> Router<CartAppState> {
    Router::new()
        .route("/", get(get_active_cart))
        .route("/items", post(add_to_cart))
        .route(
            "/items/:item_id",
            patch(update_cart_item).delete(remove_cart_item),
        )
}
