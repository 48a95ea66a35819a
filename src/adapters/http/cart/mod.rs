//! Cart HTTP endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{AddToCartRequest, CartItemResponse, CartResponse, UpdateCartItemRequest};
pub use handlers::CartAppState;
pub use routes::cart_routes;
