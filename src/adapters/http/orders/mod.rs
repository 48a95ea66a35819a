//! Order HTTP endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    CancelOrderRequest, OrderItemResponse, OrderResponse, UpdateItemStatusRequest,
};
pub use handlers::OrdersAppState;
pub use routes::orders_routes;
