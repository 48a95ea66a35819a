//! Axum router configuration for order endpoints.

use axum::routing::{get, patch, post};
use axum::Router;

use super::handlers::{
    cancel_order, get_order, list_orders, list_vendor_items, update_item_status, OrdersAppState,
};

/// Create the orders API router.
///
/// # Routes
///
/// ## Customer Endpoints
/// - `GET  /` - order history with summary
/// - `GET  /:order_id` - order detail
/// - `POST /:order_id/cancel` - cancel (pre-shipment only)
///
/// ## Vendor Endpoints (require vendor role)
/// - `GET   /vendor/items` - fulfilment queue with summary
/// - `PATCH /vendor/items/:item_id` - update item status
pub fn orders_routes() -> Router<OrdersAppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/vendor/items", get(list_vendor_items))
        .route("/vendor/items/:item_id", patch(update_item_status))
        .route("/:order_id", get(get_order))
        .route("/:order_id/cancel", post(cancel_order))
}
