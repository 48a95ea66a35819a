//! Axum handlers for order endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::application::handlers::orders::{
    CancelOrderCommand, CancelOrderHandler, GetOrderHandler, GetOrderQuery,
    ListCustomerOrdersHandler, ListVendorItemsHandler, UpdateItemStatusCommand,
    UpdateItemStatusHandler,
};
use crate::domain::foundation::{OrderId, OrderItemId};
use crate::domain::order::OrderError;

use super::dto::{
    CancelOrderRequest, CustomerOrdersResponse, ItemStatusUpdateResponse, OrderResponse,
    OrdersQuery, UpdateItemStatusRequest, VendorItemsQuery, VendorItemsResponse,
};
use crate::adapters::http::{Caller, ErrorResponse};

/// Shared state for order routes.
#[derive(Clone)]
pub struct OrdersAppState {
    pub list: Arc<ListCustomerOrdersHandler>,
    pub get: Arc<GetOrderHandler>,
    pub cancel: Arc<CancelOrderHandler>,
    pub vendor_items: Arc<ListVendorItemsHandler>,
    pub update_item: Arc<UpdateItemStatusHandler>,
}

/// `GET /` - the caller's orders with summary statistics.
pub async fn list_orders(
    State(state): State<OrdersAppState>,
    caller: Caller,
    Query(query): Query<OrdersQuery>,
) -> Result<impl IntoResponse, OrdersApiError> {
    let view = state.list.handle(&caller.user_id, query.status).await?;
    Ok(Json(CustomerOrdersResponse::from(view)))
}

/// `GET /:order_id` - order detail, customer- or vendor-scoped.
pub async fn get_order(
    State(state): State<OrdersAppState>,
    caller: Caller,
    Path(order_id): Path<OrderId>,
) -> Result<impl IntoResponse, OrdersApiError> {
    let order = state
        .get
        .handle(GetOrderQuery {
            order_id,
            requester: caller.user_id,
            as_vendor: caller.is_vendor,
        })
        .await?;
    Ok(Json(OrderResponse::from(order)))
}

/// `POST /:order_id/cancel` - customer-initiated cancellation.
pub async fn cancel_order(
    State(state): State<OrdersAppState>,
    caller: Caller,
    Path(order_id): Path<OrderId>,
    Json(request): Json<CancelOrderRequest>,
) -> Result<impl IntoResponse, OrdersApiError> {
    let order = state
        .cancel
        .handle(CancelOrderCommand {
            order_id,
            customer: caller.user_id,
            reason: request.reason,
        })
        .await?;
    Ok(Json(OrderResponse::from(order)))
}

/// `GET /vendor/items` - the vendor's fulfilment queue.
pub async fn list_vendor_items(
    State(state): State<OrdersAppState>,
    caller: Caller,
    Query(query): Query<VendorItemsQuery>,
) -> Result<impl IntoResponse, OrdersApiError> {
    if !caller.is_vendor {
        return Err(OrderError::Forbidden.into());
    }
    let view = state
        .vendor_items
        .handle(&caller.user_id, query.status)
        .await?;
    Ok(Json(VendorItemsResponse::from(view)))
}

/// `PATCH /vendor/items/:item_id` - move an item through fulfilment.
pub async fn update_item_status(
    State(state): State<OrdersAppState>,
    caller: Caller,
    Path(item_id): Path<OrderItemId>,
    Json(request): Json<UpdateItemStatusRequest>,
) -> Result<impl IntoResponse, OrdersApiError> {
    if !caller.is_vendor {
        return Err(OrderError::Forbidden.into());
    }
    let result = state
        .update_item
        .handle(UpdateItemStatusCommand {
            item_id,
            vendor: caller.user_id,
            new_status: request.status,
        })
        .await?;
    Ok(Json(ItemStatusUpdateResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error wrapper mapping order errors to HTTP responses.
pub struct OrdersApiError(OrderError);

impl From<OrderError> for OrdersApiError {
    fn from(err: OrderError) -> Self {
        Self(err)
    }
}

impl IntoResponse for OrdersApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self.0 {
            OrderError::NotFound(_) => (StatusCode::NOT_FOUND, "ORDER_NOT_FOUND"),
            OrderError::ItemNotFound(_) => (StatusCode::NOT_FOUND, "ORDER_ITEM_NOT_FOUND"),
            OrderError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            OrderError::CannotCancel { .. } => (StatusCode::CONFLICT, "CANNOT_CANCEL"),
            OrderError::InvalidStatus(_) => (StatusCode::BAD_REQUEST, "INVALID_STATUS"),
            OrderError::ValidationFailed(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            OrderError::InvariantViolation(_) | OrderError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };
        let body = ErrorResponse::new(code, self.0.to_string());
        (status, Json(body)).into_response()
    }
}
