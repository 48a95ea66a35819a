//! Axum handlers for cart endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::application::handlers::cart::{
    AddToCartCommand, AddToCartHandler, GetActiveCartHandler, RemoveCartItemCommand,
    RemoveCartItemHandler, UpdateCartItemCommand, UpdateCartItemHandler,
};
use crate::domain::cart::CartError;
use crate::domain::foundation::CartItemId;

use super::dto::{AddToCartRequest, CartResponse, UpdateCartItemRequest};
use crate::adapters::http::{Caller, ErrorResponse};

/// Shared state for cart routes.
#[derive(Clone)]
pub struct CartAppState {
    pub get_cart: Arc<GetActiveCartHandler>,
    pub add: Arc<AddToCartHandler>,
    pub update: Arc<UpdateCartItemHandler>,
    pub remove: Arc<RemoveCartItemHandler>,
}

/// `GET /` - the caller's active cart, created lazily.
pub async fn get_active_cart(
    State(state): State<CartAppState>,
    caller: Caller,
) -> Result<impl IntoResponse, CartApiError> {
    let view = state.get_cart.handle(&caller.user_id).await?;
    Ok(Json(CartResponse::from(view)))
}

/// `POST /items` - add a product to the active cart.
pub async fn add_to_cart(
    State(state): State<CartAppState>,
    caller: Caller,
    Json(request): Json<AddToCartRequest>,
) -> Result<impl IntoResponse, CartApiError> {
    state
        .add
        .handle(AddToCartCommand {
            owner: caller.user_id.clone(),
            product_id: request.product_id,
            quantity: request.quantity,
        })
        .await?;

    let view = state.get_cart.handle(&caller.user_id).await?;
    Ok((StatusCode::CREATED, Json(CartResponse::from(view))))
}

/// `PATCH /items/:item_id` - change a line's quantity.
pub async fn update_cart_item(
    State(state): State<CartAppState>,
    caller: Caller,
    Path(item_id): Path<CartItemId>,
    Json(request): Json<UpdateCartItemRequest>,
) -> Result<impl IntoResponse, CartApiError> {
    state
        .update
        .handle(UpdateCartItemCommand {
            owner: caller.user_id.clone(),
            item_id,
            quantity: request.quantity,
        })
        .await?;

    let view = state.get_cart.handle(&caller.user_id).await?;
    Ok(Json(CartResponse::from(view)))
}

/// `DELETE /items/:item_id` - remove a line.
pub async fn remove_cart_item(
    State(state): State<CartAppState>,
    caller: Caller,
    Path(item_id): Path<CartItemId>,
) -> Result<impl IntoResponse, CartApiError> {
    state
        .remove
        .handle(RemoveCartItemCommand {
            owner: caller.user_id.clone(),
            item_id,
        })
        .await?;

    let view = state.get_cart.handle(&caller.user_id).await?;
    Ok(Json(CartResponse::from(view)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error wrapper mapping cart errors to HTTP responses.
pub struct CartApiError(CartError);

impl From<CartError> for CartApiError {
    fn from(err: CartError) -> Self {
        Self(err)
    }
}

impl IntoResponse for CartApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self.0 {
            CartError::NotFound(_) => (StatusCode::NOT_FOUND, "CART_NOT_FOUND"),
            CartError::ProductNotFound(_) => (StatusCode::NOT_FOUND, "PRODUCT_NOT_FOUND"),
            CartError::ProductUnavailable(_) => (StatusCode::BAD_REQUEST, "PRODUCT_UNAVAILABLE"),
            CartError::InsufficientStock { .. } => (StatusCode::BAD_REQUEST, "INSUFFICIENT_STOCK"),
            CartError::ValidationFailed(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            CartError::Settled(_) => (StatusCode::CONFLICT, "CART_SETTLED"),
            CartError::Infrastructure(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        let body = ErrorResponse::new(code, self.0.to_string());
        (status, Json(body)).into_response()
    }
}
