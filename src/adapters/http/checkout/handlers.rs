//! Axum handlers for checkout endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;
use tracing::error;

use crate::application::handlers::checkout::{
    GetCheckoutHistoryHandler, GetCheckoutHistoryQuery, InitiateCheckoutCommand,
    InitiateCheckoutHandler, ProcessGatewayCallbackCommand, ProcessGatewayCallbackHandler,
};
use crate::domain::checkout::CheckoutError;
use crate::domain::foundation::CartId;

use super::dto::{
    AttemptResponse, CallbackAck, CheckoutHistoryResponse, InitiateCheckoutRequest,
};
use crate::adapters::http::{Caller, ErrorResponse};

/// Shared state for checkout and payment routes.
#[derive(Clone)]
pub struct CheckoutAppState {
    pub initiate: Arc<InitiateCheckoutHandler>,
    pub history: Arc<GetCheckoutHistoryHandler>,
    pub callback: Arc<ProcessGatewayCallbackHandler>,
}

/// `POST /` - initiate an STK push for a cart.
pub async fn initiate_checkout(
    State(state): State<CheckoutAppState>,
    caller: Caller,
    Json(request): Json<InitiateCheckoutRequest>,
) -> Result<impl IntoResponse, CheckoutApiError> {
    let attempt = state
        .initiate
        .handle(InitiateCheckoutCommand {
            cart_id: request.cart_id,
            owner: caller.user_id,
            phone: request.phone,
        })
        .await?;
    Ok(Json(AttemptResponse::from(attempt)))
}

/// `GET /history/:cart_id` - all attempts for a cart, newest first.
pub async fn checkout_history(
    State(state): State<CheckoutAppState>,
    caller: Caller,
    Path(cart_id): Path<CartId>,
) -> Result<impl IntoResponse, CheckoutApiError> {
    let view = state
        .history
        .handle(GetCheckoutHistoryQuery {
            cart_id,
            owner: caller.user_id,
        })
        .await?;
    Ok(Json(CheckoutHistoryResponse::from(view)))
}

/// `POST /mpesa/callback` - the gateway's asynchronous result delivery.
///
/// No authentication: the gateway does not sign STK callbacks, and the
/// correlation id lookup plus the settlement compare-and-swap make forged
/// or replayed payloads harmless.
///
/// Once the body parses as an STK callback, the gateway ALWAYS receives
/// the accepted acknowledgment: a non-2xx answer here would trigger
/// gateway-side retries that cannot fix an internal failure. Internal
/// errors go to the log and to alerting, not onto the wire.
pub async fn mpesa_callback(
    State(state): State<CheckoutAppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, CheckoutApiError> {
    match state
        .callback
        .handle(ProcessGatewayCallbackCommand { payload })
        .await
    {
        Ok(_) => {}
        // Unparseable body: the one case the gateway is told to go away.
        Err(err @ CheckoutError::ValidationFailed(_)) => return Err(err.into()),
        Err(err) => {
            error!(error = %err, "callback processing failed internally; acknowledging anyway");
        }
    }
    Ok(Json(CallbackAck::accepted()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error wrapper mapping checkout errors to HTTP responses.
pub struct CheckoutApiError(CheckoutError);

impl From<CheckoutError> for CheckoutApiError {
    fn from(err: CheckoutError) -> Self {
        Self(err)
    }
}

impl IntoResponse for CheckoutApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self.0 {
            CheckoutError::CartNotFound(_) => (StatusCode::NOT_FOUND, "CART_NOT_FOUND"),
            CheckoutError::InvalidCart(_) => (StatusCode::BAD_REQUEST, "INVALID_CART"),
            CheckoutError::AlreadyPaid(_) => (StatusCode::CONFLICT, "ALREADY_PAID"),
            CheckoutError::EmptyCart(_) => (StatusCode::BAD_REQUEST, "EMPTY_CART"),
            CheckoutError::GatewayUnavailable { .. } => {
                (StatusCode::BAD_GATEWAY, "GATEWAY_UNAVAILABLE")
            }
            CheckoutError::ValidationFailed(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            CheckoutError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };
        let body = ErrorResponse::new(code, self.0.to_string());
        (status, Json(body)).into_response()
    }
}
