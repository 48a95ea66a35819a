//! Axum router configuration for checkout and payment endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{checkout_history, initiate_checkout, mpesa_callback, CheckoutAppState};

/// Create the checkout API router.
///
/// # Routes
///
/// - `POST /` - initiate an STK push for a cart
/// - `GET  /history/:cart_id` - attempts for a cart, newest first
pub fn checkout_routes() -> Router<CheckoutAppState> {
    Router::new()
        .route("/", post(initiate_checkout))
        .route("/history/:cart_id", get(checkout_history))
}

/// Create the payment callback router.
///
/// Separate from the checkout routes because the callback carries no user
/// identity; it is the gateway calling us back.
///
/// # Routes
///
/// - `POST /mpesa/callback` - Daraja STK result delivery
pub fn payment_routes() -> Router<CheckoutAppState> {
    Router::new().route("/mpesa/callback", post(mpesa_callback))
}
