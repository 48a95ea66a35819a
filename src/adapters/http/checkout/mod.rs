//! Checkout and payment-callback HTTP endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    AttemptResponse, CallbackAck, CheckoutHistoryResponse, InitiateCheckoutRequest,
};
pub use handlers::CheckoutAppState;
pub use routes::{checkout_routes, payment_routes};
