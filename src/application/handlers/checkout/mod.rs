//! Checkout handlers: initiation, callback processing, history.

mod get_checkout_history;
mod initiate_checkout;
mod process_gateway_callback;

pub use get_checkout_history::{
    CheckoutHistoryView, GetCheckoutHistoryHandler, GetCheckoutHistoryQuery,
};
pub use initiate_checkout::{InitiateCheckoutCommand, InitiateCheckoutHandler};
pub use process_gateway_callback::{ProcessGatewayCallbackCommand, ProcessGatewayCallbackHandler};
