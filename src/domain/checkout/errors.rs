//! Checkout-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | InvalidCart | 400 |
//! | AlreadyPaid | 409 |
//! | EmptyCart | 400 |
//! | GatewayUnavailable | 502 |
//! | CartNotFound | 404 |
//! | ValidationFailed | 400 |
//! | Infrastructure | 500 |
//!
//! The callback path never maps errors to HTTP at all: the gateway always
//! receives an acknowledgment, and failures surface only in logs.

use thiserror::Error;

use crate::domain::foundation::{CartId, DomainError, ValidationError};
use crate::ports::GatewayError;

/// Errors raised by checkout initiation and reconciliation.
#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("Cart {0} not found")]
    CartNotFound(CartId),

    #[error("Cart {0} is not eligible for checkout")]
    InvalidCart(CartId),

    #[error("Cart {0} has already been successfully paid for")]
    AlreadyPaid(CartId),

    #[error("Cart {0} is empty or totals zero")]
    EmptyCart(CartId),

    #[error("Payment gateway unavailable: {reason}")]
    GatewayUnavailable { reason: String },

    #[error("{0}")]
    ValidationFailed(#[from] ValidationError),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl CheckoutError {
    pub fn gateway_unavailable(reason: impl Into<String>) -> Self {
        CheckoutError::GatewayUnavailable {
            reason: reason.into(),
        }
    }
}

impl From<DomainError> for CheckoutError {
    fn from(err: DomainError) -> Self {
        CheckoutError::Infrastructure(err.to_string())
    }
}

impl From<GatewayError> for CheckoutError {
    fn from(err: GatewayError) -> Self {
        CheckoutError::GatewayUnavailable {
            reason: err.to_string(),
        }
    }
}
