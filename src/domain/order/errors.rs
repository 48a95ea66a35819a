//! Order-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | NotFound | 404 |
//! | ItemNotFound | 404 |
//! | Forbidden | 403 |
//! | CannotCancel | 409 |
//! | InvalidStatus | 400 |
//! | ValidationFailed | 400 |
//! | InvariantViolation | 500 |
//! | Infrastructure | 500 |

use thiserror::Error;

use crate::domain::foundation::{DomainError, OrderId, OrderItemId, ValidationError};

use super::OrderStatus;

/// Errors raised by order operations.
#[derive(Debug, Clone, Error)]
pub enum OrderError {
    #[error("Order {0} not found")]
    NotFound(OrderId),

    #[error("Order item {0} not found")]
    ItemNotFound(OrderItemId),

    #[error("Not permitted to act on this order")]
    Forbidden,

    #[error("Order cannot be cancelled in status {status:?}")]
    CannotCancel { status: OrderStatus },

    #[error("Invalid status value: {0}")]
    InvalidStatus(String),

    #[error("{0}")]
    ValidationFailed(#[from] ValidationError),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl From<DomainError> for OrderError {
    fn from(err: DomainError) -> Self {
        OrderError::Infrastructure(err.to_string())
    }
}
