//! Cart-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | NotFound | 404 |
//! | ProductNotFound | 404 |
//! | ProductUnavailable | 400 |
//! | InsufficientStock | 400 |
//! | ValidationFailed | 400 |
//! | Settled | 409 |
//! | Infrastructure | 500 |

use thiserror::Error;

use crate::domain::foundation::{CartId, DomainError, ProductId, ValidationError};

/// Errors raised by cart operations.
#[derive(Debug, Clone, Error)]
pub enum CartError {
    #[error("Cart {0} not found")]
    NotFound(CartId),

    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    #[error("Product {0} has no valid price")]
    ProductUnavailable(ProductId),

    #[error("Product {product_id} has only {available} in stock, {requested} requested")]
    InsufficientStock {
        product_id: ProductId,
        available: u64,
        requested: u32,
    },

    #[error("{0}")]
    ValidationFailed(#[from] ValidationError),

    #[error("Cart {0} is settled and can no longer change")]
    Settled(CartId),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl From<DomainError> for CartError {
    fn from(err: DomainError) -> Self {
        CartError::Infrastructure(err.to_string())
    }
}
