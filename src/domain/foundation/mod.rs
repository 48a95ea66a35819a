//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that form the
//! vocabulary of the Dukani domain.

mod errors;
mod ids;
mod money;
mod phone;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{CartId, CartItemId, CheckoutId, OrderId, OrderItemId, ProductId, UserId};
pub use money::Money;
pub use phone::PhoneNumber;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
