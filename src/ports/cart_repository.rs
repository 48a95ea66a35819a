//! CartRepository port - cart persistence.

use async_trait::async_trait;

use crate::domain::cart::Cart;
use crate::domain::foundation::{CartId, DomainError, UserId};

/// Port for storing and retrieving carts.
///
/// Implementations must enforce the one-active-cart-per-owner invariant at
/// the storage layer (a partial unique index in PostgreSQL), because
/// concurrent requests from the same user can race past application-level
/// checks. A violated constraint surfaces as `ErrorCode::ActiveCartExists`.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Loads a cart with its items.
    async fn find_by_id(&self, id: &CartId) -> Result<Option<Cart>, DomainError>;

    /// Loads the owner's single active cart, if one exists.
    async fn find_active_by_owner(&self, owner: &UserId) -> Result<Option<Cart>, DomainError>;

    /// Persists a new cart.
    async fn create(&self, cart: &Cart) -> Result<(), DomainError>;

    /// Persists item and state changes of an existing cart.
    async fn update(&self, cart: &Cart) -> Result<(), DomainError>;
}
