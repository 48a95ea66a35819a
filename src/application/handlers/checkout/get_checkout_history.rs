//! GetCheckoutHistoryHandler - query for a cart's attempt history.

use std::sync::Arc;

use crate::domain::checkout::{AttemptStatus, CheckoutAttempt, CheckoutError};
use crate::domain::foundation::{CartId, UserId};
use crate::ports::{CartRepository, CheckoutAttemptRepository};

/// Query for a cart's attempts.
#[derive(Debug, Clone)]
pub struct GetCheckoutHistoryQuery {
    pub cart_id: CartId,
    pub owner: UserId,
}

/// A cart's attempt history with per-status counts.
#[derive(Debug, Clone)]
pub struct CheckoutHistoryView {
    pub cart_id: CartId,
    /// Newest first.
    pub attempts: Vec<CheckoutAttempt>,
    pub total_attempts: usize,
    pub successful: usize,
    pub failed: usize,
    pub pending: usize,
}

/// Handler for the checkout history query.
pub struct GetCheckoutHistoryHandler {
    carts: Arc<dyn CartRepository>,
    attempts: Arc<dyn CheckoutAttemptRepository>,
}

impl GetCheckoutHistoryHandler {
    pub fn new(
        carts: Arc<dyn CartRepository>,
        attempts: Arc<dyn CheckoutAttemptRepository>,
    ) -> Self {
        Self { carts, attempts }
    }

    /// Returns history for the owner's cart.
    ///
    /// A cart that does not exist and a cart that belongs to someone else
    /// are indistinguishable to the caller.
    pub async fn handle(
        &self,
        query: GetCheckoutHistoryQuery,
    ) -> Result<CheckoutHistoryView, CheckoutError> {
        let cart = self
            .carts
            .find_by_id(&query.cart_id)
            .await?
            .filter(|c| c.owner == query.owner)
            .ok_or(CheckoutError::CartNotFound(query.cart_id))?;

        let attempts = self.attempts.list_for_cart(&cart.id).await?;
        let count = |status: AttemptStatus| attempts.iter().filter(|a| a.status == status).count();

        Ok(CheckoutHistoryView {
            cart_id: cart.id,
            total_attempts: attempts.len(),
            successful: count(AttemptStatus::Success),
            failed: count(AttemptStatus::Failed),
            pending: count(AttemptStatus::Pending),
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBackend;
    use crate::domain::cart::Cart;
    use crate::domain::foundation::{Money, PhoneNumber};
    use crate::ports::NewAttempt;
    use rust_decimal_macros::dec;

    fn owner() -> UserId {
        UserId::new("customer-1").unwrap()
    }

    async fn seed(backend: &Arc<InMemoryBackend>) -> CartId {
        let cart = Cart::new(owner());
        let cart_id = cart.id;
        crate::ports::CartRepository::create(backend.as_ref(), &cart)
            .await
            .unwrap();
        for _ in 0..2 {
            backend
                .record_new_attempt(NewAttempt {
                    cart_id,
                    phone: PhoneNumber::new("254700000000").unwrap(),
                    amount: Money::new(dec!(25.00)),
                })
                .await
                .unwrap();
        }
        cart_id
    }

    #[tokio::test]
    async fn returns_newest_first_with_counts() {
        let backend = Arc::new(InMemoryBackend::new());
        let cart_id = seed(&backend).await;
        let attempts = backend.list_for_cart(&cart_id).await.unwrap();
        backend.mark_failed(&attempts[1].id, "cancelled").await.unwrap();

        let handler = GetCheckoutHistoryHandler::new(backend.clone(), backend.clone());
        let view = handler
            .handle(GetCheckoutHistoryQuery {
                cart_id,
                owner: owner(),
            })
            .await
            .unwrap();

        assert_eq!(view.total_attempts, 2);
        assert_eq!(view.pending, 1);
        assert_eq!(view.failed, 1);
        assert_eq!(view.successful, 0);
        assert_eq!(view.attempts[0].attempt_number, 2);
    }

    #[tokio::test]
    async fn foreign_cart_reads_as_not_found() {
        let backend = Arc::new(InMemoryBackend::new());
        let cart_id = seed(&backend).await;

        let handler = GetCheckoutHistoryHandler::new(backend.clone(), backend);
        let result = handler
            .handle(GetCheckoutHistoryQuery {
                cart_id,
                owner: UserId::new("customer-2").unwrap(),
            })
            .await;
        assert!(matches!(result, Err(CheckoutError::CartNotFound(_))));
    }
}
