//! Single-lock in-memory implementation of the storage ports.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::cart::Cart;
use crate::domain::checkout::{AttemptStatus, CallbackRecord, CheckoutAttempt};
use crate::domain::foundation::{
    CartId, CheckoutId, DomainError, ErrorCode, OrderId, OrderItemId, UserId,
};
use crate::domain::order::Order;
use crate::ports::{
    CallbackRecordStore, CartRepository, CheckoutAttemptRepository, NewAttempt, OrderRepository,
    SettlementCommit, SettlementOutcome, SettlementStore, TransitionOutcome, VendorItem,
};

#[derive(Default)]
struct State {
    carts: HashMap<CartId, Cart>,
    attempts: HashMap<CheckoutId, CheckoutAttempt>,
    callbacks: Vec<CallbackRecord>,
    orders: HashMap<OrderId, Order>,
}

/// In-memory backend implementing all storage ports behind one lock.
#[derive(Default)]
pub struct InMemoryBackend {
    state: RwLock<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: loads a cart without going through the port.
    pub async fn find_cart(&self, id: &CartId) -> Option<Cart> {
        self.state.read().await.carts.get(id).cloned()
    }

    /// Test helper: loads an order without going through the port.
    pub async fn find_order(&self, id: &OrderId) -> Option<Order> {
        self.state.read().await.orders.get(id).cloned()
    }

    /// Test helper: number of orders in the store.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Test helper: number of callback audit records in the store.
    pub async fn callback_count(&self) -> usize {
        self.state.read().await.callbacks.len()
    }

    /// Test helper: overwrites an attempt's status, bypassing the state
    /// machine. Exists to simulate partial states that the real flow can
    /// no longer produce.
    pub async fn force_status(&self, id: &CheckoutId, status: AttemptStatus) {
        if let Some(attempt) = self.state.write().await.attempts.get_mut(id) {
            attempt.status = status;
        }
    }

    /// Test helper: seeds an order directly. Production orders are only
    /// ever born through the settlement commit.
    pub async fn insert_order(&self, order: Order) {
        self.state.write().await.orders.insert(order.id, order);
    }
}

#[async_trait]
impl CartRepository for InMemoryBackend {
    async fn find_by_id(&self, id: &CartId) -> Result<Option<Cart>, DomainError> {
        Ok(self.state.read().await.carts.get(id).cloned())
    }

    async fn find_active_by_owner(&self, owner: &UserId) -> Result<Option<Cart>, DomainError> {
        Ok(self
            .state
            .read()
            .await
            .carts
            .values()
            .find(|c| c.owner == *owner && c.is_active())
            .cloned())
    }

    async fn create(&self, cart: &Cart) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        if cart.is_active()
            && state
                .carts
                .values()
                .any(|c| c.owner == cart.owner && c.is_active())
        {
            return Err(DomainError::new(
                ErrorCode::ActiveCartExists,
                format!("owner {} already has an active cart", cart.owner),
            ));
        }
        state.carts.insert(cart.id, cart.clone());
        Ok(())
    }

    async fn update(&self, cart: &Cart) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        if !state.carts.contains_key(&cart.id) {
            return Err(DomainError::new(
                ErrorCode::CartNotFound,
                format!("cart {} not found", cart.id),
            ));
        }
        state.carts.insert(cart.id, cart.clone());
        Ok(())
    }
}

#[async_trait]
impl CheckoutAttemptRepository for InMemoryBackend {
    async fn record_new_attempt(&self, input: NewAttempt) -> Result<CheckoutAttempt, DomainError> {
        let mut state = self.state.write().await;

        let next_number = state
            .attempts
            .values()
            .filter(|a| a.cart_id == input.cart_id)
            .map(|a| a.attempt_number)
            .max()
            .unwrap_or(0)
            + 1;

        for attempt in state
            .attempts
            .values_mut()
            .filter(|a| a.cart_id == input.cart_id && a.is_active)
        {
            attempt.deactivate();
        }

        let mut attempt = CheckoutAttempt::new(input.cart_id, input.phone, input.amount);
        attempt.attempt_number = next_number;
        state.attempts.insert(attempt.id, attempt.clone());
        Ok(attempt)
    }

    async fn assign_correlation_id(
        &self,
        attempt_id: &CheckoutId,
        correlation_id: &str,
    ) -> Result<CheckoutAttempt, DomainError> {
        let mut state = self.state.write().await;

        if state
            .attempts
            .values()
            .any(|a| a.checkout_request_id.as_deref() == Some(correlation_id))
        {
            return Err(DomainError::new(
                ErrorCode::DuplicateCorrelationId,
                format!("correlation id {} already assigned", correlation_id),
            ));
        }

        let attempt = state.attempts.get_mut(attempt_id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::AttemptNotFound,
                format!("attempt {} not found", attempt_id),
            )
        })?;
        attempt.assign_correlation_id(correlation_id)?;
        Ok(attempt.clone())
    }

    async fn find_by_correlation_id(
        &self,
        correlation_id: &str,
    ) -> Result<Option<CheckoutAttempt>, DomainError> {
        Ok(self
            .state
            .read()
            .await
            .attempts
            .values()
            .find(|a| a.checkout_request_id.as_deref() == Some(correlation_id))
            .cloned())
    }

    async fn find_by_id(&self, id: &CheckoutId) -> Result<Option<CheckoutAttempt>, DomainError> {
        Ok(self.state.read().await.attempts.get(id).cloned())
    }

    async fn list_for_cart(&self, cart_id: &CartId) -> Result<Vec<CheckoutAttempt>, DomainError> {
        let state = self.state.read().await;
        let mut attempts: Vec<CheckoutAttempt> = state
            .attempts
            .values()
            .filter(|a| a.cart_id == *cart_id)
            .cloned()
            .collect();
        attempts.sort_by(|a, b| b.attempt_number.cmp(&a.attempt_number));
        Ok(attempts)
    }

    async fn has_successful(&self, cart_id: &CartId) -> Result<bool, DomainError> {
        Ok(self
            .state
            .read()
            .await
            .attempts
            .values()
            .any(|a| a.cart_id == *cart_id && a.status == AttemptStatus::Success))
    }

    async fn mark_failed(
        &self,
        attempt_id: &CheckoutId,
        error: &str,
    ) -> Result<TransitionOutcome, DomainError> {
        let mut state = self.state.write().await;
        let attempt = state.attempts.get_mut(attempt_id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::AttemptNotFound,
                format!("attempt {} not found", attempt_id),
            )
        })?;
        if attempt.is_terminal() {
            return Ok(TransitionOutcome::AlreadyTerminal);
        }
        attempt.mark_failed(error)?;
        Ok(TransitionOutcome::Applied)
    }

    async fn mark_succeeded(
        &self,
        attempt_id: &CheckoutId,
        receipt: Option<&str>,
    ) -> Result<TransitionOutcome, DomainError> {
        let mut state = self.state.write().await;
        let attempt = state.attempts.get_mut(attempt_id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::AttemptNotFound,
                format!("attempt {} not found", attempt_id),
            )
        })?;
        if attempt.is_terminal() {
            return Ok(TransitionOutcome::AlreadyTerminal);
        }
        attempt.mark_succeeded(receipt.map(str::to_string))?;
        Ok(TransitionOutcome::Applied)
    }
}

#[async_trait]
impl CallbackRecordStore for InMemoryBackend {
    async fn append(&self, record: CallbackRecord) -> Result<(), DomainError> {
        self.state.write().await.callbacks.push(record);
        Ok(())
    }

    async fn list_for_attempt(
        &self,
        attempt_id: &CheckoutId,
    ) -> Result<Vec<CallbackRecord>, DomainError> {
        Ok(self
            .state
            .read()
            .await
            .callbacks
            .iter()
            .filter(|r| r.attempt_id == *attempt_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OrderRepository for InMemoryBackend {
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        Ok(self.state.read().await.orders.get(id).cloned())
    }

    async fn find_by_correlation_id(
        &self,
        correlation_id: &str,
    ) -> Result<Option<Order>, DomainError> {
        Ok(self
            .state
            .read()
            .await
            .orders
            .values()
            .find(|o| o.checkout_request_id.as_deref() == Some(correlation_id))
            .cloned())
    }

    async fn list_for_customer(&self, customer: &UserId) -> Result<Vec<Order>, DomainError> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.customer == *customer)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn list_items_for_vendor(&self, vendor: &UserId) -> Result<Vec<VendorItem>, DomainError> {
        let state = self.state.read().await;
        let mut orders: Vec<&Order> = state.orders.values().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(orders
            .into_iter()
            .flat_map(|order| {
                order
                    .items
                    .iter()
                    .filter(|item| item.vendor.as_ref() == Some(vendor))
                    .map(|item| VendorItem {
                        order_id: order.id,
                        item: item.clone(),
                    })
            })
            .collect())
    }

    async fn find_containing_item(
        &self,
        item_id: &OrderItemId,
    ) -> Result<Option<Order>, DomainError> {
        Ok(self
            .state
            .read()
            .await
            .orders
            .values()
            .find(|o| o.items.iter().any(|i| i.id == *item_id))
            .cloned())
    }

    async fn update(&self, order: &Order) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        if !state.orders.contains_key(&order.id) {
            return Err(DomainError::new(
                ErrorCode::OrderNotFound,
                format!("order {} not found", order.id),
            ));
        }
        state.orders.insert(order.id, order.clone());
        Ok(())
    }
}

#[async_trait]
impl SettlementStore for InMemoryBackend {
    async fn commit(&self, commit: SettlementCommit) -> Result<SettlementOutcome, DomainError> {
        // One write lock spans the whole commit, which is this backend's
        // equivalent of a database transaction.
        let mut state = self.state.write().await;

        let attempt = state.attempts.get_mut(&commit.attempt_id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::AttemptNotFound,
                format!("attempt {} not found", commit.attempt_id),
            )
        })?;

        if attempt.is_terminal() {
            return Ok(SettlementOutcome::AlreadySettled);
        }
        attempt.mark_succeeded(commit.receipt.clone())?;

        state.orders.insert(commit.order.id, commit.order.clone());

        let cart = state.carts.get_mut(&commit.cart_id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::CartNotFound,
                format!("cart {} not found", commit.cart_id),
            )
        })?;
        cart.settle()?;

        Ok(SettlementOutcome::Committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Money, PhoneNumber};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn owner() -> UserId {
        UserId::new("customer-1").unwrap()
    }

    fn new_attempt(cart_id: CartId) -> NewAttempt {
        NewAttempt {
            cart_id,
            phone: PhoneNumber::new("254700000000").unwrap(),
            amount: Money::new(dec!(25.00)),
        }
    }

    #[tokio::test]
    async fn second_active_cart_for_owner_is_rejected() {
        let backend = InMemoryBackend::new();
        backend.create(&Cart::new(owner())).await.unwrap();

        let err = backend.create(&Cart::new(owner())).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ActiveCartExists);
    }

    #[tokio::test]
    async fn settled_cart_does_not_block_a_new_active_cart() {
        let backend = InMemoryBackend::new();
        let mut first = Cart::new(owner());
        first.settle().unwrap();
        backend.create(&first).await.unwrap();

        assert!(backend.create(&Cart::new(owner())).await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_correlation_id_is_rejected() {
        let backend = InMemoryBackend::new();
        let cart_id = CartId::new();
        let first = backend.record_new_attempt(new_attempt(cart_id)).await.unwrap();
        let second = backend.record_new_attempt(new_attempt(cart_id)).await.unwrap();

        backend
            .assign_correlation_id(&first.id, "ws_CO_1")
            .await
            .unwrap();
        let err = backend
            .assign_correlation_id(&second.id, "ws_CO_1")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateCorrelationId);
    }

    #[tokio::test]
    async fn mark_failed_is_a_compare_and_swap() {
        let backend = InMemoryBackend::new();
        let attempt = backend
            .record_new_attempt(new_attempt(CartId::new()))
            .await
            .unwrap();

        let first = backend.mark_failed(&attempt.id, "cancelled").await.unwrap();
        let second = backend.mark_failed(&attempt.id, "cancelled").await.unwrap();

        assert_eq!(first, TransitionOutcome::Applied);
        assert_eq!(second, TransitionOutcome::AlreadyTerminal);
    }

    proptest! {
        /// However many times checkout is re-initiated, attempt numbers
        /// stay gapless from 1 and exactly one attempt is active.
        #[test]
        fn attempt_sequence_invariants(retries in 1usize..8) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            rt.block_on(async {
                let backend = InMemoryBackend::new();
                let cart_id = CartId::new();
                for _ in 0..retries {
                    backend.record_new_attempt(new_attempt(cart_id)).await.unwrap();
                }

                let attempts = backend.list_for_cart(&cart_id).await.unwrap();
                prop_assert_eq!(attempts.len(), retries);
                prop_assert_eq!(
                    attempts.iter().filter(|a| a.is_active).count(),
                    1
                );

                let mut numbers: Vec<u32> =
                    attempts.iter().map(|a| a.attempt_number).collect();
                numbers.sort_unstable();
                let expected: Vec<u32> = (1..=retries as u32).collect();
                prop_assert_eq!(numbers, expected);
                Ok(())
            })?;
        }
    }
}
