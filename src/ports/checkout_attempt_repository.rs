//! CheckoutAttemptRepository port - the per-cart attempt ledger.
//!
//! ## Why the repository owns numbering and deactivation
//!
//! Two concurrent initiations for the same cart must not both end up
//! active, and attempt numbers must stay gapless and strictly increasing.
//! That is only enforceable where the rows live, so `record_new_attempt`
//! is contractually a single serialized transaction per cart rather than
//! a hook on generic persistence.

use async_trait::async_trait;

use crate::domain::checkout::CheckoutAttempt;
use crate::domain::foundation::{CartId, CheckoutId, DomainError, Money, PhoneNumber};

/// Input for recording a fresh attempt into a cart's sequence.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    /// The cart being paid for.
    pub cart_id: CartId,

    /// Subscriber number for the STK push.
    pub phone: PhoneNumber,

    /// Amount captured at initiation.
    pub amount: Money,
}

/// Result of a compare-and-swap status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The attempt was pending and the transition was applied.
    Applied,
    /// The attempt had already reached a terminal status; nothing changed.
    AlreadyTerminal,
}

/// Port for the append-only ledger of checkout attempts.
#[async_trait]
pub trait CheckoutAttemptRepository: Send + Sync {
    /// Records a new pending active attempt for the cart.
    ///
    /// Within one transaction, serialized per cart: assigns
    /// `attempt_number = max(existing) + 1` (or 1), deactivates every prior
    /// attempt for the cart, and inserts the new attempt with
    /// `is_active = true`. Returns the persisted attempt.
    async fn record_new_attempt(&self, input: NewAttempt) -> Result<CheckoutAttempt, DomainError>;

    /// Stores the gateway correlation id on a pending attempt.
    ///
    /// The correlation id is globally unique; a duplicate surfaces as
    /// `ErrorCode::DuplicateCorrelationId`.
    async fn assign_correlation_id(
        &self,
        attempt_id: &CheckoutId,
        correlation_id: &str,
    ) -> Result<CheckoutAttempt, DomainError>;

    /// Looks up an attempt by its gateway correlation id.
    async fn find_by_correlation_id(
        &self,
        correlation_id: &str,
    ) -> Result<Option<CheckoutAttempt>, DomainError>;

    /// Loads an attempt by id.
    async fn find_by_id(&self, id: &CheckoutId) -> Result<Option<CheckoutAttempt>, DomainError>;

    /// All attempts for a cart, newest first.
    async fn list_for_cart(&self, cart_id: &CartId) -> Result<Vec<CheckoutAttempt>, DomainError>;

    /// True if any attempt for the cart has succeeded.
    async fn has_successful(&self, cart_id: &CartId) -> Result<bool, DomainError>;

    /// Compare-and-swap `Pending -> Failed`, storing the gateway's
    /// description. Terminal attempts are left untouched.
    async fn mark_failed(
        &self,
        attempt_id: &CheckoutId,
        error: &str,
    ) -> Result<TransitionOutcome, DomainError>;

    /// Compare-and-swap `Pending -> Success`, storing the receipt.
    /// Terminal attempts are left untouched.
    async fn mark_succeeded(
        &self,
        attempt_id: &CheckoutId,
        receipt: Option<&str>,
    ) -> Result<TransitionOutcome, DomainError>;
}
