//! CheckoutAttempt aggregate entity.
//!
//! One payment-initiation record against a cart. A cart accumulates many
//! attempts across retries; the repository guarantees that exactly one of
//! them is active at a time and that attempt numbers form a strictly
//! increasing sequence per cart.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CartId, CheckoutId, Money, PhoneNumber, StateMachine, Timestamp, ValidationError,
};

use super::AttemptStatus;

/// CheckoutAttempt aggregate - one push payment request against a cart.
///
/// # Invariants
///
/// - `attempt_number` is assigned at persistence as `max(existing) + 1`.
/// - `checkout_request_id` is globally unique once the gateway assigns it,
///   and never changes afterwards.
/// - Status only ever moves `Pending -> Success` or `Pending -> Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutAttempt {
    /// Unique identifier.
    pub id: CheckoutId,

    /// The cart this attempt pays for.
    pub cart_id: CartId,

    /// Subscriber number the STK push was sent to.
    pub phone: PhoneNumber,

    /// Amount captured at initiation. Authoritative for the charge.
    pub amount: Money,

    /// Gateway correlation id, set once the STK push is acknowledged.
    pub checkout_request_id: Option<String>,

    /// Current lifecycle status.
    pub status: AttemptStatus,

    /// 1-based position in the cart's attempt sequence.
    pub attempt_number: u32,

    /// True for the cart's most recent attempt only.
    pub is_active: bool,

    /// M-Pesa receipt number, present after a successful callback.
    pub receipt: Option<String>,

    /// Gateway failure description, present after a failed callback.
    pub error_message: Option<String>,

    /// When the attempt was created.
    pub created_at: Timestamp,

    /// When the attempt was last updated.
    pub updated_at: Timestamp,
}

impl CheckoutAttempt {
    /// Creates a pending active attempt.
    ///
    /// `attempt_number` starts at 1; the repository reassigns it when the
    /// attempt is recorded into the cart's sequence.
    pub fn new(cart_id: CartId, phone: PhoneNumber, amount: Money) -> Self {
        let now = Timestamp::now();
        Self {
            id: CheckoutId::new(),
            cart_id,
            phone,
            amount,
            checkout_request_id: None,
            status: AttemptStatus::Pending,
            attempt_number: 1,
            is_active: true,
            receipt: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// True once the attempt reached `Success` or `Failed`.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Stores the gateway correlation id. Valid exactly once.
    pub fn assign_correlation_id(&mut self, id: impl Into<String>) -> Result<(), ValidationError> {
        if self.checkout_request_id.is_some() {
            return Err(ValidationError::invalid_format(
                "checkout_request_id",
                "correlation id already assigned",
            ));
        }
        self.checkout_request_id = Some(id.into());
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Confirms the payment, storing the gateway receipt.
    pub fn mark_succeeded(&mut self, receipt: Option<String>) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(AttemptStatus::Success)?;
        self.receipt = receipt;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Records the gateway's failure description.
    pub fn mark_failed(&mut self, error: impl Into<String>) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(AttemptStatus::Failed)?;
        self.error_message = Some(error.into());
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Removes this attempt from the cart's active slot.
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Timestamp::now();
    }
}
