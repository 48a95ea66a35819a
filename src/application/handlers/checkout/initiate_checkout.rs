//! InitiateCheckoutHandler - command handler wrapping the checkout ledger.

use std::sync::Arc;

use crate::domain::checkout::{CheckoutAttempt, CheckoutError, CheckoutLedger};
use crate::domain::foundation::{CartId, PhoneNumber, UserId};

/// Command to start payment for a cart.
#[derive(Debug, Clone)]
pub struct InitiateCheckoutCommand {
    pub cart_id: CartId,
    pub owner: UserId,
    /// Raw subscriber number as typed by the customer.
    pub phone: String,
}

/// Handler for checkout initiation.
pub struct InitiateCheckoutHandler {
    ledger: Arc<CheckoutLedger>,
}

impl InitiateCheckoutHandler {
    pub fn new(ledger: Arc<CheckoutLedger>) -> Self {
        Self { ledger }
    }

    /// Validates the phone number and hands over to the ledger.
    pub async fn handle(
        &self,
        cmd: InitiateCheckoutCommand,
    ) -> Result<CheckoutAttempt, CheckoutError> {
        let phone = PhoneNumber::new(&cmd.phone)?;
        self.ledger.initiate(cmd.cart_id, &cmd.owner, phone).await
    }
}
