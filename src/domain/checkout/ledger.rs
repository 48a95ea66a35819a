//! CheckoutLedger - owns the per-cart sequence of payment attempts.
//!
//! Initiation used to be easy to get wrong: the original flow buried
//! attempt numbering and deactivation in a persistence hook, so the
//! invariant only held when rows were saved through one code path. Here it
//! is an explicit operation: the ledger checks the preconditions, the
//! repository assigns the number and swaps the active attempt inside one
//! serialized transaction, and only then is the gateway contacted.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::cart::Cart;
use crate::domain::foundation::{CartId, Money, PhoneNumber, ProductId, UserId, ValidationError};
use crate::ports::{
    CartRepository, CheckoutAttemptRepository, NewAttempt, PaymentGateway, PaymentRequest,
    ProductCatalog,
};

use super::{CheckoutAttempt, CheckoutError};

/// Transaction description sent with every STK push.
const TRANSACTION_DESC: &str = "Payment for Dukani order";

/// Domain service for initiating checkout attempts.
pub struct CheckoutLedger {
    carts: Arc<dyn CartRepository>,
    attempts: Arc<dyn CheckoutAttemptRepository>,
    catalog: Arc<dyn ProductCatalog>,
    gateway: Arc<dyn PaymentGateway>,
}

impl CheckoutLedger {
    pub fn new(
        carts: Arc<dyn CartRepository>,
        attempts: Arc<dyn CheckoutAttemptRepository>,
        catalog: Arc<dyn ProductCatalog>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            carts,
            attempts,
            catalog,
            gateway,
        }
    }

    /// Initiates a payment attempt against the owner's cart.
    ///
    /// On success the returned attempt is pending, active, and carries the
    /// gateway correlation id the later callback will reference.
    ///
    /// # Errors
    ///
    /// - `CartNotFound` / `InvalidCart` - missing cart, foreign cart, or a
    ///   cart that is no longer active.
    /// - `AlreadyPaid` - some attempt for this cart already succeeded.
    /// - `EmptyCart` - no items, or the priced total is not positive. No
    ///   attempt is persisted and the gateway is never contacted.
    /// - `GatewayUnavailable` - the STK push could not be issued. The
    ///   pending attempt is kept for audit; a later initiate supersedes it.
    pub async fn initiate(
        &self,
        cart_id: CartId,
        owner: &UserId,
        phone: PhoneNumber,
    ) -> Result<CheckoutAttempt, CheckoutError> {
        let cart = self
            .carts
            .find_by_id(&cart_id)
            .await?
            .ok_or(CheckoutError::CartNotFound(cart_id))?;

        if cart.owner != *owner || !cart.is_active() {
            return Err(CheckoutError::InvalidCart(cart_id));
        }

        if self.attempts.has_successful(&cart_id).await? {
            return Err(CheckoutError::AlreadyPaid(cart_id));
        }

        let amount = self.price_cart(&cart).await?;
        if cart.is_empty() || !amount.is_positive() {
            return Err(CheckoutError::EmptyCart(cart_id));
        }

        let attempt = self
            .attempts
            .record_new_attempt(NewAttempt {
                cart_id,
                phone: phone.clone(),
                amount,
            })
            .await?;

        let request = PaymentRequest {
            phone,
            amount,
            account_reference: format!("Cart-{}", cart_id),
            description: TRANSACTION_DESC.to_string(),
        };

        let ack = match self.gateway.request_stk_push(request).await {
            Ok(ack) => ack,
            Err(err) => {
                warn!(
                    cart_id = %cart_id,
                    attempt_id = %attempt.id,
                    attempt_number = attempt.attempt_number,
                    error = %err,
                    "STK push failed; attempt kept pending for audit"
                );
                return Err(err.into());
            }
        };

        let attempt = self
            .attempts
            .assign_correlation_id(&attempt.id, &ack.checkout_request_id)
            .await?;

        info!(
            cart_id = %cart_id,
            attempt_id = %attempt.id,
            attempt_number = attempt.attempt_number,
            checkout_request_id = %ack.checkout_request_id,
            "STK push initiated"
        );

        Ok(attempt)
    }

    /// Prices the cart live from the catalog.
    ///
    /// The figure charged is the one computed here, at initiation. Cart
    /// serializations before or after may show a different live total if a
    /// vendor reprices mid-session; the initiation capture is what the
    /// customer confirms on their handset.
    async fn price_cart(&self, cart: &Cart) -> Result<Money, CheckoutError> {
        let ids: Vec<ProductId> = cart.items.iter().map(|i| i.product_id).collect();
        let snapshots = self.catalog.snapshots(&ids).await?;

        let mut total = Money::ZERO;
        for line in &cart.items {
            let snapshot = snapshots.get(&line.product_id).ok_or_else(|| {
                ValidationError::invalid_format(
                    "cart",
                    format!("product {} is no longer available", line.product_id),
                )
            })?;
            total = total + snapshot.line_total(line.quantity);
        }
        Ok(total)
    }
}
