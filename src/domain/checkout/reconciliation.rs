//! ReconciliationEngine - turns at-least-once callbacks into
//! exactly-once settlement.
//!
//! ## Design
//!
//! Callbacks arrive over an untrusted channel the gateway retries freely:
//! the same payload may be delivered many times, a failure may be followed
//! by a stale success, and two deliveries may race each other. The engine
//! is safe under all of these because:
//!
//! 1. Every callback that names a known attempt is appended to the audit
//!    trail unconditionally, before any decision.
//! 2. Terminal attempts never re-enter the state machine; late callbacks
//!    become audit entries only.
//! 3. The duplicate-order guard is keyed strictly on the gateway
//!    correlation id. Two legitimate orders from one customer can share an
//!    amount; they can never share a correlation id.
//! 4. Settlement (attempt Success + order insert + cart freeze) is one
//!    atomic commit that starts with a compare-and-swap on the attempt
//!    status, so racing deliveries produce exactly one order.
//!
//! The engine reports outcomes to its caller, but the HTTP adapter always
//! acknowledges the gateway regardless: a retry storm triggered by our own
//! internal errors helps nobody once the payload is durably recorded.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::domain::foundation::{DomainError, ErrorCode, OrderId, ProductId};
use crate::domain::order::OrderFactory;
use crate::ports::{
    CallbackRecordStore, CartRepository, CheckoutAttemptRepository, OrderRepository,
    ProductCatalog, SettlementCommit, SettlementOutcome, SettlementStore, TransitionOutcome,
};

use super::{CallbackRecord, StkCallbackEnvelope};

/// What a callback ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationOutcome {
    /// Correlation id matches no attempt. Acknowledged, nothing touched.
    UnknownTransaction,
    /// The attempt was marked failed.
    AttemptFailed,
    /// The attempt was already terminal; the callback was recorded as
    /// audit and had no further effect.
    AlreadyTerminal,
    /// This callback settled the cart into a new order.
    Settled { order_id: OrderId },
    /// An order for this correlation id already exists (or a racing
    /// delivery won the settlement); no duplicate was created.
    AlreadySettled,
}

/// Domain service that consumes gateway callbacks.
pub struct ReconciliationEngine {
    attempts: Arc<dyn CheckoutAttemptRepository>,
    callbacks: Arc<dyn CallbackRecordStore>,
    carts: Arc<dyn CartRepository>,
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn ProductCatalog>,
    settlement: Arc<dyn SettlementStore>,
}

impl ReconciliationEngine {
    pub fn new(
        attempts: Arc<dyn CheckoutAttemptRepository>,
        callbacks: Arc<dyn CallbackRecordStore>,
        carts: Arc<dyn CartRepository>,
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<dyn ProductCatalog>,
        settlement: Arc<dyn SettlementStore>,
    ) -> Self {
        Self {
            attempts,
            callbacks,
            carts,
            orders,
            catalog,
            settlement,
        }
    }

    /// Processes one parsed callback.
    ///
    /// `raw` is the payload exactly as received, preserved in the audit
    /// trail. Errors returned here are for the caller's logs; the gateway
    /// response is not derived from them.
    pub async fn handle_callback(
        &self,
        envelope: &StkCallbackEnvelope,
        raw: Value,
    ) -> Result<ReconciliationOutcome, DomainError> {
        let callback = envelope.callback();
        let correlation_id = callback.checkout_request_id.as_str();

        let Some(attempt) = self.attempts.find_by_correlation_id(correlation_id).await? else {
            warn!(
                correlation_id,
                result_code = callback.result_code,
                "callback names an unknown transaction; acknowledging without action"
            );
            return Ok(ReconciliationOutcome::UnknownTransaction);
        };

        // Audit first, decide later. Duplicates and late arrivals are
        // recorded the same as firsts.
        self.callbacks
            .append(CallbackRecord::new(attempt.id, callback, raw))
            .await?;

        if !callback.is_success() {
            let outcome = self
                .attempts
                .mark_failed(&attempt.id, &callback.result_desc)
                .await?;
            return Ok(match outcome {
                TransitionOutcome::Applied => {
                    info!(
                        correlation_id,
                        attempt_id = %attempt.id,
                        result_code = callback.result_code,
                        result_desc = %callback.result_desc,
                        "payment failed"
                    );
                    ReconciliationOutcome::AttemptFailed
                }
                TransitionOutcome::AlreadyTerminal => ReconciliationOutcome::AlreadyTerminal,
            });
        }

        if attempt.is_terminal() {
            info!(
                correlation_id,
                attempt_id = %attempt.id,
                status = ?attempt.status,
                "success callback for terminal attempt recorded as audit only"
            );
            return Ok(ReconciliationOutcome::AlreadyTerminal);
        }

        let receipt = callback.receipt();

        // Duplicate-order guard, keyed strictly on the correlation id.
        if self
            .orders
            .find_by_correlation_id(correlation_id)
            .await?
            .is_some()
        {
            self.attempts
                .mark_succeeded(&attempt.id, receipt.as_deref())
                .await?;
            info!(
                correlation_id,
                attempt_id = %attempt.id,
                "order already exists for correlation id; attempt confirmed without new order"
            );
            return Ok(ReconciliationOutcome::AlreadySettled);
        }

        let cart = self
            .carts
            .find_by_id(&attempt.cart_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::CartNotFound,
                    format!("attempt {} references missing cart {}", attempt.id, attempt.cart_id),
                )
            })?;

        if !cart.is_active() {
            // A sibling attempt has already settled this cart. The current
            // attempt stays pending forever; retries keep landing here and
            // keep being harmless.
            error!(
                correlation_id,
                cart_id = %cart.id,
                "success callback for an already-settled cart with no order under this correlation id"
            );
            return Err(DomainError::new(
                ErrorCode::CartSettled,
                format!("cart {} already settled", cart.id),
            ));
        }

        let product_ids: Vec<ProductId> = cart.items.iter().map(|i| i.product_id).collect();
        let snapshots = self.catalog.snapshots(&product_ids).await?;

        let order = OrderFactory::create(&cart, &attempt, &snapshots)
            .map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))?;
        let order_id = order.id;

        let outcome = self
            .settlement
            .commit(SettlementCommit {
                attempt_id: attempt.id,
                receipt: receipt.clone(),
                cart_id: cart.id,
                order,
            })
            .await?;

        Ok(match outcome {
            SettlementOutcome::Committed => {
                info!(
                    correlation_id,
                    attempt_id = %attempt.id,
                    order_id = %order_id,
                    cart_id = %cart.id,
                    receipt = receipt.as_deref().unwrap_or("-"),
                    "cart settled into order"
                );
                ReconciliationOutcome::Settled { order_id }
            }
            SettlementOutcome::AlreadySettled => {
                info!(
                    correlation_id,
                    attempt_id = %attempt.id,
                    "lost settlement race to a concurrent delivery; no duplicate order"
                );
                ReconciliationOutcome::AlreadySettled
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryBackend, InMemoryCatalog};
    use crate::domain::cart::Cart;
    use crate::domain::catalog::ProductSnapshot;
    use crate::domain::checkout::AttemptStatus;
    use crate::domain::foundation::{CartId, Money, PhoneNumber, UserId};
    use crate::domain::order::OrderStatus;
    use crate::ports::NewAttempt;
    use rust_decimal_macros::dec;
    use serde_json::json;

    struct Fixture {
        backend: Arc<InMemoryBackend>,
        catalog: Arc<InMemoryCatalog>,
        engine: ReconciliationEngine,
    }

    fn fixture() -> Fixture {
        let backend = Arc::new(InMemoryBackend::new());
        let catalog = Arc::new(InMemoryCatalog::new());
        let engine = ReconciliationEngine::new(
            backend.clone(),
            backend.clone(),
            backend.clone(),
            backend.clone(),
            catalog.clone(),
            backend.clone(),
        );
        Fixture {
            backend,
            catalog,
            engine,
        }
    }

    fn customer() -> UserId {
        UserId::new("customer-1").unwrap()
    }

    /// Seeds a cart (2 x 10.00 + 1 x 5.00) with a pending attempt carrying
    /// the given correlation id. Returns the cart id.
    async fn seed_pending_attempt(fx: &Fixture, correlation_id: &str) -> CartId {
        let flour = ProductId::new();
        let salt = ProductId::new();
        for (id, price) in [(flour, dec!(10.00)), (salt, dec!(5.00))] {
            fx.catalog
                .insert(ProductSnapshot {
                    id,
                    title: format!("Product {}", id),
                    unit_price: Money::new(price),
                    stock: 50,
                    image_url: None,
                    vendor: Some(UserId::new("vendor-1").unwrap()),
                })
                .await;
        }

        let mut cart = Cart::new(customer());
        cart.add_item(flour, 2).unwrap();
        cart.add_item(salt, 1).unwrap();
        let cart_id = cart.id;
        fx.backend.create(&cart).await.unwrap();

        let attempt = fx
            .backend
            .record_new_attempt(NewAttempt {
                cart_id,
                phone: PhoneNumber::new("254700000000").unwrap(),
                amount: Money::new(dec!(25.00)),
            })
            .await
            .unwrap();
        fx.backend
            .assign_correlation_id(&attempt.id, correlation_id)
            .await
            .unwrap();
        cart_id
    }

    fn success_payload(correlation_id: &str) -> Value {
        json!({
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": correlation_id,
                    "ResultCode": 0,
                    "ResultDesc": "The service request is processed successfully.",
                    "CallbackMetadata": {
                        "Item": [
                            {"Name": "Amount", "Value": 25.00},
                            {"Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV"},
                            {"Name": "PhoneNumber", "Value": 254700000000u64}
                        ]
                    }
                }
            }
        })
    }

    fn failure_payload(correlation_id: &str) -> Value {
        json!({
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": correlation_id,
                    "ResultCode": 1032,
                    "ResultDesc": "Request cancelled by user."
                }
            }
        })
    }

    async fn deliver(fx: &Fixture, payload: Value) -> ReconciliationOutcome {
        let envelope: StkCallbackEnvelope = serde_json::from_value(payload.clone()).unwrap();
        fx.engine.handle_callback(&envelope, payload).await.unwrap()
    }

    #[tokio::test]
    async fn success_callback_settles_cart_into_order() {
        let fx = fixture();
        let cart_id = seed_pending_attempt(&fx, "ws_CO_1").await;

        let outcome = deliver(&fx, success_payload("ws_CO_1")).await;
        let order_id = match outcome {
            ReconciliationOutcome::Settled { order_id } => order_id,
            other => panic!("expected settlement, got {:?}", other),
        };

        let order = fx.backend.find_order(&order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.total_price, Money::new(dec!(25.00)));
        assert_eq!(order.items.len(), 2);
        let mut subtotals: Vec<Money> = order.items.iter().map(|i| i.subtotal).collect();
        subtotals.sort();
        assert_eq!(
            subtotals,
            vec![Money::new(dec!(5.00)), Money::new(dec!(20.00))]
        );

        let cart = fx
            .backend
            .find_cart(&cart_id)
            .await
            .expect("cart still exists");
        assert!(cart.is_settled());

        let attempts = fx.backend.list_for_cart(&cart_id).await.unwrap();
        assert_eq!(attempts[0].status, AttemptStatus::Success);
        assert_eq!(attempts[0].receipt.as_deref(), Some("NLJ7RT61SV"));
    }

    #[tokio::test]
    async fn duplicate_success_callbacks_create_exactly_one_order() {
        let fx = fixture();
        let cart_id = seed_pending_attempt(&fx, "ws_CO_2").await;

        let first = deliver(&fx, success_payload("ws_CO_2")).await;
        assert!(matches!(first, ReconciliationOutcome::Settled { .. }));

        for _ in 0..3 {
            let repeat = deliver(&fx, success_payload("ws_CO_2")).await;
            assert_eq!(repeat, ReconciliationOutcome::AlreadyTerminal);
        }

        assert_eq!(fx.backend.order_count().await, 1);

        // Every delivery is in the audit trail.
        let attempts = fx.backend.list_for_cart(&cart_id).await.unwrap();
        let records = fx
            .backend
            .list_for_attempt(&attempts[0].id)
            .await
            .unwrap();
        assert_eq!(records.len(), 4);
    }

    #[tokio::test]
    async fn failure_callback_marks_attempt_failed() {
        let fx = fixture();
        let cart_id = seed_pending_attempt(&fx, "ws_CO_3").await;

        let outcome = deliver(&fx, failure_payload("ws_CO_3")).await;
        assert_eq!(outcome, ReconciliationOutcome::AttemptFailed);

        let attempts = fx.backend.list_for_cart(&cart_id).await.unwrap();
        assert_eq!(attempts[0].status, AttemptStatus::Failed);
        assert_eq!(
            attempts[0].error_message.as_deref(),
            Some("Request cancelled by user.")
        );
        assert_eq!(fx.backend.order_count().await, 0);

        // Cart stays active and retriable.
        let cart = fx.backend.find_cart(&cart_id).await.unwrap();
        assert!(cart.is_active());
    }

    #[tokio::test]
    async fn failed_then_success_does_not_resurrect_the_attempt() {
        let fx = fixture();
        let cart_id = seed_pending_attempt(&fx, "ws_CO_4").await;

        deliver(&fx, failure_payload("ws_CO_4")).await;
        let outcome = deliver(&fx, success_payload("ws_CO_4")).await;

        // Terminal means terminal: the stale success is audit only.
        assert_eq!(outcome, ReconciliationOutcome::AlreadyTerminal);
        assert_eq!(fx.backend.order_count().await, 0);

        let attempts = fx.backend.list_for_cart(&cart_id).await.unwrap();
        assert_eq!(attempts[0].status, AttemptStatus::Failed);
        let records = fx
            .backend
            .list_for_attempt(&attempts[0].id)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn unknown_correlation_id_is_acknowledged_without_mutation() {
        let fx = fixture();
        seed_pending_attempt(&fx, "ws_CO_5").await;

        let outcome = deliver(&fx, success_payload("ws_CO_does_not_exist")).await;

        assert_eq!(outcome, ReconciliationOutcome::UnknownTransaction);
        assert_eq!(fx.backend.order_count().await, 0);
        assert_eq!(fx.backend.callback_count().await, 0);
    }

    #[tokio::test]
    async fn duplicate_failure_callbacks_stay_terminal() {
        let fx = fixture();
        let cart_id = seed_pending_attempt(&fx, "ws_CO_6").await;

        let first = deliver(&fx, failure_payload("ws_CO_6")).await;
        let second = deliver(&fx, failure_payload("ws_CO_6")).await;

        assert_eq!(first, ReconciliationOutcome::AttemptFailed);
        assert_eq!(second, ReconciliationOutcome::AlreadyTerminal);

        let attempts = fx.backend.list_for_cart(&cart_id).await.unwrap();
        assert_eq!(attempts[0].status, AttemptStatus::Failed);
    }

    #[tokio::test]
    async fn existing_order_for_correlation_id_skips_creation_but_confirms_attempt() {
        let fx = fixture();
        let cart_id = seed_pending_attempt(&fx, "ws_CO_7").await;

        // Settle once, then reset the attempt to pending to simulate a
        // crash after order insert in a non-atomic store.
        let outcome = deliver(&fx, success_payload("ws_CO_7")).await;
        assert!(matches!(outcome, ReconciliationOutcome::Settled { .. }));
        let attempts = fx.backend.list_for_cart(&cart_id).await.unwrap();
        fx.backend.force_status(&attempts[0].id, AttemptStatus::Pending).await;

        let outcome = deliver(&fx, success_payload("ws_CO_7")).await;
        assert_eq!(outcome, ReconciliationOutcome::AlreadySettled);
        assert_eq!(fx.backend.order_count().await, 1);

        let attempts = fx.backend.list_for_cart(&cart_id).await.unwrap();
        assert_eq!(attempts[0].status, AttemptStatus::Success);
    }

    #[tokio::test]
    async fn failure_after_success_is_audit_only() {
        let fx = fixture();
        let cart_id = seed_pending_attempt(&fx, "ws_CO_8").await;

        deliver(&fx, success_payload("ws_CO_8")).await;
        let outcome = deliver(&fx, failure_payload("ws_CO_8")).await;

        assert_eq!(outcome, ReconciliationOutcome::AlreadyTerminal);
        let attempts = fx.backend.list_for_cart(&cart_id).await.unwrap();
        assert_eq!(attempts[0].status, AttemptStatus::Success);
        assert_eq!(fx.backend.order_count().await, 1);
    }
}
