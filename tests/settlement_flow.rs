//! Integration tests for the checkout-to-order settlement flow.
//!
//! Drives the real ledger and reconciliation engine against the in-memory
//! backend and mock gateway: initiate an STK push, deliver callbacks the
//! way the gateway actually delivers them (late, duplicated, out of
//! order), and check that exactly one order ever comes out.

use std::sync::Arc;

use rust_decimal_macros::dec;
use serde_json::{json, Value};

use dukani::adapters::memory::{InMemoryBackend, InMemoryCatalog};
use dukani::adapters::mpesa::MockPaymentGateway;
use dukani::application::handlers::orders::{
    CancelOrderCommand, CancelOrderHandler, UpdateItemStatusCommand, UpdateItemStatusHandler,
};
use dukani::domain::cart::Cart;
use dukani::domain::catalog::ProductSnapshot;
use dukani::domain::checkout::{
    AttemptStatus, CheckoutAttempt, CheckoutError, CheckoutLedger, ReconciliationEngine,
    ReconciliationOutcome, StkCallbackEnvelope,
};
use dukani::domain::foundation::{CartId, Money, PhoneNumber, ProductId, UserId};
use dukani::domain::order::{ItemStatus, OrderError, OrderStatus};
use dukani::ports::{CartRepository, CheckoutAttemptRepository};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct World {
    backend: Arc<InMemoryBackend>,
    catalog: Arc<InMemoryCatalog>,
    gateway: Arc<MockPaymentGateway>,
    ledger: CheckoutLedger,
    engine: ReconciliationEngine,
}

fn world() -> World {
    let backend = Arc::new(InMemoryBackend::new());
    let catalog = Arc::new(InMemoryCatalog::new());
    let gateway = Arc::new(MockPaymentGateway::new());
    let ledger = CheckoutLedger::new(
        backend.clone(),
        backend.clone(),
        catalog.clone(),
        gateway.clone(),
    );
    let engine = ReconciliationEngine::new(
        backend.clone(),
        backend.clone(),
        backend.clone(),
        backend.clone(),
        catalog.clone(),
        backend.clone(),
    );
    World {
        backend,
        catalog,
        gateway,
        ledger,
        engine,
    }
}

fn customer() -> UserId {
    UserId::new("customer-1").unwrap()
}

fn phone() -> PhoneNumber {
    PhoneNumber::new("254700000000").unwrap()
}

/// Seeds two products and an active cart holding 2 x 10.00 + 1 x 5.00.
async fn seed_cart(w: &World) -> CartId {
    let flour = ProductId::new();
    let salt = ProductId::new();
    for (id, title, price) in [
        (flour, "Maize Flour 2kg", dec!(10.00)),
        (salt, "Sea Salt 500g", dec!(5.00)),
    ] {
        w.catalog
            .insert(ProductSnapshot {
                id,
                title: title.to_string(),
                unit_price: Money::new(price),
                stock: 100,
                image_url: Some(format!("https://img.example/{}.jpg", id)),
                vendor: Some(UserId::new("vendor-1").unwrap()),
            })
            .await;
    }

    let mut cart = Cart::new(customer());
    cart.add_item(flour, 2).unwrap();
    cart.add_item(salt, 1).unwrap();
    let cart_id = cart.id;
    w.backend.create(&cart).await.unwrap();
    cart_id
}

async fn initiate(w: &World, cart_id: CartId) -> CheckoutAttempt {
    w.ledger.initiate(cart_id, &customer(), phone()).await.unwrap()
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
                        {"Name": "TransactionDate", "Value": 20191219102115u64},
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

async fn deliver(w: &World, payload: Value) -> ReconciliationOutcome {
    let envelope: StkCallbackEnvelope = serde_json::from_value(payload.clone()).unwrap();
    w.engine.handle_callback(&envelope, payload).await.unwrap()
}

// =============================================================================
// The worked scenario
// =============================================================================

#[tokio::test]
async fn happy_path_settles_cart_into_paid_order() {
    let w = world();
    let cart_id = seed_cart(&w).await;

    let attempt = initiate(&w, cart_id).await;
    assert_eq!(attempt.amount, Money::new(dec!(25.00)));
    assert_eq!(attempt.attempt_number, 1);
    let correlation_id = attempt.checkout_request_id.clone().unwrap();

    let outcome = deliver(&w, success_payload(&correlation_id)).await;
    let order_id = match outcome {
        ReconciliationOutcome::Settled { order_id } => order_id,
        other => panic!("expected settlement, got {:?}", other),
    };

    let order = w.backend.find_order(&order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(order.total_price, Money::new(dec!(25.00)));
    assert_eq!(order.items.len(), 2);
    let mut subtotals: Vec<Money> = order.items.iter().map(|i| i.subtotal).collect();
    subtotals.sort();
    assert_eq!(subtotals, vec![Money::new(dec!(5.00)), Money::new(dec!(20.00))]);
    assert_eq!(order.checkout_request_id.as_deref(), Some(correlation_id.as_str()));

    let cart = w.backend.find_cart(&cart_id).await.unwrap();
    assert!(cart.is_settled());

    let attempts = w.backend.list_for_cart(&cart_id).await.unwrap();
    assert_eq!(attempts[0].status, AttemptStatus::Success);
    assert_eq!(attempts[0].receipt.as_deref(), Some("NLJ7RT61SV"));
}

// =============================================================================
// Idempotence under gateway retries
// =============================================================================

#[tokio::test]
async fn replaying_the_success_callback_five_times_creates_one_order() {
    let w = world();
    let cart_id = seed_cart(&w).await;
    let attempt = initiate(&w, cart_id).await;
    let correlation_id = attempt.checkout_request_id.unwrap();

    for _ in 0..5 {
        deliver(&w, success_payload(&correlation_id)).await;
    }

    assert_eq!(w.backend.order_count().await, 1);
    assert_eq!(w.backend.callback_count().await, 5);
}

#[tokio::test]
async fn failure_then_retry_then_success_settles_on_the_second_attempt() {
    let w = world();
    let cart_id = seed_cart(&w).await;

    // First push is cancelled on the handset.
    let first = initiate(&w, cart_id).await;
    let first_corr = first.checkout_request_id.unwrap();
    assert_eq!(
        deliver(&w, failure_payload(&first_corr)).await,
        ReconciliationOutcome::AttemptFailed
    );

    // Customer retries; a fresh attempt supersedes the failed one.
    let second = initiate(&w, cart_id).await;
    assert_eq!(second.attempt_number, 2);
    let second_corr = second.checkout_request_id.unwrap();
    assert!(matches!(
        deliver(&w, success_payload(&second_corr)).await,
        ReconciliationOutcome::Settled { .. }
    ));

    // A stale success for the dead first attempt changes nothing.
    assert_eq!(
        deliver(&w, success_payload(&first_corr)).await,
        ReconciliationOutcome::AlreadyTerminal
    );
    assert_eq!(w.backend.order_count().await, 1);

    let attempts = w.backend.list_for_cart(&cart_id).await.unwrap();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].status, AttemptStatus::Success);
    assert_eq!(attempts[1].status, AttemptStatus::Failed);
}

#[tokio::test]
async fn unknown_correlation_id_touches_nothing() {
    let w = world();
    let cart_id = seed_cart(&w).await;
    initiate(&w, cart_id).await;

    let outcome = deliver(&w, success_payload("ws_CO_somebody_else")).await;
    assert_eq!(outcome, ReconciliationOutcome::UnknownTransaction);
    assert_eq!(w.backend.order_count().await, 0);
    assert_eq!(w.backend.callback_count().await, 0);

    let cart = w.backend.find_cart(&cart_id).await.unwrap();
    assert!(cart.is_active());
}

#[tokio::test]
async fn settled_cart_refuses_further_initiation() {
    let w = world();
    let cart_id = seed_cart(&w).await;
    let attempt = initiate(&w, cart_id).await;
    deliver(&w, success_payload(&attempt.checkout_request_id.unwrap())).await;

    let result = w.ledger.initiate(cart_id, &customer(), phone()).await;
    // The cart is settled now, so it is no longer a valid checkout target.
    assert!(matches!(
        result,
        Err(CheckoutError::InvalidCart(_)) | Err(CheckoutError::AlreadyPaid(_))
    ));
    assert_eq!(w.gateway.push_count(), 1);
}

// =============================================================================
// Post-settlement lifecycle
// =============================================================================

#[tokio::test]
async fn vendor_delivers_every_item_and_the_order_follows() {
    let w = world();
    let cart_id = seed_cart(&w).await;
    let attempt = initiate(&w, cart_id).await;
    let outcome = deliver(&w, success_payload(&attempt.checkout_request_id.unwrap())).await;
    let order_id = match outcome {
        ReconciliationOutcome::Settled { order_id } => order_id,
        other => panic!("expected settlement, got {:?}", other),
    };

    let vendor = UserId::new("vendor-1").unwrap();
    let handler = UpdateItemStatusHandler::new(w.backend.clone());
    let order = w.backend.find_order(&order_id).await.unwrap();

    for step in [ItemStatus::Processing, ItemStatus::Shipped, ItemStatus::Delivered] {
        for item in &order.items {
            handler
                .handle(UpdateItemStatusCommand {
                    item_id: item.id,
                    vendor: vendor.clone(),
                    new_status: step,
                })
                .await
                .unwrap();
        }
    }

    let order = w.backend.find_order(&order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert!(order.items.iter().all(|i| i.status == ItemStatus::Delivered));
}

#[tokio::test]
async fn customer_can_cancel_before_shipment_but_not_after() {
    let w = world();
    let cart_id = seed_cart(&w).await;
    let attempt = initiate(&w, cart_id).await;
    let outcome = deliver(&w, success_payload(&attempt.checkout_request_id.unwrap())).await;
    let order_id = match outcome {
        ReconciliationOutcome::Settled { order_id } => order_id,
        other => panic!("expected settlement, got {:?}", other),
    };

    // Ship one item, then cancellation must be refused.
    let vendor = UserId::new("vendor-1").unwrap();
    let items = w.backend.find_order(&order_id).await.unwrap().items;
    let updater = UpdateItemStatusHandler::new(w.backend.clone());
    updater
        .handle(UpdateItemStatusCommand {
            item_id: items[0].id,
            vendor,
            new_status: ItemStatus::Shipped,
        })
        .await
        .unwrap();

    let canceller = CancelOrderHandler::new(w.backend.clone());
    let result = canceller
        .handle(CancelOrderCommand {
            order_id,
            customer: customer(),
            reason: "changed my mind".to_string(),
        })
        .await;
    assert!(matches!(result, Err(OrderError::CannotCancel { .. })));
}
