//! Integration tests for the checkout HTTP surface.
//!
//! Exercises the axum routers end-to-end over the in-memory backend:
//! add to cart, initiate checkout, and deliver the gateway callback the
//! way Daraja would, asserting on raw HTTP statuses and bodies.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

use dukani::adapters::http::cart::{cart_routes, CartAppState};
use dukani::adapters::http::checkout::{checkout_routes, payment_routes, CheckoutAppState};
use dukani::adapters::memory::{InMemoryBackend, InMemoryCatalog};
use dukani::adapters::mpesa::MockPaymentGateway;
use dukani::application::handlers::cart::{
    AddToCartHandler, GetActiveCartHandler, RemoveCartItemHandler, UpdateCartItemHandler,
};
use dukani::application::handlers::checkout::{
    GetCheckoutHistoryHandler, InitiateCheckoutHandler, ProcessGatewayCallbackHandler,
};
use dukani::domain::catalog::ProductSnapshot;
use dukani::domain::checkout::{CheckoutLedger, ReconciliationEngine};
use dukani::domain::foundation::{Money, ProductId, UserId};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestApp {
    backend: Arc<InMemoryBackend>,
    catalog: Arc<InMemoryCatalog>,
    app: Router,
}

fn test_app() -> TestApp {
    let backend = Arc::new(InMemoryBackend::new());
    let catalog = Arc::new(InMemoryCatalog::new());
    let gateway = Arc::new(MockPaymentGateway::new());

    let ledger = Arc::new(CheckoutLedger::new(
        backend.clone(),
        backend.clone(),
        catalog.clone(),
        gateway,
    ));
    let engine = Arc::new(ReconciliationEngine::new(
        backend.clone(),
        backend.clone(),
        backend.clone(),
        backend.clone(),
        catalog.clone(),
        backend.clone(),
    ));

    let cart_state = CartAppState {
        get_cart: Arc::new(GetActiveCartHandler::new(backend.clone(), catalog.clone())),
        add: Arc::new(AddToCartHandler::new(backend.clone(), catalog.clone())),
        update: Arc::new(UpdateCartItemHandler::new(backend.clone(), catalog.clone())),
        remove: Arc::new(RemoveCartItemHandler::new(backend.clone())),
    };
    let checkout_state = CheckoutAppState {
        initiate: Arc::new(InitiateCheckoutHandler::new(ledger)),
        history: Arc::new(GetCheckoutHistoryHandler::new(backend.clone(), backend.clone())),
        callback: Arc::new(ProcessGatewayCallbackHandler::new(engine)),
    };

    let app = Router::new()
        .nest("/api/cart", cart_routes().with_state(cart_state))
        .nest("/api/checkout", checkout_routes().with_state(checkout_state.clone()))
        .nest("/api/payments", payment_routes().with_state(checkout_state));

    TestApp {
        backend,
        catalog,
        app,
    }
}

async fn seed_product(catalog: &InMemoryCatalog) -> ProductId {
    let id = ProductId::new();
    catalog
        .insert(ProductSnapshot {
            id,
            title: "Ground Coffee 500g".to_string(),
            unit_price: Money::new(dec!(12.50)),
            stock: 10,
            image_url: None,
            vendor: Some(UserId::new("vendor-1").unwrap()),
        })
        .await;
    id
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", "customer-1")
        .header("content-type", "application/json");
    match body {
        Some(value) => builder.body(Body::from(value.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn add_to_cart_then_initiate_then_callback_settles() {
    let t = test_app();
    let product = seed_product(&t.catalog).await;

    // Add two units.
    let response = t
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/api/cart/items",
            Some(json!({"product_id": product, "quantity": 2})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let cart = body_json(response).await;
    assert_eq!(cart["total_price"], "25.00");
    let cart_id = cart["id"].as_str().unwrap().to_string();

    // Initiate checkout.
    let response = t
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/api/checkout",
            Some(json!({"cart_id": cart_id, "phone": "0700000000"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let attempt = body_json(response).await;
    assert_eq!(attempt["status"], "PENDING");
    assert_eq!(attempt["attempt_number"], 1);
    let correlation_id = attempt["checkout_request_id"].as_str().unwrap().to_string();

    // Gateway posts the success callback (no auth headers).
    let callback = json!({
        "Body": {
            "stkCallback": {
                "CheckoutRequestID": correlation_id,
                "ResultCode": 0,
                "ResultDesc": "The service request is processed successfully.",
                "CallbackMetadata": {
                    "Item": [
                        {"Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV"}
                    ]
                }
            }
        }
    });
    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/payments/mpesa/callback")
                .header("content-type", "application/json")
                .body(Body::from(callback.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let ack = body_json(response).await;
    assert_eq!(ack["ResultCode"], 0);
    assert_eq!(ack["ResultDesc"], "Accepted");

    assert_eq!(t.backend.order_count().await, 1);

    // History shows the settled attempt.
    let response = t
        .app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/checkout/history/{}", cart["id"].as_str().unwrap()),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let history = body_json(response).await;
    assert_eq!(history["total_attempts"], 1);
    assert_eq!(history["successful_checkouts"], 1);
}

#[tokio::test]
async fn callback_for_unknown_transaction_is_still_acknowledged() {
    let t = test_app();
    let callback = json!({
        "Body": {
            "stkCallback": {
                "CheckoutRequestID": "ws_CO_unknown",
                "ResultCode": 0,
                "ResultDesc": "ok"
            }
        }
    });

    let response = t
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/payments/mpesa/callback")
                .header("content-type", "application/json")
                .body(Body::from(callback.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let ack = body_json(response).await;
    assert_eq!(ack["ResultCode"], 0);
}

#[tokio::test]
async fn malformed_callback_shape_is_rejected_before_audit() {
    let t = test_app();
    let response = t
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/payments/mpesa/callback")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"definitely": "not a callback"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(t.backend.callback_count().await, 0);
}

#[tokio::test]
async fn empty_cart_checkout_is_a_bad_request() {
    let t = test_app();

    // Create an empty cart by viewing it.
    let response = t
        .app
        .clone()
        .oneshot(request("GET", "/api/cart", None))
        .await
        .unwrap();
    let cart = body_json(response).await;
    let cart_id = cart["id"].as_str().unwrap().to_string();

    let response = t
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/api/checkout",
            Some(json!({"cart_id": cart_id, "phone": "0700000000"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "EMPTY_CART");
}

#[tokio::test]
async fn requests_without_identity_are_unauthorized() {
    let t = test_app();
    let response = t
        .app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/cart")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
