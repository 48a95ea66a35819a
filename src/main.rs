//! Dukani server binary.

use std::sync::Arc;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dukani::adapters::http::cart::{cart_routes, CartAppState};
use dukani::adapters::http::checkout::{checkout_routes, payment_routes, CheckoutAppState};
use dukani::adapters::http::orders::{orders_routes, OrdersAppState};
use dukani::adapters::mpesa::DarajaGateway;
use dukani::adapters::postgres::{
    PostgresCallbackRecordStore, PostgresCartRepository, PostgresCheckoutAttemptRepository,
    PostgresOrderRepository, PostgresProductCatalog, PostgresSettlementStore,
};
use dukani::application::handlers::cart::{
    AddToCartHandler, GetActiveCartHandler, RemoveCartItemHandler, UpdateCartItemHandler,
};
use dukani::application::handlers::checkout::{
    GetCheckoutHistoryHandler, InitiateCheckoutHandler, ProcessGatewayCallbackHandler,
};
use dukani::application::handlers::orders::{
    CancelOrderHandler, GetOrderHandler, ListCustomerOrdersHandler, ListVendorItemsHandler,
    UpdateItemStatusHandler,
};
use dukani::config::AppConfig;
use dukani::domain::checkout::{CheckoutLedger, ReconciliationEngine};
use dukani::ports::{
    CallbackRecordStore, CartRepository, CheckoutAttemptRepository, OrderRepository,
    PaymentGateway, ProductCatalog, SettlementStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dukani=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Storage adapters
    let carts: Arc<dyn CartRepository> = Arc::new(PostgresCartRepository::new(pool.clone()));
    let attempts: Arc<dyn CheckoutAttemptRepository> =
        Arc::new(PostgresCheckoutAttemptRepository::new(pool.clone()));
    let callbacks: Arc<dyn CallbackRecordStore> =
        Arc::new(PostgresCallbackRecordStore::new(pool.clone()));
    let orders: Arc<dyn OrderRepository> = Arc::new(PostgresOrderRepository::new(pool.clone()));
    let settlement: Arc<dyn SettlementStore> =
        Arc::new(PostgresSettlementStore::new(pool.clone()));
    let catalog: Arc<dyn ProductCatalog> = Arc::new(PostgresProductCatalog::new(pool.clone()));

    // Gateway
    if config.mpesa.is_sandbox() {
        info!("Daraja gateway in sandbox mode");
    }
    let gateway: Arc<dyn PaymentGateway> = Arc::new(DarajaGateway::new(config.mpesa.clone())?);

    // Domain services
    let ledger = Arc::new(CheckoutLedger::new(
        carts.clone(),
        attempts.clone(),
        catalog.clone(),
        gateway,
    ));
    let engine = Arc::new(ReconciliationEngine::new(
        attempts.clone(),
        callbacks,
        carts.clone(),
        orders.clone(),
        catalog.clone(),
        settlement,
    ));

    // Application state per module
    let cart_state = CartAppState {
        get_cart: Arc::new(GetActiveCartHandler::new(carts.clone(), catalog.clone())),
        add: Arc::new(AddToCartHandler::new(carts.clone(), catalog.clone())),
        update: Arc::new(UpdateCartItemHandler::new(carts.clone(), catalog)),
        remove: Arc::new(RemoveCartItemHandler::new(carts.clone())),
    };
    let checkout_state = CheckoutAppState {
        initiate: Arc::new(InitiateCheckoutHandler::new(ledger)),
        history: Arc::new(GetCheckoutHistoryHandler::new(carts, attempts)),
        callback: Arc::new(ProcessGatewayCallbackHandler::new(engine)),
    };
    let orders_state = OrdersAppState {
        list: Arc::new(ListCustomerOrdersHandler::new(orders.clone())),
        get: Arc::new(GetOrderHandler::new(orders.clone())),
        cancel: Arc::new(CancelOrderHandler::new(orders.clone())),
        vendor_items: Arc::new(ListVendorItemsHandler::new(orders.clone())),
        update_item: Arc::new(UpdateItemStatusHandler::new(orders)),
    };

    let app = Router::new()
        .nest("/api/cart", cart_routes().with_state(cart_state))
        .nest("/api/checkout", checkout_routes().with_state(checkout_state.clone()))
        .nest("/api/payments", payment_routes().with_state(checkout_state))
        .nest("/api/orders", orders_routes().with_state(orders_state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.server.socket_addr();
    info!(%addr, "dukani listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
