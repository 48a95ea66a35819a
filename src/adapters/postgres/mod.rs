//! PostgreSQL adapters.
//!
//! sqlx-backed implementations of the storage ports. Invariants that must
//! hold under concurrency live here as schema constraints and row locks:
//!
//! - one active cart per owner: partial unique index on `carts`
//! - globally unique correlation ids: unique index on
//!   `checkout_attempts.checkout_request_id`
//! - attempt numbering: cart row lock inside `record_new_attempt`
//! - settlement: one transaction opening with a status compare-and-swap

mod callback_store;
mod cart_repository;
mod checkout_attempt_repository;
mod order_repository;
mod product_catalog;
mod settlement;

pub use callback_store::PostgresCallbackRecordStore;
pub use cart_repository::PostgresCartRepository;
pub use checkout_attempt_repository::PostgresCheckoutAttemptRepository;
pub use order_repository::PostgresOrderRepository;
pub use product_catalog::PostgresProductCatalog;
pub use settlement::PostgresSettlementStore;
