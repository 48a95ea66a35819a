//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `CartRepository` - cart persistence and the one-active-cart invariant
//! - `CheckoutAttemptRepository` - the per-cart attempt ledger
//! - `CallbackRecordStore` - append-only callback audit trail
//! - `OrderRepository` - order reads and lifecycle updates
//! - `SettlementStore` - the single atomic cart-to-order transaction
//!
//! ## Collaborator Ports
//!
//! - `PaymentGateway` - outbound STK push requests
//! - `ProductCatalog` - read-only product snapshots

mod callback_store;
mod cart_repository;
mod checkout_attempt_repository;
mod order_repository;
mod payment_gateway;
mod product_catalog;
mod settlement;

pub use callback_store::CallbackRecordStore;
pub use cart_repository::CartRepository;
pub use checkout_attempt_repository::{
    CheckoutAttemptRepository, NewAttempt, TransitionOutcome,
};
pub use order_repository::{OrderRepository, VendorItem};
pub use payment_gateway::{GatewayError, GatewayErrorCode, PaymentGateway, PaymentRequest, StkPushAck};
pub use product_catalog::ProductCatalog;
pub use settlement::{SettlementCommit, SettlementOutcome, SettlementStore};
