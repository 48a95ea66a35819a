//! Order domain module.
//!
//! Immutable purchase snapshots and their fulfilment lifecycle.
//!
//! # Module Structure
//!
//! - `aggregate` - Order and OrderItem entities
//! - `status` - OrderStatus/ItemStatus state machines and the aggregation rule
//! - `factory` - OrderFactory, the single birthplace of orders
//! - `errors` - Order-specific error types

mod aggregate;
mod errors;
mod factory;
mod status;

pub use aggregate::{Order, OrderItem};
pub use errors::OrderError;
pub use factory::OrderFactory;
pub use status::{aggregate_status, ItemStatus, OrderStatus};
