//! Catalog module - the product contract consumed by the core.
//!
//! Product CRUD lives in an external collaborator; the checkout core only
//! ever reads point-in-time snapshots through this contract.

mod product;

pub use product::ProductSnapshot;
