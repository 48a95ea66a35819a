//! Cart domain module.
//!
//! The shopping cart aggregate and its settlement state machine. A cart is
//! the mutable staging area for a purchase; settlement freezes it forever.

mod aggregate;
mod errors;

pub use aggregate::{Cart, CartItem, CartState};
pub use errors::CartError;
