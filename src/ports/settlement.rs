//! SettlementStore port - the atomic cart-to-order transition.
//!
//! ## Why one port method
//!
//! Settlement spans three tables: the attempt flips to Success, the order
//! and its items are inserted, and the cart is frozen. If those were three
//! port calls, a crash between any two would leave a Success attempt with
//! no order, or an order against a still-active cart. Bundling them into
//! one contract lets the PostgreSQL adapter run a single transaction and
//! the in-memory adapter a single critical section.
//!
//! ## Race Condition Handling
//!
//! The transaction begins with a compare-and-swap on the attempt status
//! (`Pending -> Success`). When duplicate success callbacks race, exactly
//! one caller observes `Committed`; the rest observe `AlreadySettled` and
//! must not retry.

use async_trait::async_trait;

use crate::domain::foundation::{CartId, CheckoutId, DomainError};
use crate::domain::order::Order;

/// Everything settlement writes, gathered before the transaction starts.
#[derive(Debug, Clone)]
pub struct SettlementCommit {
    /// The attempt being confirmed. Must currently be pending.
    pub attempt_id: CheckoutId,

    /// M-Pesa receipt extracted from the callback metadata.
    pub receipt: Option<String>,

    /// The cart being frozen.
    pub cart_id: CartId,

    /// The order snapshot to materialize, items included.
    pub order: Order,
}

/// Result of a settlement commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// This caller won the compare-and-swap; the order now exists.
    Committed,
    /// The attempt was already terminal; nothing was written.
    AlreadySettled,
}

/// Port for executing the settlement transaction.
#[async_trait]
pub trait SettlementStore: Send + Sync {
    /// Atomically: attempt `Pending -> Success` (with receipt), order and
    /// items inserted, cart `Active -> Settled`.
    async fn commit(&self, commit: SettlementCommit) -> Result<SettlementOutcome, DomainError>;
}
