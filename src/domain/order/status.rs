//! Order and item status state machines.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Cancellation is only allowed before anything ships.
    pub fn can_be_cancelled(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Paid | OrderStatus::Processing
        )
    }
}

impl StateMachine for OrderStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use OrderStatus::*;
        match self {
            Pending => vec![Paid, Cancelled],
            Paid => vec![Processing, Shipped, Cancelled, Refunded],
            Processing => vec![Shipped, Delivered, Cancelled],
            Shipped => vec![Delivered, Cancelled],
            Delivered => vec![Refunded],
            Cancelled => vec![Refunded],
            Refunded => vec![],
        }
    }
}

/// Per-item fulfilment status, driven by vendor actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Pending,
    Paid,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl StateMachine for ItemStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ItemStatus::*;
        match self {
            Pending => vec![Paid, Cancelled],
            Paid => vec![Processing, Shipped, Cancelled],
            Processing => vec![Shipped, Delivered, Cancelled],
            Shipped => vec![Delivered, Cancelled],
            Delivered => vec![Refunded],
            Cancelled => vec![Refunded],
            Refunded => vec![],
        }
    }
}

/// Recomputes an order's status from its items.
///
/// Applied after every item status change:
/// - Delivered iff every item is Delivered
/// - Cancelled iff every item is Cancelled
/// - otherwise Shipped if any item is Shipped
/// - otherwise Processing if any item is Processing
/// - otherwise the current status stands
pub fn aggregate_status(current: OrderStatus, items: &[ItemStatus]) -> OrderStatus {
    if items.is_empty() {
        return current;
    }
    if items.iter().all(|s| *s == ItemStatus::Delivered) {
        return OrderStatus::Delivered;
    }
    if items.iter().all(|s| *s == ItemStatus::Cancelled) {
        return OrderStatus::Cancelled;
    }
    if items.iter().any(|s| *s == ItemStatus::Shipped) {
        return OrderStatus::Shipped;
    }
    if items.iter().any(|s| *s == ItemStatus::Processing) {
        return OrderStatus::Processing;
    }
    current
}
