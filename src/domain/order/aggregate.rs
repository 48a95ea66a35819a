//! Order aggregate entity.
//!
//! # Design Decisions
//!
//! - **Frozen snapshot**: item names, images, unit prices, and subtotals
//!   are copied out of the catalog at creation and never recomputed from
//!   live data. Price changes after settlement cannot touch an order.
//! - **Nullable product reference**: an order item outlives deletion of
//!   the product it was bought as.
//! - **Aggregate status from items**: the order's own status is recomputed
//!   from its items after every vendor action (see `status::aggregate_status`).

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    Money, OrderId, OrderItemId, PhoneNumber, ProductId, StateMachine, Timestamp, UserId,
    ValidationError,
};

use super::{aggregate_status, ItemStatus, OrderStatus};

/// A frozen line item within an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Unique identifier.
    pub id: OrderItemId,

    /// The product this line was bought as. Survives product deletion.
    pub product_id: Option<ProductId>,

    /// Product title at purchase time.
    pub product_name: String,

    /// Product image URL at purchase time, if any.
    pub product_image: Option<String>,

    /// Units purchased.
    pub quantity: u32,

    /// Unit price at purchase time.
    pub unit_price: Money,

    /// `unit_price * quantity`, computed once at creation.
    pub subtotal: Money,

    /// The vendor responsible for fulfilment, if the product had one.
    pub vendor: Option<UserId>,

    /// Fulfilment status of this line.
    pub status: ItemStatus,
}

/// Order aggregate - an immutable purchase snapshot with a mutable
/// fulfilment status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier.
    pub id: OrderId,

    /// The customer who paid.
    pub customer: UserId,

    /// Total charged, captured from the triggering checkout attempt.
    pub total_price: Money,

    /// Aggregate fulfilment status.
    pub status: OrderStatus,

    /// Correlation id of the checkout attempt that created this order.
    pub checkout_request_id: Option<String>,

    /// Phone number the payment was made from.
    pub phone_number: Option<PhoneNumber>,

    /// Delivery address, when the customer has provided one.
    pub delivery_address: Option<String>,

    /// Free-text annotations (e.g. cancellation reasons).
    pub notes: Option<String>,

    /// Line items. Never empty.
    pub items: Vec<OrderItem>,

    /// When the order was created.
    pub created_at: Timestamp,

    /// When the order was last updated.
    pub updated_at: Timestamp,
}

impl Order {
    /// Human-readable order number derived from the id.
    pub fn order_number(&self) -> String {
        let id = self.id.to_string();
        format!("ORD-{}", id[..8].to_uppercase())
    }

    /// Total number of units across all lines.
    pub fn total_units(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Cancels the whole order, cascading to every item.
    ///
    /// Only valid while nothing has shipped. The reason is recorded in the
    /// order notes.
    pub fn cancel(&mut self, reason: &str) -> Result<(), ValidationError> {
        if !self.status.can_be_cancelled() {
            return Err(ValidationError::invalid_format(
                "status",
                format!("order in status {:?} cannot be cancelled", self.status),
            ));
        }
        self.status = self.status.transition_to(OrderStatus::Cancelled)?;
        for item in &mut self.items {
            // Items that already reached a terminal state keep it.
            if item.status.can_transition_to(&ItemStatus::Cancelled) {
                item.status = ItemStatus::Cancelled;
            }
        }
        self.notes = Some(format!("Cancelled by customer. Reason: {}", reason));
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Applies a vendor's status change to one item, then recomputes the
    /// aggregate status. Returns the new aggregate status.
    pub fn apply_item_status(
        &mut self,
        item_id: OrderItemId,
        new_status: ItemStatus,
    ) -> Result<OrderStatus, ValidationError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| ValidationError::invalid_format("item_id", "no such item in order"))?;
        item.status = item.status.transition_to(new_status)?;

        let statuses: Vec<ItemStatus> = self.items.iter().map(|i| i.status).collect();
        self.status = aggregate_status(self.status, &statuses);
        self.updated_at = Timestamp::now();
        Ok(self.status)
    }
}
