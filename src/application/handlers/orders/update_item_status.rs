//! UpdateItemStatusHandler - vendor-driven fulfilment updates.

use std::sync::Arc;

use crate::domain::foundation::{OrderItemId, UserId};
use crate::domain::order::{ItemStatus, OrderError, OrderItem, OrderStatus};
use crate::ports::OrderRepository;

/// Statuses a vendor may set directly.
const VENDOR_SETTABLE: [ItemStatus; 4] = [
    ItemStatus::Processing,
    ItemStatus::Shipped,
    ItemStatus::Delivered,
    ItemStatus::Cancelled,
];

/// Command to move one order item through fulfilment.
#[derive(Debug, Clone)]
pub struct UpdateItemStatusCommand {
    pub item_id: OrderItemId,
    pub vendor: UserId,
    pub new_status: ItemStatus,
}

/// Result of an item status update.
#[derive(Debug, Clone)]
pub struct UpdateItemStatusResult {
    pub item: OrderItem,
    /// The order's aggregate status after recomputation.
    pub order_status: OrderStatus,
}

/// Handler for vendor item status updates.
///
/// After every change the parent order's status is recomputed from all of
/// its items, so an order whose last item is delivered flips to Delivered
/// without any separate bookkeeping.
pub struct UpdateItemStatusHandler {
    orders: Arc<dyn OrderRepository>,
}

impl UpdateItemStatusHandler {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub async fn handle(
        &self,
        cmd: UpdateItemStatusCommand,
    ) -> Result<UpdateItemStatusResult, OrderError> {
        if !VENDOR_SETTABLE.contains(&cmd.new_status) {
            return Err(OrderError::InvalidStatus(format!("{:?}", cmd.new_status)));
        }

        let mut order = self
            .orders
            .find_containing_item(&cmd.item_id)
            .await?
            .ok_or(OrderError::ItemNotFound(cmd.item_id))?;

        let item_vendor = order
            .items
            .iter()
            .find(|i| i.id == cmd.item_id)
            .and_then(|i| i.vendor.clone());
        if item_vendor.as_ref() != Some(&cmd.vendor) {
            return Err(OrderError::Forbidden);
        }

        let order_status = order.apply_item_status(cmd.item_id, cmd.new_status)?;
        self.orders.update(&order).await?;

        let item = order
            .items
            .into_iter()
            .find(|i| i.id == cmd.item_id)
            .ok_or(OrderError::ItemNotFound(cmd.item_id))?;

        Ok(UpdateItemStatusResult { item, order_status })
    }
}
