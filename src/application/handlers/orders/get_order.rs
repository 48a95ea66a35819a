//! GetOrderHandler - single order detail, customer- or vendor-scoped.

use std::sync::Arc;

use crate::domain::foundation::{OrderId, UserId};
use crate::domain::order::{Order, OrderError};
use crate::ports::OrderRepository;

/// Query for one order.
#[derive(Debug, Clone)]
pub struct GetOrderQuery {
    pub order_id: OrderId,
    pub requester: UserId,
    /// Vendors may view orders that contain their items; customers only
    /// their own orders.
    pub as_vendor: bool,
}

/// Handler for order detail.
pub struct GetOrderHandler {
    orders: Arc<dyn OrderRepository>,
}

impl GetOrderHandler {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub async fn handle(&self, query: GetOrderQuery) -> Result<Order, OrderError> {
        let order = self
            .orders
            .find_by_id(&query.order_id)
            .await?
            .ok_or(OrderError::NotFound(query.order_id))?;

        let visible = if query.as_vendor {
            order
                .items
                .iter()
                .any(|i| i.vendor.as_ref() == Some(&query.requester))
        } else {
            order.customer == query.requester
        };

        if !visible {
            // Indistinguishable from a missing order on purpose.
            return Err(OrderError::NotFound(query.order_id));
        }

        Ok(order)
    }
}
