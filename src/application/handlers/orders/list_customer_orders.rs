//! ListCustomerOrdersHandler - a customer's order history with summary.

use std::sync::Arc;

use crate::domain::foundation::{Money, UserId};
use crate::domain::order::{Order, OrderError, OrderStatus};
use crate::ports::OrderRepository;

/// Summary statistics over a customer's orders.
#[derive(Debug, Clone)]
pub struct OrdersSummary {
    pub total_orders: usize,
    pub total_spent: Money,
    pub pending_orders: usize,
    pub shipped_orders: usize,
    pub delivered_orders: usize,
}

/// Orders newest-first plus summary.
#[derive(Debug, Clone)]
pub struct CustomerOrdersView {
    pub orders: Vec<Order>,
    pub summary: OrdersSummary,
}

/// Handler for the customer order list.
pub struct ListCustomerOrdersHandler {
    orders: Arc<dyn OrderRepository>,
}

impl ListCustomerOrdersHandler {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub async fn handle(
        &self,
        customer: &UserId,
        status_filter: Option<OrderStatus>,
    ) -> Result<CustomerOrdersView, OrderError> {
        let mut orders = self.orders.list_for_customer(customer).await?;

        // Cancelled and refunded orders do not count as money spent.
        let total_spent: Money = orders
            .iter()
            .filter(|o| !matches!(o.status, OrderStatus::Cancelled | OrderStatus::Refunded))
            .map(|o| o.total_price)
            .sum();
        let count = |status: OrderStatus| orders.iter().filter(|o| o.status == status).count();
        let summary = OrdersSummary {
            total_orders: orders.len(),
            total_spent,
            pending_orders: count(OrderStatus::Pending),
            shipped_orders: count(OrderStatus::Shipped),
            delivered_orders: count(OrderStatus::Delivered),
        };

        if let Some(filter) = status_filter {
            orders.retain(|o| o.status == filter);
        }

        Ok(CustomerOrdersView { orders, summary })
    }
}
