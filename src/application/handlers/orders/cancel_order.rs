//! CancelOrderHandler - customer-initiated order cancellation.

use std::sync::Arc;

use crate::domain::foundation::{OrderId, UserId};
use crate::domain::order::{Order, OrderError};
use crate::ports::OrderRepository;

/// Command to cancel an order.
#[derive(Debug, Clone)]
pub struct CancelOrderCommand {
    pub order_id: OrderId,
    pub customer: UserId,
    pub reason: String,
}

/// Handler for order cancellation.
///
/// Cancellation is only permitted while the order is Pending, Paid, or
/// Processing; once anything ships the customer must go through returns.
/// All items cascade to Cancelled.
pub struct CancelOrderHandler {
    orders: Arc<dyn OrderRepository>,
}

impl CancelOrderHandler {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub async fn handle(&self, cmd: CancelOrderCommand) -> Result<Order, OrderError> {
        let mut order = self
            .orders
            .find_by_id(&cmd.order_id)
            .await?
            .ok_or(OrderError::NotFound(cmd.order_id))?;

        if order.customer != cmd.customer {
            return Err(OrderError::Forbidden);
        }

        if !order.status.can_be_cancelled() {
            return Err(OrderError::CannotCancel {
                status: order.status,
            });
        }

        order.cancel(&cmd.reason)?;
        self.orders.update(&order).await?;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBackend;
    use crate::domain::foundation::{Money, OrderItemId, PhoneNumber, ProductId, Timestamp};
    use crate::domain::order::{ItemStatus, OrderItem, OrderStatus};
    use rust_decimal_macros::dec;

    fn customer() -> UserId {
        UserId::new("customer-1").unwrap()
    }

    fn paid_order(status: OrderStatus) -> Order {
        let now = Timestamp::now();
        Order {
            id: OrderId::new(),
            customer: customer(),
            total_price: Money::new(dec!(25.00)),
            status,
            checkout_request_id: Some("ws_CO_1".to_string()),
            phone_number: Some(PhoneNumber::new("254700000000").unwrap()),
            delivery_address: None,
            notes: None,
            items: vec![OrderItem {
                id: OrderItemId::new(),
                product_id: Some(ProductId::new()),
                product_name: "Honey Jar".to_string(),
                product_image: None,
                quantity: 1,
                unit_price: Money::new(dec!(25.00)),
                subtotal: Money::new(dec!(25.00)),
                vendor: None,
                status: ItemStatus::Paid,
            }],
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn cancels_paid_order_with_reason() {
        let backend = Arc::new(InMemoryBackend::new());
        let order = paid_order(OrderStatus::Paid);
        let order_id = order.id;
        backend.insert_order(order).await;

        let handler = CancelOrderHandler::new(backend.clone());
        let cancelled = handler
            .handle(CancelOrderCommand {
                order_id,
                customer: customer(),
                reason: "ordered twice".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert!(cancelled.items.iter().all(|i| i.status == ItemStatus::Cancelled));
        assert!(cancelled.notes.as_deref().unwrap().contains("ordered twice"));

        let stored = backend.find_order(&order_id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn shipped_order_cannot_be_cancelled() {
        let backend = Arc::new(InMemoryBackend::new());
        let order = paid_order(OrderStatus::Shipped);
        let order_id = order.id;
        backend.insert_order(order).await;

        let handler = CancelOrderHandler::new(backend);
        let result = handler
            .handle(CancelOrderCommand {
                order_id,
                customer: customer(),
                reason: "too late".to_string(),
            })
            .await;
        assert!(matches!(
            result,
            Err(OrderError::CannotCancel { status: OrderStatus::Shipped })
        ));
    }

    #[tokio::test]
    async fn foreign_order_is_forbidden() {
        let backend = Arc::new(InMemoryBackend::new());
        let order = paid_order(OrderStatus::Paid);
        let order_id = order.id;
        backend.insert_order(order).await;

        let handler = CancelOrderHandler::new(backend);
        let result = handler
            .handle(CancelOrderCommand {
                order_id,
                customer: UserId::new("customer-2").unwrap(),
                reason: "not mine".to_string(),
            })
            .await;
        assert!(matches!(result, Err(OrderError::Forbidden)));
    }

    #[tokio::test]
    async fn missing_order_is_not_found() {
        let backend = Arc::new(InMemoryBackend::new());
        let handler = CancelOrderHandler::new(backend);
        let result = handler
            .handle(CancelOrderCommand {
                order_id: OrderId::new(),
                customer: customer(),
                reason: "x".to_string(),
            })
            .await;
        assert!(matches!(result, Err(OrderError::NotFound(_))));
    }
}
