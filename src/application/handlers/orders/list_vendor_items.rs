//! ListVendorItemsHandler - a vendor's fulfilment queue with summary.

use std::sync::Arc;

use crate::domain::foundation::{Money, UserId};
use crate::domain::order::{ItemStatus, OrderError};
use crate::ports::{OrderRepository, VendorItem};

/// Revenue and per-status counts over a vendor's items.
#[derive(Debug, Clone)]
pub struct VendorItemsSummary {
    pub total_items: usize,
    pub total_revenue: Money,
    pub paid_items: usize,
    pub processing_items: usize,
    pub shipped_items: usize,
    pub delivered_items: usize,
}

/// Vendor items plus summary.
#[derive(Debug, Clone)]
pub struct VendorItemsView {
    pub items: Vec<VendorItem>,
    pub summary: VendorItemsSummary,
}

/// Handler for the vendor item list.
pub struct ListVendorItemsHandler {
    orders: Arc<dyn OrderRepository>,
}

impl ListVendorItemsHandler {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub async fn handle(
        &self,
        vendor: &UserId,
        status_filter: Option<ItemStatus>,
    ) -> Result<VendorItemsView, OrderError> {
        let mut items = self.orders.list_items_for_vendor(vendor).await?;

        // Cancelled and refunded lines earn nothing.
        let total_revenue: Money = items
            .iter()
            .filter(|v| !matches!(v.item.status, ItemStatus::Cancelled | ItemStatus::Refunded))
            .map(|v| v.item.subtotal)
            .sum();
        let count = |status: ItemStatus| {
            items.iter().filter(|v| v.item.status == status).count()
        };
        let summary = VendorItemsSummary {
            total_items: items.len(),
            total_revenue,
            paid_items: count(ItemStatus::Paid),
            processing_items: count(ItemStatus::Processing),
            shipped_items: count(ItemStatus::Shipped),
            delivered_items: count(ItemStatus::Delivered),
        };

        if let Some(filter) = status_filter {
            items.retain(|v| v.item.status == filter);
        }

        Ok(VendorItemsView { items, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBackend;
    use crate::domain::foundation::{OrderId, OrderItemId, ProductId, Timestamp};
    use crate::domain::order::{Order, OrderItem, OrderStatus};
    use rust_decimal_macros::dec;

    fn vendor() -> UserId {
        UserId::new("vendor-1").unwrap()
    }

    fn item(vendor_id: &UserId, status: ItemStatus, subtotal: Money) -> OrderItem {
        OrderItem {
            id: OrderItemId::new(),
            product_id: Some(ProductId::new()),
            product_name: "Macadamia Pack".to_string(),
            product_image: None,
            quantity: 1,
            unit_price: subtotal,
            subtotal,
            vendor: Some(vendor_id.clone()),
            status,
        }
    }

    fn order(items: Vec<OrderItem>) -> Order {
        let now = Timestamp::now();
        Order {
            id: OrderId::new(),
            customer: UserId::new("customer-1").unwrap(),
            total_price: items.iter().map(|i| i.subtotal).sum(),
            status: OrderStatus::Paid,
            checkout_request_id: None,
            phone_number: None,
            delivery_address: None,
            notes: None,
            items,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn collects_items_across_orders_with_revenue() {
        let backend = Arc::new(InMemoryBackend::new());
        let v = vendor();
        backend
            .insert_order(order(vec![
                item(&v, ItemStatus::Paid, Money::new(dec!(10.00))),
                item(
                    &UserId::new("vendor-2").unwrap(),
                    ItemStatus::Paid,
                    Money::new(dec!(99.00)),
                ),
            ]))
            .await;
        backend
            .insert_order(order(vec![
                item(&v, ItemStatus::Delivered, Money::new(dec!(15.00))),
                item(&v, ItemStatus::Cancelled, Money::new(dec!(40.00))),
            ]))
            .await;

        let handler = ListVendorItemsHandler::new(backend);
        let view = handler.handle(&v, None).await.unwrap();

        assert_eq!(view.summary.total_items, 3);
        assert_eq!(view.summary.total_revenue, Money::new(dec!(25.00)));
        assert_eq!(view.summary.paid_items, 1);
        assert_eq!(view.summary.delivered_items, 1);
    }

    #[tokio::test]
    async fn status_filter_narrows_items() {
        let backend = Arc::new(InMemoryBackend::new());
        let v = vendor();
        backend
            .insert_order(order(vec![
                item(&v, ItemStatus::Paid, Money::new(dec!(10.00))),
                item(&v, ItemStatus::Shipped, Money::new(dec!(15.00))),
            ]))
            .await;

        let handler = ListVendorItemsHandler::new(backend);
        let view = handler.handle(&v, Some(ItemStatus::Shipped)).await.unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.summary.total_items, 2);
    }
}
