//! HTTP DTOs for order endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::orders::{
    CustomerOrdersView, UpdateItemStatusResult, VendorItemsView,
};
use crate::domain::foundation::Money;
use crate::domain::order::{ItemStatus, Order, OrderItem, OrderStatus};
use crate::ports::VendorItem;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to cancel an order.
#[derive(Debug, Clone, Deserialize)]
pub struct CancelOrderRequest {
    #[serde(default)]
    pub reason: String,
}

/// Request to move an order item through fulfilment.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateItemStatusRequest {
    pub status: ItemStatus,
}

/// Query string for order listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<OrderStatus>,
}

/// Query string for vendor item listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VendorItemsQuery {
    pub status: Option<ItemStatus>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// One order item as served to clients.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemResponse {
    pub id: String,
    pub order_id: Option<String>,
    pub product_id: Option<String>,
    pub product_name: String,
    pub product_image: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
    pub status: ItemStatus,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id.to_string(),
            order_id: None,
            product_id: item.product_id.map(|p| p.to_string()),
            product_name: item.product_name,
            product_image: item.product_image,
            quantity: item.quantity,
            unit_price: item.unit_price,
            subtotal: item.subtotal,
            status: item.status,
        }
    }
}

impl From<VendorItem> for OrderItemResponse {
    fn from(v: VendorItem) -> Self {
        let mut response = OrderItemResponse::from(v.item);
        response.order_id = Some(v.order_id.to_string());
        response
    }
}

/// One order as served to clients.
#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_price: Money,
    pub total_items: u32,
    pub checkout_request_id: Option<String>,
    pub phone_number: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderItemResponse>,
    pub created_at: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            order_number: order.order_number(),
            status: order.status,
            total_price: order.total_price,
            total_items: order.total_units(),
            checkout_request_id: order.checkout_request_id.clone(),
            phone_number: order.phone_number.as_ref().map(|p| p.to_string()),
            notes: order.notes.clone(),
            items: order.items.into_iter().map(Into::into).collect(),
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

/// Customer order list with summary.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerOrdersResponse {
    pub orders: Vec<OrderResponse>,
    pub summary: OrdersSummaryResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrdersSummaryResponse {
    pub total_orders: usize,
    pub total_spent: Money,
    pub pending_orders: usize,
    pub shipped_orders: usize,
    pub delivered_orders: usize,
}

impl From<CustomerOrdersView> for CustomerOrdersResponse {
    fn from(view: CustomerOrdersView) -> Self {
        Self {
            orders: view.orders.into_iter().map(Into::into).collect(),
            summary: OrdersSummaryResponse {
                total_orders: view.summary.total_orders,
                total_spent: view.summary.total_spent,
                pending_orders: view.summary.pending_orders,
                shipped_orders: view.summary.shipped_orders,
                delivered_orders: view.summary.delivered_orders,
            },
        }
    }
}

/// Vendor item list with summary.
#[derive(Debug, Clone, Serialize)]
pub struct VendorItemsResponse {
    pub order_items: Vec<OrderItemResponse>,
    pub summary: VendorItemsSummaryResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct VendorItemsSummaryResponse {
    pub total_items: usize,
    pub total_revenue: Money,
    pub paid_items: usize,
    pub processing_items: usize,
    pub shipped_items: usize,
    pub delivered_items: usize,
}

impl From<VendorItemsView> for VendorItemsResponse {
    fn from(view: VendorItemsView) -> Self {
        Self {
            order_items: view.items.into_iter().map(Into::into).collect(),
            summary: VendorItemsSummaryResponse {
                total_items: view.summary.total_items,
                total_revenue: view.summary.total_revenue,
                paid_items: view.summary.paid_items,
                processing_items: view.summary.processing_items,
                shipped_items: view.summary.shipped_items,
                delivered_items: view.summary.delivered_items,
            },
        }
    }
}

/// Result of a vendor item status update.
#[derive(Debug, Clone, Serialize)]
pub struct ItemStatusUpdateResponse {
    pub message: String,
    pub order_item: OrderItemResponse,
    pub order_status: OrderStatus,
}

impl From<UpdateItemStatusResult> for ItemStatusUpdateResponse {
    fn from(result: UpdateItemStatusResult) -> Self {
        Self {
            message: format!("Order item status updated to {:?}", result.item.status),
            order_item: result.item.into(),
            order_status: result.order_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_query_parses_wire_values() {
        let query: OrdersQuery = serde_json::from_str(r#"{"status": "SHIPPED"}"#).unwrap();
        assert_eq!(query.status, Some(OrderStatus::Shipped));
    }

    #[test]
    fn item_status_request_rejects_unknown_values() {
        let result = serde_json::from_str::<UpdateItemStatusRequest>(r#"{"status": "TELEPORTED"}"#);
        assert!(result.is_err());
    }
}
