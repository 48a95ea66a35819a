//! OrderRepository port - order reads and lifecycle updates.
//!
//! Order creation does not live here: orders are only ever born inside the
//! settlement transaction (see `SettlementStore`), never inserted on their
//! own.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OrderId, OrderItemId, UserId};
use crate::domain::order::{Order, OrderItem};

/// An order item paired with the id of the order that contains it.
#[derive(Debug, Clone)]
pub struct VendorItem {
    pub order_id: OrderId,
    pub item: OrderItem,
}

/// Port for reading and updating orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Loads an order with its items.
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError>;

    /// Looks up the order created for a gateway correlation id, if any.
    ///
    /// This is the duplicate-settlement guard: the correlation id is the
    /// only key consulted, never customer or amount coincidence.
    async fn find_by_correlation_id(
        &self,
        correlation_id: &str,
    ) -> Result<Option<Order>, DomainError>;

    /// A customer's orders, newest first.
    async fn list_for_customer(&self, customer: &UserId) -> Result<Vec<Order>, DomainError>;

    /// All items assigned to a vendor, newest order first.
    async fn list_items_for_vendor(&self, vendor: &UserId) -> Result<Vec<VendorItem>, DomainError>;

    /// Finds the order containing a given item.
    async fn find_containing_item(
        &self,
        item_id: &OrderItemId,
    ) -> Result<Option<Order>, DomainError>;

    /// Persists status, notes, and item changes of an existing order.
    async fn update(&self, order: &Order) -> Result<(), DomainError>;
}
