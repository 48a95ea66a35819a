//! PostgreSQL implementation of OrderRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, Money, OrderId, OrderItemId, PhoneNumber, ProductId, Timestamp,
    UserId,
};
use crate::domain::order::{ItemStatus, Order, OrderItem, OrderStatus};
use crate::ports::{OrderRepository, VendorItem};

/// PostgreSQL implementation of the OrderRepository port.
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_order(&self, row: OrderRow) -> Result<Order, DomainError> {
        let id = OrderId::from_uuid(row.id);
        let items = self.load_items(&id).await?;
        row.into_order(items)
    }

    async fn load_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, DomainError> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(&format!(
            "{} WHERE order_id = $1 ORDER BY product_name",
            ITEM_COLUMNS
        ))
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.into_iter().map(OrderItem::try_from).collect()
    }
}

const ORDER_COLUMNS: &str = r#"
    SELECT id, customer_id, total_price, status, checkout_request_id,
           phone_number, delivery_address, notes, created_at, updated_at
    FROM orders
"#;

const ITEM_COLUMNS: &str = r#"
    SELECT id, order_id, product_id, product_name, product_image,
           quantity, unit_price, subtotal, vendor_id, status
    FROM order_items
"#;

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    customer_id: String,
    total_price: Decimal,
    status: String,
    checkout_request_id: Option<String>,
    phone_number: Option<String>,
    delivery_address: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Option<Uuid>,
    product_name: String,
    product_image: Option<String>,
    quantity: i32,
    unit_price: Decimal,
    subtotal: Decimal,
    vendor_id: Option<String>,
    status: String,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, DomainError> {
        let phone_number = self
            .phone_number
            .as_deref()
            .map(PhoneNumber::new)
            .transpose()
            .map_err(|e| DomainError::database(format!("invalid phone_number: {}", e)))?;
        Ok(Order {
            id: OrderId::from_uuid(self.id),
            customer: UserId::new(self.customer_id)
                .map_err(|e| DomainError::database(format!("invalid customer_id: {}", e)))?,
            total_price: Money::new(self.total_price),
            status: parse_order_status(&self.status)?,
            checkout_request_id: self.checkout_request_id,
            phone_number,
            delivery_address: self.delivery_address,
            notes: self.notes,
            items,
            created_at: Timestamp::from_datetime(self.created_at),
            updated_at: Timestamp::from_datetime(self.updated_at),
        })
    }
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = DomainError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let vendor = row
            .vendor_id
            .map(UserId::new)
            .transpose()
            .map_err(|e| DomainError::database(format!("invalid vendor_id: {}", e)))?;
        Ok(OrderItem {
            id: OrderItemId::from_uuid(row.id),
            product_id: row.product_id.map(ProductId::from_uuid),
            product_name: row.product_name,
            product_image: row.product_image,
            quantity: u32::try_from(row.quantity)
                .map_err(|_| DomainError::database("negative quantity in order_items"))?,
            unit_price: Money::new(row.unit_price),
            subtotal: Money::new(row.subtotal),
            vendor,
            status: parse_item_status(&row.status)?,
        })
    }
}

fn parse_order_status(s: &str) -> Result<OrderStatus, DomainError> {
    match s {
        "PENDING" => Ok(OrderStatus::Pending),
        "PAID" => Ok(OrderStatus::Paid),
        "PROCESSING" => Ok(OrderStatus::Processing),
        "SHIPPED" => Ok(OrderStatus::Shipped),
        "DELIVERED" => Ok(OrderStatus::Delivered),
        "CANCELLED" => Ok(OrderStatus::Cancelled),
        "REFUNDED" => Ok(OrderStatus::Refunded),
        _ => Err(DomainError::database(format!("invalid order status: {}", s))),
    }
}

fn parse_item_status(s: &str) -> Result<ItemStatus, DomainError> {
    match s {
        "PENDING" => Ok(ItemStatus::Pending),
        "PAID" => Ok(ItemStatus::Paid),
        "PROCESSING" => Ok(ItemStatus::Processing),
        "SHIPPED" => Ok(ItemStatus::Shipped),
        "DELIVERED" => Ok(ItemStatus::Delivered),
        "CANCELLED" => Ok(ItemStatus::Cancelled),
        "REFUNDED" => Ok(ItemStatus::Refunded),
        _ => Err(DomainError::database(format!("invalid item status: {}", s))),
    }
}

pub(super) fn order_status_to_string(status: &OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "PENDING",
        OrderStatus::Paid => "PAID",
        OrderStatus::Processing => "PROCESSING",
        OrderStatus::Shipped => "SHIPPED",
        OrderStatus::Delivered => "DELIVERED",
        OrderStatus::Cancelled => "CANCELLED",
        OrderStatus::Refunded => "REFUNDED",
    }
}

pub(super) fn item_status_to_string(status: &ItemStatus) -> &'static str {
    match status {
        ItemStatus::Pending => "PENDING",
        ItemStatus::Paid => "PAID",
        ItemStatus::Processing => "PROCESSING",
        ItemStatus::Shipped => "SHIPPED",
        ItemStatus::Delivered => "DELIVERED",
        ItemStatus::Cancelled => "CANCELLED",
        ItemStatus::Refunded => "REFUNDED",
    }
}

fn db_error(err: sqlx::Error) -> DomainError {
    DomainError::database(format!("order query failed: {}", err))
}

/// Inserts an order and its items inside an open transaction.
///
/// Shared with the settlement store, which is the only place new orders
/// come from.
pub(super) async fn insert_order(
    tx: &mut Transaction<'_, Postgres>,
    order: &Order,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO orders (
            id, customer_id, total_price, status, checkout_request_id,
            phone_number, delivery_address, notes, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(order.id.as_uuid())
    .bind(order.customer.as_str())
    .bind(order.total_price.amount())
    .bind(order_status_to_string(&order.status))
    .bind(&order.checkout_request_id)
    .bind(order.phone_number.as_ref().map(|p| p.as_str()))
    .bind(&order.delivery_address)
    .bind(&order.notes)
    .bind(order.created_at.as_datetime())
    .bind(order.updated_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(db_error)?;

    for item in &order.items {
        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, product_id, product_name, product_image,
                quantity, unit_price, subtotal, vendor_id, status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(order.id.as_uuid())
        .bind(item.product_id.as_ref().map(|p| p.as_uuid()))
        .bind(&item.product_name)
        .bind(&item.product_image)
        .bind(item.quantity as i32)
        .bind(item.unit_price.amount())
        .bind(item.subtotal.amount())
        .bind(item.vendor.as_ref().map(|v| v.as_str()))
        .bind(item_status_to_string(&item.status))
        .execute(&mut **tx)
        .await
        .map_err(db_error)?;
    }
    Ok(())
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!("{} WHERE id = $1", ORDER_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        match row {
            Some(row) => Ok(Some(self.load_order(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_correlation_id(
        &self,
        correlation_id: &str,
    ) -> Result<Option<Order>, DomainError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("{} WHERE checkout_request_id = $1", ORDER_COLUMNS))
                .bind(correlation_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
        match row {
            Some(row) => Ok(Some(self.load_order(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_for_customer(&self, customer: &UserId) -> Result<Vec<Order>, DomainError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "{} WHERE customer_id = $1 ORDER BY created_at DESC",
            ORDER_COLUMNS
        ))
        .bind(customer.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(self.load_order(row).await?);
        }
        Ok(orders)
    }

    async fn list_items_for_vendor(&self, vendor: &UserId) -> Result<Vec<VendorItem>, DomainError> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(&format!(
            r#"{} WHERE vendor_id = $1
               ORDER BY (SELECT created_at FROM orders WHERE orders.id = order_items.order_id) DESC"#,
            ITEM_COLUMNS
        ))
        .bind(vendor.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter()
            .map(|row| {
                let order_id = OrderId::from_uuid(row.order_id);
                Ok(VendorItem {
                    order_id,
                    item: OrderItem::try_from(row)?,
                })
            })
            .collect()
    }

    async fn find_containing_item(
        &self,
        item_id: &OrderItemId,
    ) -> Result<Option<Order>, DomainError> {
        let row: Option<(Uuid,)> =
            sqlx::query_as("SELECT order_id FROM order_items WHERE id = $1")
                .bind(item_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
        match row {
            Some((order_id,)) => self.find_by_id(&OrderId::from_uuid(order_id)).await,
            None => Ok(None),
        }
    }

    async fn update(&self, order: &Order) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, notes = $3, delivery_address = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order_status_to_string(&order.status))
        .bind(&order.notes)
        .bind(&order.delivery_address)
        .bind(order.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::OrderNotFound,
                format!("order {} not found", order.id),
            ));
        }

        for item in &order.items {
            sqlx::query("UPDATE order_items SET status = $2 WHERE id = $1")
                .bind(item.id.as_uuid())
                .bind(item_status_to_string(&item.status))
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)
    }
}
