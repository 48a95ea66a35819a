//! PostgreSQL implementation of ProductCatalog.
//!
//! Read-only: the products table belongs to the catalog collaborator and
//! this adapter never writes to it.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::catalog::ProductSnapshot;
use crate::domain::foundation::{DomainError, Money, ProductId, UserId};
use crate::ports::ProductCatalog;

/// PostgreSQL implementation of the ProductCatalog port.
pub struct PostgresProductCatalog {
    pool: PgPool,
}

impl PostgresProductCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    title: String,
    price: Decimal,
    stock: i64,
    image_url: Option<String>,
    vendor_id: Option<String>,
}

impl TryFrom<ProductRow> for ProductSnapshot {
    type Error = DomainError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let vendor = row
            .vendor_id
            .map(UserId::new)
            .transpose()
            .map_err(|e| DomainError::database(format!("invalid vendor_id: {}", e)))?;
        Ok(ProductSnapshot {
            id: ProductId::from_uuid(row.id),
            title: row.title,
            unit_price: Money::new(row.price),
            stock: u64::try_from(row.stock)
                .map_err(|_| DomainError::database("negative stock in products"))?,
            image_url: row.image_url,
            vendor,
        })
    }
}

#[async_trait]
impl ProductCatalog for PostgresProductCatalog {
    async fn snapshot(&self, id: &ProductId) -> Result<Option<ProductSnapshot>, DomainError> {
        let row: Option<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, title, price, stock, image_url, vendor_id
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("product query failed: {}", e)))?;
        row.map(ProductSnapshot::try_from).transpose()
    }
}
