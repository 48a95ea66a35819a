//! PostgreSQL implementation of CartRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::cart::{Cart, CartItem, CartState};
use crate::domain::foundation::{
    CartId, CartItemId, DomainError, ErrorCode, ProductId, Timestamp, UserId,
};
use crate::ports::CartRepository;

/// Partial unique index guarding one active cart per owner.
const ONE_ACTIVE_CART_CONSTRAINT: &str = "one_active_cart_per_owner";

/// PostgreSQL implementation of the CartRepository port.
pub struct PostgresCartRepository {
    pool: PgPool,
}

impl PostgresCartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, cart_id: &CartId) -> Result<Vec<CartItem>, DomainError> {
        let rows: Vec<CartItemRow> = sqlx::query_as(
            r#"
            SELECT id, product_id, quantity, added_at
            FROM cart_items
            WHERE cart_id = $1
            ORDER BY added_at
            "#,
        )
        .bind(cart_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(CartItem::try_from).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: Uuid,
    owner_id: String,
    state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: Uuid,
    product_id: Uuid,
    quantity: i32,
    added_at: DateTime<Utc>,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = DomainError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        Ok(CartItem {
            id: CartItemId::from_uuid(row.id),
            product_id: ProductId::from_uuid(row.product_id),
            quantity: u32::try_from(row.quantity)
                .map_err(|_| DomainError::database("negative quantity in cart_items"))?,
            added_at: Timestamp::from_datetime(row.added_at),
        })
    }
}

impl CartRow {
    fn into_cart(self, items: Vec<CartItem>) -> Result<Cart, DomainError> {
        Ok(Cart {
            id: CartId::from_uuid(self.id),
            owner: UserId::new(self.owner_id)
                .map_err(|e| DomainError::database(format!("invalid owner_id: {}", e)))?,
            state: parse_state(&self.state)?,
            items,
            created_at: Timestamp::from_datetime(self.created_at),
            updated_at: Timestamp::from_datetime(self.updated_at),
        })
    }
}

fn parse_state(s: &str) -> Result<CartState, DomainError> {
    match s {
        "ACTIVE" => Ok(CartState::Active),
        "SETTLED" => Ok(CartState::Settled),
        _ => Err(DomainError::database(format!("invalid cart state: {}", s))),
    }
}

pub(super) fn state_to_string(state: &CartState) -> &'static str {
    match state {
        CartState::Active => "ACTIVE",
        CartState::Settled => "SETTLED",
    }
}

fn db_error(err: sqlx::Error) -> DomainError {
    DomainError::database(format!("cart query failed: {}", err))
}

#[async_trait]
impl CartRepository for PostgresCartRepository {
    async fn find_by_id(&self, id: &CartId) -> Result<Option<Cart>, DomainError> {
        let row: Option<CartRow> = sqlx::query_as(
            r#"
            SELECT id, owner_id, state, created_at, updated_at
            FROM carts
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match row {
            Some(row) => {
                let items = self.load_items(id).await?;
                Ok(Some(row.into_cart(items)?))
            }
            None => Ok(None),
        }
    }

    async fn find_active_by_owner(&self, owner: &UserId) -> Result<Option<Cart>, DomainError> {
        let row: Option<CartRow> = sqlx::query_as(
            r#"
            SELECT id, owner_id, state, created_at, updated_at
            FROM carts
            WHERE owner_id = $1 AND state = 'ACTIVE'
            "#,
        )
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match row {
            Some(row) => {
                let id = CartId::from_uuid(row.id);
                let items = self.load_items(&id).await?;
                Ok(Some(row.into_cart(items)?))
            }
            None => Ok(None),
        }
    }

    async fn create(&self, cart: &Cart) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query(
            r#"
            INSERT INTO carts (id, owner_id, state, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(cart.id.as_uuid())
        .bind(cart.owner.as_str())
        .bind(state_to_string(&cart.state))
        .bind(cart.created_at.as_datetime())
        .bind(cart.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some(ONE_ACTIVE_CART_CONSTRAINT) {
                    return DomainError::new(
                        ErrorCode::ActiveCartExists,
                        format!("owner {} already has an active cart", cart.owner),
                    );
                }
            }
            db_error(e)
        })?;

        insert_items(&mut tx, cart).await?;
        tx.commit().await.map_err(db_error)
    }

    async fn update(&self, cart: &Cart) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let result = sqlx::query(
            r#"
            UPDATE carts SET state = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(cart.id.as_uuid())
        .bind(state_to_string(&cart.state))
        .bind(cart.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::CartNotFound,
                format!("cart {} not found", cart.id),
            ));
        }

        // Items are few per cart; replacing them wholesale keeps the
        // adapter free of per-line diffing.
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        insert_items(&mut tx, cart).await?;

        tx.commit().await.map_err(db_error)
    }
}

async fn insert_items(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    cart: &Cart,
) -> Result<(), DomainError> {
    for item in &cart.items {
        sqlx::query(
            r#"
            INSERT INTO cart_items (id, cart_id, product_id, quantity, added_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(cart.id.as_uuid())
        .bind(item.product_id.as_uuid())
        .bind(item.quantity as i32)
        .bind(item.added_at.as_datetime())
        .execute(&mut **tx)
        .await
        .map_err(db_error)?;
    }
    Ok(())
}
