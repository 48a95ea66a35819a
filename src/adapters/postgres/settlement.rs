//! PostgreSQL implementation of SettlementStore.
//!
//! The whole cart-to-order transition is one transaction:
//!
//! 1. compare-and-swap the attempt `PENDING -> SUCCESS` (with receipt)
//! 2. insert the order and its items
//! 3. flip the cart `ACTIVE -> SETTLED`
//!
//! Step 1 affecting zero rows means another delivery already settled this
//! attempt; the transaction rolls back having written nothing.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{SettlementCommit, SettlementOutcome, SettlementStore};

use super::order_repository::insert_order;

/// PostgreSQL implementation of the SettlementStore port.
pub struct PostgresSettlementStore {
    pool: PgPool,
}

impl PostgresSettlementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(err: sqlx::Error) -> DomainError {
    DomainError::database(format!("settlement failed: {}", err))
}

#[async_trait]
impl SettlementStore for PostgresSettlementStore {
    async fn commit(&self, commit: SettlementCommit) -> Result<SettlementOutcome, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let swapped = sqlx::query(
            r#"
            UPDATE checkout_attempts
            SET status = 'SUCCESS', receipt = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(commit.attempt_id.as_uuid())
        .bind(&commit.receipt)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if swapped.rows_affected() == 0 {
            // Lost the race (or the attempt is long terminal). Nothing to
            // roll back; the transaction wrote nothing.
            return Ok(SettlementOutcome::AlreadySettled);
        }

        insert_order(&mut tx, &commit.order).await?;

        let settled = sqlx::query(
            r#"
            UPDATE carts
            SET state = 'SETTLED', updated_at = NOW()
            WHERE id = $1 AND state = 'ACTIVE'
            "#,
        )
        .bind(commit.cart_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if settled.rows_affected() == 0 {
            // A pending attempt against a settled cart cannot reach this
            // point through the engine; a schema-level surprise is better
            // aborted than papered over.
            return Err(DomainError::new(
                ErrorCode::CartSettled,
                format!("cart {} was not active at settlement", commit.cart_id),
            ));
        }

        tx.commit().await.map_err(db_error)?;
        Ok(SettlementOutcome::Committed)
    }
}
