//! PostgreSQL implementation of CheckoutAttemptRepository.
//!
//! ## Race Condition Handling
//!
//! `record_new_attempt` locks the parent cart row, so two concurrent
//! initiations for one cart serialize: the second sees the first's
//! attempt, numbers itself after it, and deactivates it. The terminal
//! transitions are single-statement compare-and-swaps on
//! `status = 'PENDING'`; whoever loses the race affects zero rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::checkout::{AttemptStatus, CheckoutAttempt};
use crate::domain::foundation::{
    CartId, CheckoutId, DomainError, ErrorCode, Money, PhoneNumber, Timestamp,
};
use crate::ports::{CheckoutAttemptRepository, NewAttempt, TransitionOutcome};

/// Unique index guarding global correlation-id uniqueness.
const CORRELATION_ID_CONSTRAINT: &str = "checkout_attempts_checkout_request_id_key";

/// PostgreSQL implementation of the CheckoutAttemptRepository port.
pub struct PostgresCheckoutAttemptRepository {
    pool: PgPool,
}

impl PostgresCheckoutAttemptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AttemptRow {
    id: Uuid,
    cart_id: Uuid,
    phone: String,
    amount: Decimal,
    checkout_request_id: Option<String>,
    status: String,
    attempt_number: i32,
    is_active: bool,
    receipt: Option<String>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AttemptRow> for CheckoutAttempt {
    type Error = DomainError;

    fn try_from(row: AttemptRow) -> Result<Self, Self::Error> {
        Ok(CheckoutAttempt {
            id: CheckoutId::from_uuid(row.id),
            cart_id: CartId::from_uuid(row.cart_id),
            phone: PhoneNumber::new(&row.phone)
                .map_err(|e| DomainError::database(format!("invalid phone: {}", e)))?,
            amount: Money::new(row.amount),
            checkout_request_id: row.checkout_request_id,
            status: parse_status(&row.status)?,
            attempt_number: u32::try_from(row.attempt_number)
                .map_err(|_| DomainError::database("negative attempt_number"))?,
            is_active: row.is_active,
            receipt: row.receipt,
            error_message: row.error_message,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_status(s: &str) -> Result<AttemptStatus, DomainError> {
    match s {
        "PENDING" => Ok(AttemptStatus::Pending),
        "SUCCESS" => Ok(AttemptStatus::Success),
        "FAILED" => Ok(AttemptStatus::Failed),
        _ => Err(DomainError::database(format!(
            "invalid attempt status: {}",
            s
        ))),
    }
}

fn db_error(err: sqlx::Error) -> DomainError {
    DomainError::database(format!("checkout attempt query failed: {}", err))
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, cart_id, phone, amount, checkout_request_id, status,
           attempt_number, is_active, receipt, error_message,
           created_at, updated_at
    FROM checkout_attempts
"#;

async fn fetch_by_id(
    tx: &mut Transaction<'_, Postgres>,
    id: &CheckoutId,
) -> Result<Option<CheckoutAttempt>, DomainError> {
    let row: Option<AttemptRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_COLUMNS))
        .bind(id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_error)?;
    row.map(CheckoutAttempt::try_from).transpose()
}

#[async_trait]
impl CheckoutAttemptRepository for PostgresCheckoutAttemptRepository {
    async fn record_new_attempt(&self, input: NewAttempt) -> Result<CheckoutAttempt, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // Serialize per cart: everyone initiating this cart queues here.
        let locked: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM carts WHERE id = $1 FOR UPDATE")
            .bind(input.cart_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?;
        if locked.is_none() {
            return Err(DomainError::new(
                ErrorCode::CartNotFound,
                format!("cart {} not found", input.cart_id),
            ));
        }

        let (next_number,): (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(attempt_number), 0) + 1 FROM checkout_attempts WHERE cart_id = $1",
        )
        .bind(input.cart_id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        sqlx::query(
            r#"
            UPDATE checkout_attempts
            SET is_active = FALSE, updated_at = NOW()
            WHERE cart_id = $1 AND is_active = TRUE
            "#,
        )
        .bind(input.cart_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        let mut attempt = CheckoutAttempt::new(input.cart_id, input.phone, input.amount);
        attempt.attempt_number = next_number as u32;

        sqlx::query(
            r#"
            INSERT INTO checkout_attempts (
                id, cart_id, phone, amount, checkout_request_id, status,
                attempt_number, is_active, receipt, error_message,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, NULL, 'PENDING', $5, TRUE, NULL, NULL, $6, $7)
            "#,
        )
        .bind(attempt.id.as_uuid())
        .bind(attempt.cart_id.as_uuid())
        .bind(attempt.phone.as_str())
        .bind(attempt.amount.amount())
        .bind(attempt.attempt_number as i32)
        .bind(attempt.created_at.as_datetime())
        .bind(attempt.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(attempt)
    }

    async fn assign_correlation_id(
        &self,
        attempt_id: &CheckoutId,
        correlation_id: &str,
    ) -> Result<CheckoutAttempt, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let result = sqlx::query(
            r#"
            UPDATE checkout_attempts
            SET checkout_request_id = $2, updated_at = NOW()
            WHERE id = $1 AND checkout_request_id IS NULL
            "#,
        )
        .bind(attempt_id.as_uuid())
        .bind(correlation_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some(CORRELATION_ID_CONSTRAINT) {
                    return DomainError::new(
                        ErrorCode::DuplicateCorrelationId,
                        format!("correlation id {} already assigned", correlation_id),
                    );
                }
            }
            db_error(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::AttemptNotFound,
                format!("attempt {} not found or already correlated", attempt_id),
            ));
        }

        let attempt = fetch_by_id(&mut tx, attempt_id).await?.ok_or_else(|| {
            DomainError::database("attempt vanished inside its own transaction")
        })?;
        tx.commit().await.map_err(db_error)?;
        Ok(attempt)
    }

    async fn find_by_correlation_id(
        &self,
        correlation_id: &str,
    ) -> Result<Option<CheckoutAttempt>, DomainError> {
        let row: Option<AttemptRow> =
            sqlx::query_as(&format!("{} WHERE checkout_request_id = $1", SELECT_COLUMNS))
                .bind(correlation_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
        row.map(CheckoutAttempt::try_from).transpose()
    }

    async fn find_by_id(&self, id: &CheckoutId) -> Result<Option<CheckoutAttempt>, DomainError> {
        let row: Option<AttemptRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.map(CheckoutAttempt::try_from).transpose()
    }

    async fn list_for_cart(&self, cart_id: &CartId) -> Result<Vec<CheckoutAttempt>, DomainError> {
        let rows: Vec<AttemptRow> = sqlx::query_as(&format!(
            "{} WHERE cart_id = $1 ORDER BY attempt_number DESC",
            SELECT_COLUMNS
        ))
        .bind(cart_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.into_iter().map(CheckoutAttempt::try_from).collect()
    }

    async fn has_successful(&self, cart_id: &CartId) -> Result<bool, DomainError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM checkout_attempts WHERE cart_id = $1 AND status = 'SUCCESS')",
        )
        .bind(cart_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(exists)
    }

    async fn mark_failed(
        &self,
        attempt_id: &CheckoutId,
        error: &str,
    ) -> Result<TransitionOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE checkout_attempts
            SET status = 'FAILED', error_message = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(attempt_id.as_uuid())
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 1 {
            return Ok(TransitionOutcome::Applied);
        }
        self.resolve_zero_row_transition(attempt_id).await
    }

    async fn mark_succeeded(
        &self,
        attempt_id: &CheckoutId,
        receipt: Option<&str>,
    ) -> Result<TransitionOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE checkout_attempts
            SET status = 'SUCCESS', receipt = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(attempt_id.as_uuid())
        .bind(receipt)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 1 {
            return Ok(TransitionOutcome::Applied);
        }
        self.resolve_zero_row_transition(attempt_id).await
    }
}

impl PostgresCheckoutAttemptRepository {
    /// Zero rows from a CAS means terminal or missing; tell them apart.
    async fn resolve_zero_row_transition(
        &self,
        attempt_id: &CheckoutId,
    ) -> Result<TransitionOutcome, DomainError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT status FROM checkout_attempts WHERE id = $1")
                .bind(attempt_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
        match row {
            Some(_) => Ok(TransitionOutcome::AlreadyTerminal),
            None => Err(DomainError::new(
                ErrorCode::AttemptNotFound,
                format!("attempt {} not found", attempt_id),
            )),
        }
    }
}
