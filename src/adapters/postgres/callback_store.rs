//! PostgreSQL implementation of CallbackRecordStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::checkout::CallbackRecord;
use crate::domain::foundation::{CheckoutId, DomainError, Timestamp};
use crate::ports::CallbackRecordStore;

/// PostgreSQL implementation of the CallbackRecordStore port.
///
/// Append-only by construction: there is no update or delete statement in
/// this file.
pub struct PostgresCallbackRecordStore {
    pool: PgPool,
}

impl PostgresCallbackRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CallbackRow {
    id: Uuid,
    attempt_id: Uuid,
    payload: serde_json::Value,
    result_code: i64,
    result_desc: String,
    received_at: DateTime<Utc>,
}

impl From<CallbackRow> for CallbackRecord {
    fn from(row: CallbackRow) -> Self {
        CallbackRecord {
            id: row.id,
            attempt_id: CheckoutId::from_uuid(row.attempt_id),
            payload: row.payload,
            result_code: row.result_code,
            result_desc: row.result_desc,
            received_at: Timestamp::from_datetime(row.received_at),
        }
    }
}

fn db_error(err: sqlx::Error) -> DomainError {
    DomainError::database(format!("callback record query failed: {}", err))
}

#[async_trait]
impl CallbackRecordStore for PostgresCallbackRecordStore {
    async fn append(&self, record: CallbackRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO callback_records (
                id, attempt_id, payload, result_code, result_desc, received_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id)
        .bind(record.attempt_id.as_uuid())
        .bind(&record.payload)
        .bind(record.result_code)
        .bind(&record.result_desc)
        .bind(record.received_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn list_for_attempt(
        &self,
        attempt_id: &CheckoutId,
    ) -> Result<Vec<CallbackRecord>, DomainError> {
        let rows: Vec<CallbackRow> = sqlx::query_as(
            r#"
            SELECT id, attempt_id, payload, result_code, result_desc, received_at
            FROM callback_records
            WHERE attempt_id = $1
            ORDER BY received_at
            "#,
        )
        .bind(attempt_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
