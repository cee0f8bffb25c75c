//! PostgresConditionalStore - 本番用の条件付きストア
//!
//! claim は `INSERT .. ON CONFLICT DO NOTHING` の一文。`(collection, document_id)`
//! の主キーがプロセスをまたいだ原子性を担う。`rows_affected() == 1` なら作成できた。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use crate::domain::document::{DocumentData, StoredDocument};
use crate::domain::errors::StoreError;
use crate::ports::{ConditionalStore, CreateOutcome, DocumentReader};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS latch_documents (
        collection  TEXT        NOT NULL,
        document_id TEXT        NOT NULL,
        data        JSONB       NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (collection, document_id)
    )
"#;

const INSERT_IF_ABSENT: &str = r#"
    INSERT INTO latch_documents (collection, document_id, data)
    VALUES ($1, $2, $3)
    ON CONFLICT (collection, document_id) DO NOTHING
"#;

const SELECT_ONE: &str = r#"
    SELECT data, created_at
    FROM latch_documents
    WHERE collection = $1 AND document_id = $2
"#;

#[derive(Clone)]
pub struct PostgresConditionalStore {
    pool: PgPool,
}

impl PostgresConditionalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the backing table if it is missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ConditionalStore for PostgresConditionalStore {
    async fn create_if_absent(
        &self,
        collection: &str,
        key: &str,
        data: DocumentData,
    ) -> Result<CreateOutcome, StoreError> {
        let result = sqlx::query(INSERT_IF_ABSENT)
            .bind(collection)
            .bind(key)
            .bind(Json(serde_json::Value::Object(data)))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 1 {
            Ok(CreateOutcome::Created)
        } else {
            Ok(CreateOutcome::Conflict)
        }
    }
}

#[async_trait]
impl DocumentReader for PostgresConditionalStore {
    async fn read(&self, collection: &str, key: &str) -> Result<Option<StoredDocument>, StoreError> {
        let row: Option<(Json<serde_json::Value>, DateTime<Utc>)> = sqlx::query_as(SELECT_ONE)
            .bind(collection)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(Json(value), created_at)| StoredDocument {
            data: match value {
                serde_json::Value::Object(map) => map,
                _ => DocumentData::new(),
            },
            created_at,
        }))
    }
}
