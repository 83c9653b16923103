//! PostgreSQL-backed document store.
//!
//! Documents live in a single JSONB table keyed by `(namespace, collection)`,
//! where the namespace is the service's logical database name.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

use crate::store::{Document, DocumentStore, Filter, StoreError};

const CREATE_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS documents (
    id          UUID PRIMARY KEY,
    namespace   TEXT NOT NULL,
    collection  TEXT NOT NULL,
    body        JSONB NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
)";

const CREATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS documents_namespace_collection_idx
    ON documents (namespace, collection, created_at)";

pub struct PostgresStore {
    name: String,
    pool: PgPool,
    closed: AtomicBool,
}

impl PostgresStore {
    /// Connect, and make sure the documents table exists.
    pub async fn connect(
        url: &str,
        namespace: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        tracing::info!(namespace, "Dialing document store");
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        sqlx::query(CREATE_INDEX).execute(&pool).await?;

        Ok(Self {
            name: namespace.to_string(),
            pool,
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(StoreError::Closed(self.name.clone()))
        } else {
            Ok(())
        }
    }
}

fn to_document(row: &PgRow) -> Result<Document, StoreError> {
    let id: Uuid = row.try_get("id")?;
    let body: Value = row.try_get("body")?;
    Ok(Document {
        id: id.to_string(),
        body,
    })
}

#[async_trait]
impl DocumentStore for PostgresStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self) -> Result<(), StoreError> {
        self.ensure_open()?;
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            tracing::warn!(store = %self.name, "Multiple close() called");
            return;
        }
        self.pool.close().await;
        tracing::info!(store = %self.name, "Store connection closed");
    }

    async fn insert(&self, collection: &str, body: Value) -> Result<String, StoreError> {
        self.ensure_open()?;
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO documents (id, namespace, collection, body) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(&self.name)
        .bind(collection)
        .bind(&body)
        .execute(&self.pool)
        .await?;
        Ok(id.to_string())
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.ensure_open()?;
        let id = Uuid::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))?;
        let row = sqlx::query(
            "SELECT id, body FROM documents WHERE namespace = $1 AND collection = $2 AND id = $3",
        )
        .bind(&self.name)
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(to_document).transpose()
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        self.ensure_open()?;
        let rows = sqlx::query(
            "SELECT id, body FROM documents \
             WHERE namespace = $1 AND collection = $2 AND body @> $3 \
             ORDER BY created_at",
        )
        .bind(&self.name)
        .bind(collection)
        .bind(filter.to_containment())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(to_document).collect()
    }

    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        body: Value,
    ) -> Result<u64, StoreError> {
        self.ensure_open()?;
        let result = sqlx::query(
            "UPDATE documents SET body = $4 WHERE id = ( \
                 SELECT id FROM documents \
                 WHERE namespace = $1 AND collection = $2 AND body @> $3 \
                 ORDER BY created_at LIMIT 1)",
        )
        .bind(&self.name)
        .bind(collection)
        .bind(filter.to_containment())
        .bind(&body)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
