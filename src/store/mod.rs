//! Document store collaborator.
//!
//! # Data Flow
//! ```text
//! handlers ──insert/find/update──▶ DocumentStore ◀──probe── health::HealthMonitor
//!                                        ▲
//!                                        └──close── lifecycle::ShutdownCoordinator
//! ```
//!
//! # Design Decisions
//! - Documents are schemaless JSON objects grouped by collection
//! - Ids are generated by the store (UUID text)
//! - `close()` is idempotent; every operation after close fails with `StoreError::Closed`

pub mod filter;
pub mod memory;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::schema::{StoreBackend, StoreConfig};
use crate::lifecycle::shutdown::CriticalResource;

pub use filter::Filter;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Errors surfaced by document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store '{0}' is closed")]
    Closed(String),
    #[error("store '{0}' is unreachable")]
    Unreachable(String),
    #[error("'{0}' is not a valid document id")]
    InvalidId(String),
    #[error("store configuration: {0}")]
    Config(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A stored document and its store-assigned id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Value,
}

/// Narrow interface the services and the lifecycle consume.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Name used in log lines.
    fn name(&self) -> &str;

    /// Cheap liveness check.
    async fn probe(&self) -> Result<(), StoreError>;

    /// Tear down the connection. Safe to call more than once.
    async fn close(&self);

    /// Insert a document and return its new id.
    async fn insert(&self, collection: &str, body: Value) -> Result<String, StoreError>;

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// All documents matching `filter`, in insertion order.
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    /// Replace the body of the first document matching `filter`.
    /// Returns the number of documents replaced (0 or 1).
    async fn update(&self, collection: &str, filter: &Filter, body: Value)
        -> Result<u64, StoreError>;
}

#[async_trait]
impl CriticalResource for Arc<dyn DocumentStore> {
    fn name(&self) -> &str {
        DocumentStore::name(self.as_ref())
    }

    async fn close(&self) {
        DocumentStore::close(self.as_ref()).await;
    }
}

/// Open the configured store for a service database.
pub async fn open(config: &StoreConfig, database: &str) -> Result<Arc<dyn DocumentStore>, StoreError> {
    let store: Arc<dyn DocumentStore> = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new(database)),
        StoreBackend::Postgres => {
            let url = config
                .connection_string
                .as_deref()
                .ok_or_else(|| StoreError::Config("missing connection string".into()))?;
            Arc::new(
                PostgresStore::connect(
                    url,
                    database,
                    config.max_connections,
                    Duration::from_secs(config.connect_timeout_secs),
                )
                .await?,
            )
        }
    };

    tracing::info!(store = store.name(), backend = ?config.backend, "Got store connection");
    Ok(store)
}
