//! Storage port and its backends
//!
//! `Storage` is the contract every backend meets. Bulk creation and soft
//! deletion are separate capabilities that only the relational backend
//! implements; callers hold them as `Option`s instead of probing the
//! concrete type.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tracing::warn;

use crate::config::{DatabaseConfig, StorageBackend};
use crate::errors::Result;
use crate::identity::CallerId;

pub mod backend;
pub mod memory;
pub mod models;

pub use backend::SeaOrmStorage;
pub use memory::MemoryStorage;
pub use models::{BatchItem, ClientAck, PersistedRow, ShortenedUrl};

#[async_trait]
pub trait Storage: Send + Sync {
    /// Append an alias to the caller's set. Not idempotent.
    ///
    /// The relational backend keeps original URLs unique and answers a
    /// repeated one with `Conflict` rather than dropping the row.
    async fn save_url(&self, caller: &CallerId, short_url: &str, original_url: &str) -> Result<()>;

    /// The caller's aliases in creation order; empty for unknown callers
    async fn urls_by_user(&self, caller: &CallerId) -> Result<Vec<ShortenedUrl>>;

    /// Original URL for an exact (caller, alias) pair, `NotFound` otherwise
    async fn resolve_original(&self, caller: &CallerId, short_url: &str) -> Result<String>;

    /// Liveness probe
    async fn ping(&self) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}

/// One open soft-delete transaction.
///
/// Dropping it without `commit` rolls back everything applied through it.
#[async_trait]
pub trait SoftDeleteTxn: Send {
    /// Flag the caller's rows whose alias is in `short_urls` as deleted.
    /// Returns the number of rows changed.
    async fn soft_delete(&mut self, caller: &CallerId, short_urls: &[String]) -> Result<u64>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

#[async_trait]
pub trait SoftDeleteStorage: Send + Sync {
    async fn begin_soft_delete(&self) -> Result<Box<dyn SoftDeleteTxn>>;
}

/// Backends that can create many aliases in one transaction
#[async_trait]
pub trait BulkStorage: Storage {
    /// All-or-nothing insert. Rows whose original URL is already stored are skipped.
    async fn batch_insert(&self, rows: &[PersistedRow]) -> Result<()>;
}

/// The storage handles the application runs with
#[derive(Clone)]
pub struct StorageHandles {
    pub storage: Arc<dyn Storage>,
    pub bulk: Option<Arc<dyn BulkStorage>>,
    pub soft_delete: Option<Arc<dyn SoftDeleteStorage>>,
    /// Underlying pool, closed on shutdown
    pub db: Option<DatabaseConnection>,
}

impl StorageHandles {
    pub fn memory() -> Self {
        Self {
            storage: Arc::new(MemoryStorage::new()),
            bulk: None,
            soft_delete: None,
            db: None,
        }
    }

    pub fn relational(store: Arc<SeaOrmStorage>) -> Self {
        Self {
            db: Some(store.get_db().clone()),
            storage: store.clone(),
            bulk: Some(store.clone()),
            soft_delete: Some(store),
        }
    }
}

pub struct StorageFactory;

impl StorageFactory {
    pub async fn create(config: &DatabaseConfig) -> Result<StorageHandles> {
        match config.backend {
            StorageBackend::Memory => {
                warn!("MEMORY storage initialized; aliases will not survive a restart");
                Ok(StorageHandles::memory())
            }
            StorageBackend::Relational => {
                let store = SeaOrmStorage::connect(config).await?;
                Ok(StorageHandles::relational(Arc::new(store)))
            }
        }
    }
}
