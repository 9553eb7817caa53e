//! SeaORM storage backend
//!
//! Relational implementation of the storage port, plus the bulk-insert and
//! soft-delete capabilities. Supports SQLite, MySQL/MariaDB and PostgreSQL.

mod connection;
mod converters;
mod mutations;
mod query;
pub mod retry;
mod soft_delete;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tracing::warn;

use crate::config::DatabaseConfig;
use crate::errors::{Result, ShortenerError};
use crate::identity::CallerId;
use crate::storage::{
    BulkStorage, PersistedRow, ShortenedUrl, SoftDeleteStorage, SoftDeleteTxn, Storage,
};

pub use connection::{PoolSettings, connect_pooled, connect_sqlite, run_migrations};
pub use retry::RetryPolicy;
pub use soft_delete::SeaOrmDeleteTxn;

/// Infer the database kind from its URL
pub fn infer_backend_from_url(database_url: &str) -> Result<&'static str> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
    {
        Ok("sqlite")
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql")
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres")
    } else {
        Err(ShortenerError::database_config(format!(
            "cannot infer database kind from URL {}; expected sqlite:, mysql://, mariadb:// or postgres://",
            database_url
        )))
    }
}

#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: &'static str,
    retry_policy: RetryPolicy,
}

impl SeaOrmStorage {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        if config.database_url.is_empty() {
            return Err(ShortenerError::database_config("database_url is not set"));
        }

        let backend_name = infer_backend_from_url(&config.database_url)?;
        let db = if backend_name == "sqlite" {
            connect_sqlite(&config.database_url).await?
        } else {
            connect_pooled(&config.database_url, backend_name, PoolSettings::from(config)).await?
        };

        Self::from_connection(db, backend_name, RetryPolicy::from(config)).await
    }

    /// Wrap an existing connection and bring its schema up to date
    pub async fn from_connection(
        db: DatabaseConnection,
        backend_name: &'static str,
        retry_policy: RetryPolicy,
    ) -> Result<Self> {
        run_migrations(&db).await?;

        let storage = SeaOrmStorage {
            db,
            backend_name,
            retry_policy,
        };
        warn!("{} storage initialized.", backend_name.to_uppercase());
        Ok(storage)
    }

    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl Storage for SeaOrmStorage {
    async fn save_url(&self, caller: &CallerId, short_url: &str, original_url: &str) -> Result<()> {
        self.insert_one(caller, short_url, original_url).await
    }

    async fn urls_by_user(&self, caller: &CallerId) -> Result<Vec<ShortenedUrl>> {
        self.list_for_caller(caller).await
    }

    async fn resolve_original(&self, caller: &CallerId, short_url: &str) -> Result<String> {
        self.find_original(caller, short_url).await
    }

    async fn ping(&self) -> Result<()> {
        self.db.ping().await.map_err(|e| {
            ShortenerError::database_connection(format!("ping failed: {}", e))
        })
    }

    fn backend_name(&self) -> &'static str {
        self.backend_name
    }
}

#[async_trait]
impl BulkStorage for SeaOrmStorage {
    async fn batch_insert(&self, rows: &[PersistedRow]) -> Result<()> {
        self.insert_batch(rows).await
    }
}

#[async_trait]
impl SoftDeleteStorage for SeaOrmStorage {
    async fn begin_soft_delete(&self) -> Result<Box<dyn SoftDeleteTxn>> {
        let txn = SeaOrmDeleteTxn::begin(&self.db).await?;
        Ok(Box::new(txn))
    }
}
