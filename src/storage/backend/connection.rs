//! Opening connections and migrating the schema

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::errors::{Result, ShortenerError};
use migration::{Migrator, MigratorTrait};

/// SQLite writers wait this long on a locked database before failing
const SQLITE_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool shape for server databases, derived from the configured size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl PoolSettings {
    /// At least one connection; at most five kept warm
    pub fn for_size(pool_size: u32) -> Self {
        let max_connections = pool_size.max(1);
        Self {
            max_connections,
            min_connections: max_connections.min(5),
            connect_timeout: Duration::from_secs(8),
            idle_timeout: Duration::from_secs(300),
            max_lifetime: Duration::from_secs(3600),
        }
    }

    fn apply(&self, opt: &mut ConnectOptions) {
        opt.max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(self.connect_timeout)
            .acquire_timeout(self.connect_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
            .sqlx_logging(false);
    }
}

impl From<&DatabaseConfig> for PoolSettings {
    fn from(config: &DatabaseConfig) -> Self {
        Self::for_size(config.pool_size)
    }
}

/// Connect to SQLite in WAL mode, creating the file when missing
pub async fn connect_sqlite(database_url: &str) -> Result<DatabaseConnection> {
    use sea_orm::SqlxSqliteConnector;
    use sea_orm::sqlx::SqlitePool;
    use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
    use std::str::FromStr;

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| ShortenerError::database_config(format!("invalid SQLite URL: {}", e)))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(SQLITE_BUSY_TIMEOUT);

    let pool = SqlitePool::connect_with(options).await.map_err(|e| {
        ShortenerError::database_connection(format!("cannot connect to SQLite: {}", e))
    })?;

    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

/// Connect to MySQL or PostgreSQL through a pool shaped by `settings`
pub async fn connect_pooled(
    database_url: &str,
    backend_name: &str,
    settings: PoolSettings,
) -> Result<DatabaseConnection> {
    debug!("Opening {} pool: {:?}", backend_name, settings);
    let mut opt = ConnectOptions::new(database_url.to_owned());
    settings.apply(&mut opt);

    Database::connect(opt).await.map_err(|e| {
        ShortenerError::database_connection(format!(
            "cannot connect to {}: {}",
            backend_name.to_uppercase(),
            e
        ))
    })
}

pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None)
        .await
        .map_err(|e| ShortenerError::database_operation(format!("migration failed: {}", e)))?;

    info!("Database migrations completed");
    Ok(())
}
