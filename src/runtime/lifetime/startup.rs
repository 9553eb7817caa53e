use anyhow::{Context, Result};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::AppState;
use crate::config::AppConfig;
use crate::identity::IdentityManager;
use crate::shortener::CodeGenerator;
use crate::storage::StorageFactory;

/// Everything the HTTP server needs, built once
pub struct StartupContext {
    pub identity: Arc<IdentityManager>,
    pub state: AppState,
    /// Relational connection to close on shutdown, if any
    pub db: Option<DatabaseConnection>,
}

/// Build identity, code generator, storage and delete pipeline from config
pub async fn prepare_server_startup(config: &AppConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let identity = IdentityManager::new(config.auth.secret_key.as_bytes())
        .context("Failed to initialize identity manager")?;

    let generator = CodeGenerator::from_config(&config.shortener)
        .context("Failed to initialize short code generator")?;

    let handles = StorageFactory::create(&config.database)
        .await
        .context("Failed to create storage backend")?;
    let db = handles.db.clone();
    info!("Using storage backend: {}", handles.storage.backend_name());

    let state = AppState::new(Arc::new(generator), handles, config.pipeline.chunk_size);
    if state.pipeline.is_none() {
        info!("Batch create and delete are unavailable on this backend");
    }

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        identity: Arc::new(identity),
        state,
        db,
    })
}
