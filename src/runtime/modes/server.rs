//! Server mode
//!
//! Builds the HTTP application and runs it until it stops or a shutdown
//! signal arrives.

use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use tracing::warn;

use crate::api::configure_routes;
use crate::api::middleware::{IdentityCookie, IdentityLayer, RequestIdMiddleware};
use crate::config::AppConfig;
use crate::runtime::lifetime;

/// Request body limit for JSON payloads
const JSON_LIMIT_BYTES: usize = 1024 * 1024;

/// Run the HTTP server
///
/// **Note**: Logging must be initialized before calling this function
pub async fn run_server(config: &AppConfig) -> Result<()> {
    let startup = lifetime::startup::prepare_server_startup(config)
        .await
        .inspect_err(|e| tracing::error!("Server startup failed: {:#}", e))?;

    let state = web::Data::new(startup.state);
    let identity = startup.identity;
    let cookie = IdentityCookie::from_config(&config.auth);

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(IdentityLayer::new(identity.clone(), cookie.clone()))
            .wrap(Compress::default())
            .wrap(RequestIdMiddleware)
            .wrap(DefaultHeaders::new().add(("Cache-Control", "no-cache, no-store, must-revalidate")))
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(JSON_LIMIT_BYTES))
            .configure(configure_routes)
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .workers(cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();

    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown(startup.db) => {
            warn!("Graceful shutdown: all tasks completed");
        }
    }

    Ok(())
}
