//! HTTP handlers and route tables

pub mod health;
pub mod redirect;
pub mod shorten;
pub mod user_urls;

use std::sync::Arc;

use actix_web::web;

use crate::pipeline::DeletePipeline;
use crate::shortener::CodeGenerator;
use crate::storage::StorageHandles;

pub use health::{HealthService, health_routes};
pub use redirect::{RedirectService, redirect_routes};
pub use shorten::{ShortenService, shorten_routes};
pub use user_urls::{UserUrlsService, user_urls_routes};

/// Shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<CodeGenerator>,
    pub storage: StorageHandles,
    /// Present only when the backend supports soft deletion
    pub pipeline: Option<DeletePipeline>,
}

impl AppState {
    pub fn new(generator: Arc<CodeGenerator>, storage: StorageHandles, chunk_size: usize) -> Self {
        let pipeline = storage
            .soft_delete
            .clone()
            .map(|store| DeletePipeline::new(store, chunk_size));
        Self {
            generator,
            storage,
            pipeline,
        }
    }
}

/// Every route of the service; the catch-all redirect goes last
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health_routes())
        .configure(shorten_routes)
        .service(user_urls_routes())
        .service(redirect_routes());
}
