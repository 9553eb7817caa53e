//! Alias creation, single and bulk

use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::AppState;
use crate::errors::{Result, ShortenerError};
use crate::identity::CallerId;
use crate::storage::{BatchItem, ClientAck, PersistedRow};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenRequest {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub result: String,
}

/// Rejects empty input and anything that does not parse as an absolute URL
fn validate_original_url(raw: &str) -> Result<()> {
    if raw.trim().is_empty() {
        return Err(ShortenerError::validation("url must not be empty"));
    }
    url::Url::parse(raw)
        .map(|_| ())
        .map_err(|e| ShortenerError::validation(format!("invalid url {}: {}", raw, e)))
}

pub struct ShortenService;

impl ShortenService {
    pub async fn shorten(
        caller: CallerId,
        body: web::Json<ShortenRequest>,
        state: web::Data<AppState>,
    ) -> Result<HttpResponse> {
        let original = body.into_inner().url;
        validate_original_url(&original)?;

        let short_url = state.generator.generate();
        state
            .storage
            .storage
            .save_url(&caller, &short_url, &original)
            .await
            .inspect_err(|e| match e {
                ShortenerError::Conflict(_) => {
                    warn!("Caller {} shortened an already stored URL: {}", caller, e)
                }
                _ => error!("Saving alias for caller {} failed: {}", caller, e),
            })?;

        Ok(HttpResponse::Ok().json(ShortenResponse { result: short_url }))
    }

    /// All-or-nothing bulk create; needs a backend with bulk capability
    pub async fn shorten_batch(
        caller: CallerId,
        body: web::Json<Vec<BatchItem>>,
        state: web::Data<AppState>,
    ) -> Result<HttpResponse> {
        let Some(bulk) = state.storage.bulk.clone() else {
            let err = ShortenerError::backend_mismatch(format!(
                "batch create needs the relational backend, active backend is {}",
                state.storage.storage.backend_name()
            ));
            error!("{}", err);
            return Err(err);
        };

        let items = body.into_inner();
        for item in &items {
            validate_original_url(&item.original_url)?;
        }

        let rows: Vec<PersistedRow> = items
            .into_iter()
            .map(|item| PersistedRow {
                caller: caller.clone(),
                correlation_id: item.correlation_id,
                original_url: item.original_url,
                short_url: state.generator.generate(),
            })
            .collect();

        bulk.batch_insert(&rows)
            .await
            .inspect_err(|e| error!("Batch create for caller {} failed: {}", caller, e))?;

        info!("Caller {} created {} aliases in bulk", caller, rows.len());
        let acks: Vec<ClientAck> = rows.iter().map(PersistedRow::ack).collect();
        Ok(HttpResponse::Created().json(acks))
    }
}

pub fn shorten_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::post().to(ShortenService::shorten)))
        .service(web::resource("/api/shorten").route(web::post().to(ShortenService::shorten)))
        .service(
            web::resource("/api/shorten/batch")
                .route(web::post().to(ShortenService::shorten_batch)),
        );
}
