//! The caller's own aliases: listing and batch deletion

use actix_web::{HttpResponse, web};
use tracing::{debug, error};

use super::AppState;
use crate::errors::{Result, ShortenerError};
use crate::identity::CallerId;

pub struct UserUrlsService;

impl UserUrlsService {
    /// Always 200; an unknown caller gets `[]`
    pub async fn list(caller: CallerId, state: web::Data<AppState>) -> Result<HttpResponse> {
        let urls = state
            .storage
            .storage
            .urls_by_user(&caller)
            .await
            .inspect_err(|e| error!("Listing aliases for caller {} failed: {}", caller, e))?;
        Ok(HttpResponse::Ok().json(urls))
    }

    /// Hand the identifiers to the delete pipeline and answer 202 at once
    pub async fn delete(
        caller: CallerId,
        body: web::Json<Vec<String>>,
        state: web::Data<AppState>,
    ) -> Result<HttpResponse> {
        let Some(pipeline) = state.pipeline.as_ref() else {
            let err = ShortenerError::backend_mismatch(format!(
                "batch delete needs the relational backend, active backend is {}",
                state.storage.storage.backend_name()
            ));
            error!("{}", err);
            return Err(err);
        };

        let short_urls: Vec<String> = body
            .into_inner()
            .iter()
            .map(|id| state.generator.alias_for(id))
            .collect();

        let ticket = pipeline.submit(caller.clone(), short_urls);
        debug!("Batch delete for caller {} is {}", caller, ticket.state());

        Ok(HttpResponse::Accepted().finish())
    }
}

pub fn user_urls_routes() -> actix_web::Resource {
    web::resource("/api/user/urls")
        .route(web::get().to(UserUrlsService::list))
        .route(web::post().to(UserUrlsService::delete))
        .route(web::delete().to(UserUrlsService::delete))
}
