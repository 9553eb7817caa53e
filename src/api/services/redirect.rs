use actix_web::http::header::LOCATION;
use actix_web::{HttpResponse, web};
use tracing::{debug, error};

use super::AppState;
use crate::errors::{Result, ShortenerError};
use crate::identity::CallerId;

pub struct RedirectService;

impl RedirectService {
    /// Resolve `/{code}` within the caller's own aliases
    pub async fn handle_redirect(
        caller: CallerId,
        path: web::Path<String>,
        state: web::Data<AppState>,
    ) -> Result<HttpResponse> {
        let code = path.into_inner();
        if code.is_empty() {
            return Err(ShortenerError::validation("empty short code"));
        }

        let short_url = state.generator.alias_for(&code);
        match state
            .storage
            .storage
            .resolve_original(&caller, &short_url)
            .await
        {
            Ok(original) => {
                debug!("Redirecting {} to {}", short_url, original);
                Ok(HttpResponse::TemporaryRedirect()
                    .insert_header((LOCATION, original))
                    .finish())
            }
            Err(e @ (ShortenerError::NotFound(_) | ShortenerError::Deleted(_))) => {
                debug!("Redirect miss for {}: {}", short_url, e);
                Err(e)
            }
            Err(e) => {
                error!("Resolving {} for caller {} failed: {}", short_url, caller, e);
                Err(e)
            }
        }
    }
}

pub fn redirect_routes() -> actix_web::Resource {
    web::resource("/{code}").route(web::get().to(RedirectService::handle_redirect))
}
