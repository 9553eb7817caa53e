use actix_web::{HttpResponse, Responder, web};
use tracing::{error, trace};

use super::AppState;

pub struct HealthService;

impl HealthService {
    /// 200 when the backend answers, 500 otherwise
    pub async fn ping(state: web::Data<AppState>) -> impl Responder {
        match state.storage.storage.ping().await {
            Ok(()) => {
                trace!("Ping ok ({})", state.storage.storage.backend_name());
                HttpResponse::Ok().finish()
            }
            Err(e) => {
                error!(
                    "Ping failed for {} backend: {}",
                    state.storage.storage.backend_name(),
                    e
                );
                HttpResponse::InternalServerError().finish()
            }
        }
    }
}

pub fn health_routes() -> actix_web::Resource {
    web::resource("/ping")
        .route(web::get().to(HealthService::ping))
        .route(web::head().to(HealthService::ping))
}
