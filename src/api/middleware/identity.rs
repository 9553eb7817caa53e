//! Caller identity middleware
//!
//! Reads the identity cookie, verifies it, and stores the resulting
//! [`CallerId`] in request extensions. A request without the cookie gets a
//! freshly issued identity and the cookie is attached to its response. A
//! request with a bad cookie is rejected before any handler runs.

use actix_service::{Service, Transform};
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest, ResponseError,
    body::EitherBody,
    cookie::{Cookie, SameSite, time::Duration},
    dev::{Payload, ServiceRequest, ServiceResponse},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{error, info};

use crate::api::constants::IDENTITY_COOKIE_PATH;
use crate::config::{AuthConfig, SameSitePolicy};
use crate::errors::ShortenerError;
use crate::identity::{Authentication, CallerId, IdentityManager};

/// Builds the identity cookie from the auth settings
#[derive(Debug, Clone)]
pub struct IdentityCookie {
    name: String,
    max_age_days: i64,
    secure: bool,
    same_site: SameSite,
}

impl IdentityCookie {
    pub fn from_config(config: &AuthConfig) -> Self {
        let same_site = match config.cookie_same_site {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::None => SameSite::None,
            SameSitePolicy::Lax => SameSite::Lax,
        };

        Self {
            name: config.cookie_name.clone(),
            max_age_days: config.cookie_max_age_days,
            secure: config.cookie_secure,
            same_site,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn build(&self, credential: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(self.name.clone(), credential);
        cookie.set_path(IDENTITY_COOKIE_PATH);
        cookie.set_http_only(true);
        cookie.set_secure(self.secure);
        cookie.set_same_site(self.same_site);
        cookie.set_max_age(Duration::days(self.max_age_days));
        cookie
    }
}

#[derive(Clone)]
pub struct IdentityLayer {
    manager: Arc<IdentityManager>,
    cookie: Arc<IdentityCookie>,
}

impl IdentityLayer {
    pub fn new(manager: Arc<IdentityManager>, cookie: IdentityCookie) -> Self {
        Self {
            manager,
            cookie: Arc::new(cookie),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentityLayer
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = IdentityMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddleware {
            service: Rc::new(service),
            manager: self.manager.clone(),
            cookie: self.cookie.clone(),
        }))
    }
}

pub struct IdentityMiddleware<S> {
    service: Rc<S>,
    manager: Arc<IdentityManager>,
    cookie: Arc<IdentityCookie>,
}

impl<S, B> IdentityMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    fn reject(req: ServiceRequest, err: ShortenerError) -> ServiceResponse<EitherBody<B>> {
        match err {
            ShortenerError::RandomSource(_) => {
                error!("Cannot issue caller identity: {}", err)
            }
            _ => info!("Rejected caller credential: {}", err),
        }
        req.into_response(err.error_response().map_into_right_body())
    }
}

impl<S, B> Service<ServiceRequest> for IdentityMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_service::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let manager = self.manager.clone();
        let cookie = self.cookie.clone();

        Box::pin(async move {
            let presented = req.cookie(cookie.name()).map(|c| c.value().to_string());

            let auth = match manager.authenticate(presented.as_deref()) {
                Ok(auth) => auth,
                Err(e) => return Ok(Self::reject(req, e)),
            };

            req.extensions_mut().insert(auth.caller().clone());
            let mut res = srv.call(req).await?;

            if let Authentication::Issued { credential, .. } = auth {
                res.response_mut()
                    .add_cookie(&cookie.build(credential))
                    .map_err(actix_web::error::ErrorInternalServerError)?;
            }

            Ok(res.map_into_left_body())
        })
    }
}

/// Handlers take the authenticated caller as an argument
impl FromRequest for CallerId {
    type Error = ShortenerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<CallerId>()
                .cloned()
                .ok_or_else(|| ShortenerError::validation("request carries no caller identity")),
        )
    }
}
