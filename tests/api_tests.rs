//! HTTP surface tests
//!
//! Drive the full middleware + route stack through `actix_web::test`.

use std::sync::Arc;
use std::time::Duration;

use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::http::header::{LOCATION, SET_COOKIE};
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use serde_json::{Value, json};
use tempfile::TempDir;
use urlshortener::api::configure_routes;
use urlshortener::api::middleware::{IdentityCookie, IdentityLayer, RequestIdMiddleware};
use urlshortener::api::AppState;
use urlshortener::config::{AuthConfig, DatabaseConfig, StorageBackend};
use urlshortener::identity::IdentityManager;
use urlshortener::shortener::CodeGenerator;
use urlshortener::storage::{SeaOrmStorage, StorageHandles};

const DOMAIN: &str = "http://localhost:8080/";
const SECRET: &[u8] = b"api-test-secret";

fn auth_config() -> AuthConfig {
    AuthConfig {
        secret_key: String::from_utf8_lossy(SECRET).to_string(),
        ..AuthConfig::default()
    }
}

fn state_for(handles: StorageHandles) -> AppState {
    let generator = CodeGenerator::new("abcdefghijklmnopqrstuvwxyz", 8, DOMAIN).unwrap();
    AppState::new(Arc::new(generator), handles, 500)
}

async fn relational_handles() -> (StorageHandles, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = DatabaseConfig {
        backend: StorageBackend::Relational,
        database_url: format!("sqlite://{}?mode=rwc", dir.path().join("api.db").display()),
        ..DatabaseConfig::default()
    };
    let store = SeaOrmStorage::connect(&config).await.unwrap();
    (StorageHandles::relational(Arc::new(store)), dir)
}

macro_rules! init_app {
    ($handles:expr) => {{
        let identity = Arc::new(IdentityManager::new(SECRET).unwrap());
        test::init_service(
            App::new()
                .wrap(IdentityLayer::new(
                    identity,
                    IdentityCookie::from_config(&auth_config()),
                ))
                .wrap(RequestIdMiddleware)
                .app_data(web::Data::new(state_for($handles)))
                .configure(configure_routes),
        )
        .await
    }};
}

/// The identity cookie issued on a first request
macro_rules! first_contact {
    ($app:expr) => {{
        let resp = test::call_service(&$app, TestRequest::get().uri("/api/user/urls").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == "userID")
            .expect("identity cookie issued")
            .into_owned();
        cookie
    }};
}

macro_rules! shorten {
    ($app:expr, $cookie:expr, $url:expr) => {{
        let req = TestRequest::post()
            .uri("/api/shorten")
            .cookie($cookie.clone())
            .set_json(json!({ "url": $url }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        body["result"].as_str().expect("result field").to_string()
    }};
}

fn code_of(short_url: &str) -> &str {
    short_url.strip_prefix(DOMAIN).expect("alias carries the domain")
}

#[actix_web::test]
async fn test_first_contact_issues_cookie() {
    let app = init_app!(StorageHandles::memory());

    let resp = test::call_service(&app, TestRequest::get().uri("/api/user/urls").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let header = resp
        .headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("Set-Cookie header")
        .to_string();
    assert!(header.starts_with("userID="));
    assert!(header.contains("HttpOnly"));
    assert!(header.contains("Path=/"));
    assert!(header.contains("Max-Age=604800"));

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!([]));
}

#[actix_web::test]
async fn test_valid_cookie_is_not_reissued() {
    let app = init_app!(StorageHandles::memory());
    let cookie = first_contact!(app);

    let req = TestRequest::get()
        .uri("/api/user/urls")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(SET_COOKIE).is_none());
}

#[actix_web::test]
async fn test_bad_credentials_are_rejected() {
    let app = init_app!(StorageHandles::memory());

    let req = TestRequest::get()
        .uri("/api/user/urls")
        .cookie(Cookie::new("userID", "no-separator"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.headers().get(SET_COOKIE).is_none());

    // Valid shape, signature from another key
    let other = IdentityManager::new(b"someone-else").unwrap();
    let forged = other.encode(&other.issue().unwrap());
    let req = TestRequest::get()
        .uri("/api/user/urls")
        .cookie(Cookie::new("userID", forged))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().get(SET_COOKIE).is_none());
}

#[actix_web::test]
async fn test_shorten_list_and_redirect() {
    let app = init_app!(StorageHandles::memory());
    let cookie = first_contact!(app);

    let short_url = shorten!(app, cookie, "https://example.com/page");
    assert_eq!(code_of(&short_url).len(), 8);

    let req = TestRequest::get()
        .uri("/api/user/urls")
        .cookie(cookie.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        body,
        json!([{ "short_url": short_url, "original_url": "https://example.com/page" }])
    );

    let req = TestRequest::get()
        .uri(&format!("/{}", code_of(&short_url)))
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        resp.headers().get(LOCATION).unwrap(),
        "https://example.com/page"
    );
}

#[actix_web::test]
async fn test_root_post_shortens() {
    let app = init_app!(StorageHandles::memory());
    let cookie = first_contact!(app);

    let req = TestRequest::post()
        .uri("/")
        .cookie(cookie)
        .set_json(json!({ "url": "https://example.com/root" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["result"].as_str().unwrap().starts_with(DOMAIN));
}

#[actix_web::test]
async fn test_redirect_is_caller_scoped() {
    let app = init_app!(StorageHandles::memory());
    let owner = first_contact!(app);
    let stranger = first_contact!(app);

    let short_url = shorten!(app, owner, "https://example.com/private");
    let req = TestRequest::get()
        .uri(&format!("/{}", code_of(&short_url)))
        .cookie(stranger)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_invalid_bodies_are_rejected() {
    let app = init_app!(StorageHandles::memory());
    let cookie = first_contact!(app);

    let req = TestRequest::post()
        .uri("/api/shorten")
        .cookie(cookie.clone())
        .set_json(json!({ "url": "" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let req = TestRequest::post()
        .uri("/api/shorten")
        .cookie(cookie)
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[actix_web::test]
async fn test_batch_operations_need_relational_backend() {
    let app = init_app!(StorageHandles::memory());
    let cookie = first_contact!(app);

    let req = TestRequest::post()
        .uri("/api/shorten/batch")
        .cookie(cookie.clone())
        .set_json(json!([{ "correlation_id": "1", "original_url": "https://example.com" }]))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );

    let req = TestRequest::post()
        .uri("/api/user/urls")
        .cookie(cookie)
        .set_json(json!(["abc"]))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[actix_web::test]
async fn test_ping() {
    let app = init_app!(StorageHandles::memory());
    let resp = test::call_service(&app, TestRequest::get().uri("/ping").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
}

#[actix_web::test]
async fn test_relational_batch_create_and_delete() {
    let (handles, _dir) = relational_handles().await;
    let app = init_app!(handles);
    let cookie = first_contact!(app);

    let req = TestRequest::post()
        .uri("/api/shorten/batch")
        .cookie(cookie.clone())
        .set_json(json!([
            { "correlation_id": "first", "original_url": "https://example.com/1" },
            { "correlation_id": "second", "original_url": "https://example.com/2" }
        ]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let acks: Value = test::read_body_json(resp).await;
    let acks = acks.as_array().unwrap();
    assert_eq!(acks.len(), 2);
    assert_eq!(acks[0]["correlation_id"], "first");
    assert_eq!(acks[1]["correlation_id"], "second");

    let first = acks[0]["short_url"].as_str().unwrap().to_string();
    let second = acks[1]["short_url"].as_str().unwrap().to_string();

    // One full alias, one bare code
    let req = TestRequest::delete()
        .uri("/api/user/urls")
        .cookie(cookie.clone())
        .set_json(json!([first.clone(), code_of(&second)]))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::ACCEPTED
    );

    let mut remaining = Value::Null;
    for _ in 0..50 {
        let req = TestRequest::get()
            .uri("/api/user/urls")
            .cookie(cookie.clone())
            .to_request();
        remaining = test::call_and_read_body_json(&app, req).await;
        if remaining == json!([]) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(remaining, json!([]));

    let req = TestRequest::get()
        .uri(&format!("/{}", code_of(&first)))
        .cookie(cookie)
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::GONE
    );
}

#[actix_web::test]
async fn test_relational_shorten_of_taken_url_conflicts() {
    let (handles, _dir) = relational_handles().await;
    let app = init_app!(handles);
    let alice = first_contact!(app);
    let bob = first_contact!(app);

    let short_url = shorten!(app, alice, "https://example.com/shared");

    let req = TestRequest::post()
        .uri("/api/shorten")
        .cookie(bob.clone())
        .set_json(json!({ "url": "https://example.com/shared" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body = test::read_body(resp).await;
    assert_eq!(&body[..], b"Conflict");

    let req = TestRequest::get()
        .uri("/api/user/urls")
        .cookie(bob)
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed, json!([]));

    let req = TestRequest::get()
        .uri(&format!("/{}", code_of(&short_url)))
        .cookie(alice)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[actix_web::test]
async fn test_relational_batch_acks_skipped_rows() {
    let (handles, _dir) = relational_handles().await;
    let app = init_app!(handles);
    let cookie = first_contact!(app);

    let existing = shorten!(app, cookie, "https://example.com/already");

    let req = TestRequest::post()
        .uri("/api/shorten/batch")
        .cookie(cookie.clone())
        .set_json(json!([
            { "correlation_id": "old", "original_url": "https://example.com/already" },
            { "correlation_id": "new", "original_url": "https://example.com/fresh" }
        ]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let acks: Value = test::read_body_json(resp).await;
    let acks = acks.as_array().unwrap();
    assert_eq!(acks.len(), 2);
    assert_eq!(acks[0]["correlation_id"], "old");
    assert_eq!(acks[1]["correlation_id"], "new");
    let fresh = acks[1]["short_url"].as_str().unwrap().to_string();

    let req = TestRequest::get()
        .uri("/api/user/urls")
        .cookie(cookie)
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        listed,
        json!([
            { "short_url": existing, "original_url": "https://example.com/already" },
            { "short_url": fresh, "original_url": "https://example.com/fresh" }
        ])
    );
}

#[actix_web::test]
async fn test_relational_ping() {
    let (handles, _dir) = relational_handles().await;
    let app = init_app!(handles);
    let resp = test::call_service(&app, TestRequest::get().uri("/ping").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
