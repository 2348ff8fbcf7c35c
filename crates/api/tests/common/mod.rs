#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use gemellifix_ai::{DisabledGateway, PromptGateway};
use gemellifix_api::auth::jwt::{generate_access_token, JwtConfig, TokenSubject};
use gemellifix_api::auth::password::hash_password;
use gemellifix_api::config::{AiConfig, ServerConfig, StorageConfig};
use gemellifix_api::router::build_app_router;
use gemellifix_api::state::AppState;
use gemellifix_api::storage::LocalBlobStore;
use gemellifix_api::ws::WsManager;
use gemellifix_core::roles::Role;
use gemellifix_db::models::catalog::{Category, Site, Zone};
use gemellifix_db::models::user::{CreateUser, User};
use gemellifix_db::repositories::{CategoryRepo, SiteRepo, UserRepo, ZoneRepo};
use gemellifix_events::EventBus;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "secreto123";

/// `ServerConfig` with safe defaults and a throwaway storage directory.
pub fn test_config() -> ServerConfig {
    let root: PathBuf = std::env::temp_dir().join(format!("gemellifix-test-{}", uuid::Uuid::new_v4()));
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:9002".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_string(),
            access_token_expiry_mins: 60,
        },
        storage: StorageConfig {
            root,
            public_url: "/files".to_string(),
        },
        ai: AiConfig {
            api_key: None,
            model: "test-model".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(1),
        },
        bootstrap_admin: None,
    }
}

/// Full application router with AI disabled.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_ai(pool, Arc::new(DisabledGateway))
}

/// Full application router using `ai` as the prompt gateway.
pub fn build_test_app_with_ai(pool: PgPool, ai: Arc<dyn PromptGateway>) -> Router {
    let config = test_config();
    let blobs = Arc::new(LocalBlobStore::new(
        config.storage.root.clone(),
        config.storage.public_url.clone(),
    ));
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::new(WsManager::new()),
        event_bus: Arc::new(EventBus::default()),
        ai,
        blobs,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// Insert an active user with [`TEST_PASSWORD`]. The email is derived from
/// `name`.
pub async fn create_user(pool: &PgPool, name: &str, role: Role) -> User {
    let password_hash = hash_password(TEST_PASSWORD).expect("hashing should succeed");
    UserRepo::create(
        pool,
        &CreateUser {
            name: name.to_string(),
            email: format!("{}@gemelli.test", name.to_lowercase().replace(' ', ".")),
            avatar: None,
            role,
            password_hash,
        },
    )
    .await
    .expect("user creation should succeed")
}

/// Bearer token for `user`, signed with the test secret.
pub fn token_for(user: &User) -> String {
    generate_access_token(
        TokenSubject {
            user_id: user.id,
            role: &user.role,
            name: &user.name,
            email: &user.email,
        },
        &test_config().jwt,
    )
    .expect("token generation should succeed")
}

pub struct Catalog {
    pub zone: Zone,
    pub site: Site,
    pub category: Category,
}

/// One zone with one site, plus a category.
pub async fn seed_catalog(pool: &PgPool) -> Catalog {
    let zone = ZoneRepo::create(pool, "Bloque A").await.expect("zone");
    let site = SiteRepo::create(pool, zone.id, "Baño 2").await.expect("site");
    let category = CategoryRepo::create(pool, "Plomería").await.expect("category");
    Catalog {
        zone,
        site,
        category,
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("request should not fail")
}

fn with_auth(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

pub async fn request_json(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let builder = with_auth(Request::builder().method(method).uri(uri), token);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");
    send(app, request).await
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    request_json(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    request_json(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    request_json(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    request_json(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    request_json(app, Method::POST, uri, Some(token), None).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    request_json(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    request_json(app, Method::DELETE, uri, Some(token), None).await
}

/// Raw body with an explicit content type, for malformed-input tests.
pub async fn post_raw_auth(
    app: Router,
    uri: &str,
    token: &str,
    content_type: &str,
    body: impl Into<Body>,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, content_type)
        .body(body.into())
        .expect("request should build");
    send(app, request).await
}

/// One file part (`file`) plus optional text parts, multipart-encoded.
pub async fn post_multipart_auth(
    app: Router,
    uri: &str,
    token: &str,
    file: (&str, &str, &[u8]),
    fields: &[(&str, &str)],
) -> Response<Body> {
    const BOUNDARY: &str = "gemellifix-test-boundary";
    let (filename, content_type, bytes) = file;

    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    post_raw_auth(
        app,
        uri,
        token,
        &format!("multipart/form-data; boundary={BOUNDARY}"),
        body,
    )
    .await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
