use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::routes::ticket::UPLOAD_BODY_LIMIT;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /login      -> login (public)
/// GET  /me         -> me
/// PUT  /me         -> update_me
/// POST /me/avatar  -> upload_avatar (multipart)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/me", get(auth::me).put(auth::update_me))
        .route(
            "/me/avatar",
            post(auth::upload_avatar).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
}
