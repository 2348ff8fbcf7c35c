use axum::routing::get;
use axum::Router;

use crate::handlers::log;
use crate::state::AppState;

/// Routes mounted at `/logs`.
///
/// ```text
/// GET /    -> list_logs (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(log::list_logs))
}
