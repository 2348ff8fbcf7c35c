use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::schedule;
use crate::state::AppState;

/// Routes mounted at `/schedule`.
///
/// ```text
/// GET    /        -> list_events (?from=&to=&technician_id=)
/// POST   /        -> create_event (admin)
/// DELETE /{id}    -> delete_event (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(schedule::list_events).post(schedule::create_event))
        .route("/{id}", delete(schedule::delete_event))
}
