//! Route definitions for the `/ai` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::ai;
use crate::state::AppState;

/// Routes mounted at `/ai`.
///
/// ```text
/// POST /assistant                       -> assistant
/// POST /ticket-details                  -> ticket_details
/// POST /ticket-title                    -> ticket_title
/// POST /tickets/{id}/state-suggestion   -> state_suggestion
/// POST /tickets/{id}/technician         -> suggest_technician (admin)
/// POST /diagnose                        -> diagnose
/// POST /dashboard-summary               -> dashboard_summary (admin, SST)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/assistant", post(ai::assistant))
        .route("/ticket-details", post(ai::ticket_details))
        .route("/ticket-title", post(ai::ticket_title))
        .route("/tickets/{id}/state-suggestion", post(ai::state_suggestion))
        .route("/tickets/{id}/technician", post(ai::suggest_technician))
        .route("/diagnose", post(ai::diagnose))
        .route("/dashboard-summary", post(ai::dashboard_summary))
}
