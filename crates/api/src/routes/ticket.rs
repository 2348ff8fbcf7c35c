//! Route definitions for the `/tickets` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use gemellifix_core::storage::MAX_UPLOAD_BYTES;

use crate::handlers::ticket;
use crate::state::AppState;

/// Multipart bodies may carry several files of up to `MAX_UPLOAD_BYTES` each.
pub const UPLOAD_BODY_LIMIT: usize = 4 * MAX_UPLOAD_BYTES;

/// Routes mounted at `/tickets`.
///
/// ```text
/// GET    /                  -> list_tickets
/// POST   /                  -> create_ticket
/// GET    /{id}              -> get_ticket
/// PUT    /{id}/priority     -> update_priority (admin)
/// PUT    /{id}/category     -> update_category (admin)
/// PUT    /{id}/assignees    -> update_assignees (admin)
/// POST   /{id}/transition   -> transition
/// POST   /{id}/approve      -> approve
/// POST   /{id}/reject       -> reject
/// POST   /{id}/evidence     -> submit_evidence (multipart)
/// POST   /{id}/attachments  -> add_attachments (multipart)
/// GET    /{id}/advice       -> advice
/// GET    /{id}/logs         -> ticket_logs
/// ```
pub fn router() -> Router<AppState> {
    let uploads = Router::new()
        .route("/{id}/evidence", post(ticket::submit_evidence))
        .route("/{id}/attachments", post(ticket::add_attachments))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT));

    Router::new()
        .route("/", get(ticket::list_tickets).post(ticket::create_ticket))
        .route("/{id}", get(ticket::get_ticket))
        .route("/{id}/priority", put(ticket::update_priority))
        .route("/{id}/category", put(ticket::update_category))
        .route("/{id}/assignees", put(ticket::update_assignees))
        .route("/{id}/transition", post(ticket::transition))
        .route("/{id}/approve", post(ticket::approve))
        .route("/{id}/reject", post(ticket::reject))
        .route("/{id}/advice", get(ticket::advice))
        .route("/{id}/logs", get(ticket::ticket_logs))
        .merge(uploads)
}
