//! Route definitions for the `/requisitions` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::requisition;
use crate::routes::ticket::UPLOAD_BODY_LIMIT;
use crate::state::AppState;

/// Routes mounted at `/requisitions`. Administrators only.
///
/// ```text
/// GET    /                        -> list_requisitions
/// POST   /                        -> create_requisition
/// GET    /{id}                    -> get_requisition
/// POST   /{id}/items              -> add_item
/// PUT    /{id}/items/{item_id}    -> update_item
/// DELETE /{id}/items/{item_id}    -> delete_item
/// POST   /{id}/reject             -> reject_requisition
/// POST   /{id}/attachments        -> add_attachments (multipart)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(requisition::list_requisitions).post(requisition::create_requisition),
        )
        .route("/{id}", get(requisition::get_requisition))
        .route("/{id}/items", post(requisition::add_item))
        .route(
            "/{id}/items/{item_id}",
            put(requisition::update_item).delete(requisition::delete_item),
        )
        .route("/{id}/reject", post(requisition::reject_requisition))
        .route(
            "/{id}/attachments",
            post(requisition::add_attachments).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
}
