pub mod admin;
pub mod ai;
pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod health;
pub mod log;
pub mod notification;
pub mod requisition;
pub mod schedule;
pub mod ticket;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/login, /auth/me                            session
/// /admin/users, /admin/create-user                 accounts (admin)
/// /zones, /sites, /categories                      catalog
/// /tickets/...                                     tickets, approval, files
/// /requisitions/...                                purchase requisitions (admin)
/// /logs                                            audit log (admin)
/// /notifications/...                               caller's notifications
/// /schedule                                        calendar
/// /dashboard/metrics                               metrics (admin, SST)
/// /ai/...                                          assistant flows
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
        .merge(catalog::router())
        .nest("/tickets", ticket::router())
        .nest("/requisitions", requisition::router())
        .nest("/logs", log::router())
        .nest("/notifications", notification::router())
        .nest("/schedule", schedule::router())
        .nest("/dashboard", dashboard::router())
        .nest("/ai", ai::router())
}
