//! Audit log browsing.

use axum::extract::{Query, State};
use axum::Json;
use gemellifix_db::models::log::{LogEntry, LogQuery};
use gemellifix_db::repositories::LogRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/logs?action=&ticket_id=&user_id=&limit=&offset=
///
/// Newest first.
pub async fn list_logs(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<LogQuery>,
) -> AppResult<Json<DataResponse<Vec<LogEntry>>>> {
    let logs = LogRepo::query(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: logs }))
}
