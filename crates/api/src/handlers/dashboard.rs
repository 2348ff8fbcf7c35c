//! Operational metrics for administrators and SST.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use gemellifix_core::dashboard::{compute_metrics, DashboardMetrics, TicketFacts};
use gemellifix_db::repositories::TicketRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireOversight;
use crate::response::DataResponse;
use crate::state::AppState;

/// Metrics over every ticket, as of now.
pub(crate) async fn current_metrics(state: &AppState) -> AppResult<DashboardMetrics> {
    let tickets = TicketRepo::list_all(&state.pool).await?;
    let facts = tickets
        .iter()
        .map(|t| {
            Ok(TicketFacts {
                status: t.status()?,
                priority: t.priority()?,
                created_at: t.created_at,
                due_date: t.due_date,
                resolved_at: t.resolved_at,
                zone: &t.zone,
                category: &t.category,
                requester: &t.requester_name,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;
    Ok(compute_metrics(&facts, Utc::now()))
}

/// GET /api/v1/dashboard/metrics
pub async fn metrics(
    State(state): State<AppState>,
    RequireOversight(_user): RequireOversight,
) -> AppResult<Json<DataResponse<DashboardMetrics>>> {
    let metrics = current_metrics(&state).await?;
    Ok(Json(DataResponse { data: metrics }))
}
