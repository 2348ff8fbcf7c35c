//! Assistant endpoints backed by the prompt gateway.
//!
//! Ticket-bound flows load their context server-side so the model only ever
//! sees tickets the caller may read. Whatever the model answers is checked
//! against the real choices before it is returned.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use gemellifix_ai::flows::{
    AnalyzeDashboard, AskAssistant, AssistantAnswer, AssistantQuestion, ConnectionDiagnosis,
    ConnectionError, DashboardInput, DashboardSummary, DiagnoseConnection, SuggestTechnician,
    SuggestTicketDetails, SuggestTicketState, SuggestTicketTitle, TechnicianCandidate,
    TechnicianInput, TechnicianSuggestion, TicketDetailsInput, TicketDetailsSuggestion,
    TicketStateInput, TicketStateNarration, TicketTitleInput, TicketTitleSuggestion,
};
use gemellifix_ai::{run_flow, AiError, Flow};
use gemellifix_core::error::CoreError;
use gemellifix_core::roles::ROLE_GENERAL_SERVICES;
use gemellifix_core::ticket::{advise, TransitionAdvice};
use gemellifix_core::types::DbId;
use gemellifix_core::validation::require_text;
use gemellifix_db::repositories::{CategoryRepo, TicketRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::dashboard::current_metrics;
use crate::handlers::ticket::visible_ticket;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireOversight};
use crate::query::AppJson;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TicketDetailsRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Deterministic advice plus the model's narration of it.
#[derive(Debug, Serialize)]
pub struct StateSuggestion {
    #[serde(flatten)]
    pub advice: TransitionAdvice,
    pub analysis: String,
    pub narration: String,
}

fn rejected_output<F: Flow>(reason: String) -> AppError {
    AppError::Ai(AiError::InvalidOutput {
        prompt: F::PROMPT,
        reason,
    })
}

/// POST /api/v1/ai/assistant
pub async fn assistant(
    _auth: AuthUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<AssistantQuestion>,
) -> AppResult<Json<DataResponse<AssistantAnswer>>> {
    require_text("question", &input.question)?;
    let answer = run_flow::<AskAssistant>(&*state.ai, &input).await?;
    Ok(Json(DataResponse { data: answer }))
}

/// POST /api/v1/ai/ticket-details
///
/// Suggest a category (one of the catalog's) and a priority for a draft.
pub async fn ticket_details(
    _auth: AuthUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<TicketDetailsRequest>,
) -> AppResult<Json<DataResponse<TicketDetailsSuggestion>>> {
    let title = require_text("title", &input.title)?.to_string();
    let categories: Vec<String> = CategoryRepo::list(&state.pool)
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    if categories.is_empty() {
        return Err(AppError::Core(CoreError::Conflict(
            "No categories are configured".into(),
        )));
    }

    let suggestion = run_flow::<SuggestTicketDetails>(
        &*state.ai,
        &TicketDetailsInput {
            title,
            description: input.description,
            categories: categories.clone(),
        },
    )
    .await?;
    if !categories.contains(&suggestion.category) {
        return Err(rejected_output::<SuggestTicketDetails>(format!(
            "unknown category '{}'",
            suggestion.category
        )));
    }
    Ok(Json(DataResponse { data: suggestion }))
}

/// POST /api/v1/ai/ticket-title
pub async fn ticket_title(
    _auth: AuthUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<TicketTitleInput>,
) -> AppResult<Json<DataResponse<TicketTitleSuggestion>>> {
    require_text("description", &input.description)?;
    let suggestion = run_flow::<SuggestTicketTitle>(&*state.ai, &input).await?;
    Ok(Json(DataResponse { data: suggestion }))
}

/// POST /api/v1/ai/tickets/{id}/state-suggestion
pub async fn state_suggestion(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<StateSuggestion>>> {
    let ticket = visible_ticket(&state, &auth, id).await?;
    let now = Utc::now();
    let advice = advise(ticket.status()?, ticket.due_date, now);

    let assigned_to = if ticket.assignee_names.is_empty() {
        "Sin asignar".to_string()
    } else {
        ticket.assignee_names.join(", ")
    };
    let TicketStateNarration {
        analysis,
        recommendation,
    } = run_flow::<SuggestTicketState>(
        &*state.ai,
        &TicketStateInput {
            now: now.to_rfc3339(),
            status: advice.status.to_string(),
            due_date: ticket.due_date.to_rfc3339(),
            assigned_to,
            role: auth.role.to_string(),
            overdue: advice.overdue,
            suggested_status: advice
                .suggested_status
                .map(|s| s.to_string())
                .unwrap_or_default(),
        },
    )
    .await?;

    Ok(Json(DataResponse {
        data: StateSuggestion {
            advice,
            analysis,
            narration: recommendation,
        },
    }))
}

/// POST /api/v1/ai/tickets/{id}/technician
///
/// Recommend one active general services account, weighing each one's share
/// of the open assignments.
pub async fn suggest_technician(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TechnicianSuggestion>>> {
    let ticket = visible_ticket(&state, &admin, id).await?;
    let technicians: Vec<_> = UserRepo::list(&state.pool, Some(ROLE_GENERAL_SERVICES))
        .await?
        .into_iter()
        .filter(|u| u.is_active)
        .collect();
    if technicians.is_empty() {
        return Err(AppError::Core(CoreError::Conflict(
            "There is no active general services personnel to suggest".into(),
        )));
    }

    let counts: HashMap<DbId, i64> = TicketRepo::open_assignment_counts(&state.pool)
        .await?
        .into_iter()
        .collect();
    let total: i64 = technicians
        .iter()
        .map(|u| counts.get(&u.id).copied().unwrap_or(0))
        .sum();
    let candidates: Vec<TechnicianCandidate> = technicians
        .iter()
        .map(|u| {
            let open = counts.get(&u.id).copied().unwrap_or(0);
            TechnicianCandidate {
                id: u.id,
                name: u.name.clone(),
                open_assignments: open,
                workload_percentage: workload_percentage(open, total),
            }
        })
        .collect();

    let suggestion = run_flow::<SuggestTechnician>(
        &*state.ai,
        &TechnicianInput {
            title: ticket.title,
            description: ticket.description,
            category: ticket.category,
            technicians: candidates.clone(),
        },
    )
    .await?;
    if !candidates.iter().any(|c| c.id == suggestion.technician_id) {
        return Err(rejected_output::<SuggestTechnician>(format!(
            "technician {} is not a candidate",
            suggestion.technician_id
        )));
    }
    Ok(Json(DataResponse { data: suggestion }))
}

/// Share of all open assignments, as a whole percentage.
fn workload_percentage(open: i64, total: i64) -> u32 {
    if total <= 0 {
        return 0;
    }
    ((open as f64 / total as f64) * 100.0).round() as u32
}

/// POST /api/v1/ai/diagnose
pub async fn diagnose(
    _auth: AuthUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<ConnectionError>,
) -> AppResult<Json<DataResponse<ConnectionDiagnosis>>> {
    require_text("error_message", &input.error_message)?;
    let diagnosis = run_flow::<DiagnoseConnection>(&*state.ai, &input).await?;
    Ok(Json(DataResponse { data: diagnosis }))
}

/// POST /api/v1/ai/dashboard-summary
///
/// Summarizes the live metrics; the request body is not consulted.
pub async fn dashboard_summary(
    State(state): State<AppState>,
    RequireOversight(_user): RequireOversight,
) -> AppResult<Json<DataResponse<DashboardSummary>>> {
    let m = current_metrics(&state).await?;
    let summary = run_flow::<AnalyzeDashboard>(
        &*state.ai,
        &DashboardInput {
            open_tickets: m.open_tickets,
            overdue_tickets: m.overdue_tickets,
            sla_compliance: m.sla_compliance,
            average_resolution_hours: m.average_resolution_hours,
            compliance_by_priority: m.compliance_by_priority,
            tickets_by_zone: m.tickets_by_zone,
            top_requesters: m.top_requesters,
            popular_categories: m.popular_categories,
            tickets_by_month: m.tickets_by_month,
        },
    )
    .await?;
    Ok(Json(DataResponse { data: summary }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workload_is_share_of_open_assignments() {
        assert_eq!(workload_percentage(0, 0), 0);
        assert_eq!(workload_percentage(1, 4), 25);
        assert_eq!(workload_percentage(2, 3), 67);
        assert_eq!(workload_percentage(3, 3), 100);
    }
}
