//! Handlers for the maintenance calendar.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use gemellifix_core::error::CoreError;
use gemellifix_core::status::ScheduleEventKind;
use gemellifix_core::types::DbId;
use gemellifix_core::validation::{require_text, validate_time_range};
use gemellifix_db::models::schedule::{CreateScheduleEvent, ScheduleEvent, ScheduleQuery};
use gemellifix_db::repositories::{ScheduleRepo, TicketRepo, UserRepo};
use gemellifix_events::{event_types, ChangeEvent};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::query::AppJson;
use crate::response::DataResponse;
use crate::state::AppState;

const COLLECTION: &str = "schedule";

/// GET /api/v1/schedule?from=&to=&technician_id=
pub async fn list_events(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Query(params): Query<ScheduleQuery>,
) -> AppResult<Json<DataResponse<Vec<ScheduleEvent>>>> {
    if let (Some(from), Some(to)) = (params.from, params.to) {
        validate_time_range(from, to)?;
    }
    let events = ScheduleRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: events }))
}

/// POST /api/v1/schedule
///
/// `technician_id` must name a general services account and `ticket_id` an
/// existing ticket.
pub async fn create_event(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    AppJson(input): AppJson<CreateScheduleEvent>,
) -> AppResult<(StatusCode, Json<DataResponse<ScheduleEvent>>)> {
    require_text("title", &input.title)?;
    let kind: ScheduleEventKind = input.kind.trim().parse()?;
    validate_time_range(input.starts_at, input.ends_at)?;

    if let Some(technician_id) = input.technician_id {
        let user = UserRepo::find_by_id(&state.pool, technician_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "User",
                id: technician_id,
            }))?;
        if !user.role()?.is_technician() {
            return Err(AppError::Core(CoreError::Validation(format!(
                "'{}' is not general services personnel",
                user.name
            ))));
        }
    }
    if let Some(ticket_id) = input.ticket_id {
        TicketRepo::find_by_id(&state.pool, ticket_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Ticket",
                id: ticket_id,
            }))?;
    }

    let event = ScheduleRepo::create(&state.pool, &input, kind, admin.user_id).await?;
    tracing::info!(event_id = event.id, kind = %kind, "Schedule event created");
    state.event_bus.publish(
        ChangeEvent::new(event_types::SCHEDULE_CHANGED)
            .on(COLLECTION, event.id)
            .with_actor(admin.user_id),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: event })))
}

/// DELETE /api/v1/schedule/{id}
pub async fn delete_event(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !ScheduleRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "ScheduleEvent",
            id,
        }));
    }
    state.event_bus.publish(
        ChangeEvent::new(event_types::SCHEDULE_CHANGED)
            .on(COLLECTION, id)
            .with_actor(admin.user_id),
    );
    Ok(StatusCode::NO_CONTENT)
}
