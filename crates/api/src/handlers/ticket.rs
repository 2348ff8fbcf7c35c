//! Handlers for the `/tickets` resource.
//!
//! Who may do what is decided in `gemellifix_core::ticket`; these handlers
//! load the row, ask the core rules, write, then record the audit entry and
//! publish the change.

use std::collections::HashSet;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use gemellifix_core::audit::actions;
use gemellifix_core::error::CoreError;
use gemellifix_core::roles::Role;
use gemellifix_core::sla::{due_date_for, generate_ticket_code};
use gemellifix_core::status::{TicketPriority, TicketStatus};
use gemellifix_core::storage::{evidence_prefix, TICKET_ATTACHMENTS};
use gemellifix_core::ticket::{
    advise, authorize_transition, can_edit, can_view, ensure_evidence_allowed,
    status_after_assignment, TransitionAdvice,
};
use gemellifix_core::types::DbId;
use gemellifix_core::validation::require_text;
use gemellifix_db::models::log::LogEntry;
use gemellifix_db::models::ticket::{CreateTicket, Ticket, TicketFilter};
use gemellifix_db::repositories::{CategoryRepo, LogRepo, SiteRepo, TicketRepo, UserRepo, ZoneRepo};
use gemellifix_events::{event_types, ChangeEvent};
use serde::Deserialize;
use serde_json::json;

use crate::audit::AuditWriter;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::AppJson;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::upload::{read_form, store_files};

const COLLECTION: &str = "tickets";

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub zone_id: DbId,
    pub site_id: DbId,
    #[serde(default)]
    pub priority: TicketPriority,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePriorityRequest {
    pub priority: TicketPriority,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAssigneesRequest {
    pub assignee_ids: Vec<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: TicketStatus,
    pub comment: Option<String>,
}

/// Optional note attached to an approval decision.
#[derive(Debug, Default, Deserialize)]
pub struct DecisionRequest {
    pub comment: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_ticket(state: &AppState, id: DbId) -> AppResult<Ticket> {
    TicketRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Ticket", id }))
}

/// Load a ticket the caller is allowed to read.
async fn load_visible_ticket(state: &AppState, auth: &AuthUser, id: DbId) -> AppResult<Ticket> {
    let ticket = load_ticket(state, id).await?;
    if !can_view(auth.actor(), ticket.parties()) {
        return Err(AppError::Core(CoreError::Forbidden(
            "You do not have access to this ticket".into(),
        )));
    }
    Ok(ticket)
}

/// The row was read a moment ago; a `None` from an update means it vanished.
fn updated(row: Option<Ticket>, id: DbId) -> AppResult<Ticket> {
    row.ok_or(AppError::Core(CoreError::NotFound { entity: "Ticket", id }))
}

fn non_empty(comment: Option<&str>) -> Option<&str> {
    comment.map(str::trim).filter(|c| !c.is_empty())
}

fn publish(state: &AppState, auth: &AuthUser, event_type: &str, ticket: &Ticket, payload: serde_json::Value) {
    state.event_bus.publish(
        ChangeEvent::new(event_type)
            .on(COLLECTION, ticket.id)
            .with_actor(auth.user_id)
            .with_payload(payload),
    );
}

fn status_payload(ticket: &Ticket, from: TicketStatus, to: TicketStatus) -> serde_json::Value {
    json!({
        "code": ticket.code,
        "title": ticket.title,
        "from": from,
        "to": to,
        "requester_id": ticket.requester_id,
    })
}

/// Check, apply and record one status change.
async fn apply_transition(
    state: &AppState,
    auth: &AuthUser,
    ticket: &Ticket,
    to: TicketStatus,
    comment: Option<&str>,
) -> AppResult<Ticket> {
    let from = ticket.status()?;
    let comment = non_empty(comment);
    authorize_transition(auth.actor(), ticket.parties(), from, to, comment)?;

    let moved = updated(TicketRepo::update_status(&state.pool, ticket.id, to).await?, ticket.id)?;
    tracing::info!(ticket_id = ticket.id, from = %from, to = %to, user_id = auth.user_id, "Ticket status changed");

    AuditWriter::record(
        &state.pool,
        auth,
        actions::UPDATE_STATUS,
        json!({ "ticket_id": ticket.id, "code": ticket.code, "old_value": from, "new_value": to }),
    )
    .await;
    if let Some(text) = comment {
        AuditWriter::record(
            &state.pool,
            auth,
            actions::ADD_COMMENT,
            json!({ "ticket_id": ticket.id, "comment": text, "status": to }),
        )
        .await;
    }
    publish(state, auth, event_types::TICKET_STATUS_CHANGED, &moved, status_payload(&moved, from, to));

    Ok(moved)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/tickets?status=&priority=&limit=&offset=
///
/// Administrators and SST see every ticket; everyone else sees the tickets
/// they requested or are assigned to.
pub async fn list_tickets(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(mut filter): Query<TicketFilter>,
) -> AppResult<Json<DataResponse<Vec<Ticket>>>> {
    if let Some(status) = filter.status.as_deref() {
        status.parse::<TicketStatus>()?;
    }
    if let Some(priority) = filter.priority.as_deref() {
        priority.parse::<TicketPriority>()?;
    }
    filter.visible_to = (!auth.role.sees_all_tickets()).then_some(auth.user_id);

    let tickets = TicketRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data: tickets }))
}

/// POST /api/v1/tickets
///
/// Zone, site and category names are copied onto the ticket; the code and
/// due date are derived from them and the priority.
pub async fn create_ticket(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateTicketRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Ticket>>)> {
    if auth.role == Role::Sst {
        return Err(AppError::Core(CoreError::Forbidden(
            "SST accounts are read-only".into(),
        )));
    }
    let title = require_text("title", &input.title)?.to_string();
    let category_name = require_text("category", &input.category)?;

    let category = CategoryRepo::find_by_name(&state.pool, category_name)
        .await?
        .ok_or_else(|| CoreError::Validation(format!("Unknown category '{category_name}'")))?;
    let zone = ZoneRepo::find_by_id(&state.pool, input.zone_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Zone",
            id: input.zone_id,
        }))?;
    let site = SiteRepo::find_by_id(&state.pool, input.site_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Site",
            id: input.site_id,
        }))?;
    if site.zone_id != zone.id {
        return Err(AppError::Core(CoreError::validation(format!(
            "Site '{}' does not belong to zone '{}'",
            site.name, zone.name
        ))));
    }

    let created_at = Utc::now();
    let ticket = TicketRepo::create(
        &state.pool,
        &CreateTicket {
            code: generate_ticket_code(&zone.name, &site.name),
            title,
            description: input.description.trim().to_string(),
            category: category.name,
            zone: zone.name,
            site: site.name,
            priority: input.priority,
            requester_id: auth.user_id,
            requester_name: auth.name.clone(),
            attachments: Vec::new(),
            created_at,
            due_date: due_date_for(input.priority, created_at),
        },
    )
    .await?;

    tracing::info!(ticket_id = ticket.id, code = %ticket.code, "Ticket created");
    AuditWriter::record(
        &state.pool,
        &auth,
        actions::CREATE_TICKET,
        json!({ "ticket_id": ticket.id, "code": ticket.code, "title": ticket.title }),
    )
    .await;
    publish(&state, &auth, event_types::TICKET_CREATED, &ticket, json!({ "code": ticket.code }));

    Ok((StatusCode::CREATED, Json(DataResponse { data: ticket })))
}

/// GET /api/v1/tickets/{id}
pub async fn get_ticket(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Ticket>>> {
    let ticket = load_visible_ticket(&state, &auth, id).await?;
    Ok(Json(DataResponse { data: ticket }))
}

/// PUT /api/v1/tickets/{id}/priority
///
/// The due date is recomputed from the creation time.
pub async fn update_priority(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<UpdatePriorityRequest>,
) -> AppResult<Json<DataResponse<Ticket>>> {
    let ticket = load_ticket(&state, id).await?;
    let status = ticket.status()?;
    if status.is_final() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Cannot change the priority of a ticket in status '{status}'"
        ))));
    }
    let old = ticket.priority()?;
    let due_date = due_date_for(input.priority, ticket.created_at);
    let changed = updated(
        TicketRepo::update_priority(&state.pool, id, input.priority, due_date).await?,
        id,
    )?;

    AuditWriter::record(
        &state.pool,
        &admin,
        actions::UPDATE_PRIORITY,
        json!({ "ticket_id": id, "code": ticket.code, "old_value": old, "new_value": input.priority }),
    )
    .await;
    publish(&state, &admin, event_types::TICKET_UPDATED, &changed, json!({ "field": "priority" }));

    Ok(Json(DataResponse { data: changed }))
}

/// PUT /api/v1/tickets/{id}/category
pub async fn update_category(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<UpdateCategoryRequest>,
) -> AppResult<Json<DataResponse<Ticket>>> {
    let name = require_text("category", &input.category)?;
    let category = CategoryRepo::find_by_name(&state.pool, name)
        .await?
        .ok_or_else(|| CoreError::Validation(format!("Unknown category '{name}'")))?;
    let ticket = load_ticket(&state, id).await?;
    let changed = updated(
        TicketRepo::update_category(&state.pool, id, &category.name).await?,
        id,
    )?;

    AuditWriter::record(
        &state.pool,
        &admin,
        actions::UPDATE_CATEGORY,
        json!({ "ticket_id": id, "code": ticket.code, "old_value": ticket.category, "new_value": category.name }),
    )
    .await;
    publish(&state, &admin, event_types::TICKET_UPDATED, &changed, json!({ "field": "category" }));

    Ok(Json(DataResponse { data: changed }))
}

/// PUT /api/v1/tickets/{id}/assignees
///
/// Replace the crew. Every id must be an active `Servicios Generales`
/// account. The status follows: `Asignado` with a crew, `Abierto` without.
pub async fn update_assignees(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<UpdateAssigneesRequest>,
) -> AppResult<Json<DataResponse<Ticket>>> {
    let ticket = load_ticket(&state, id).await?;

    let mut seen = HashSet::new();
    let ids: Vec<DbId> = input
        .assignee_ids
        .into_iter()
        .filter(|id| seen.insert(*id))
        .collect();

    let users = UserRepo::find_active_by_ids(&state.pool, &ids).await?;
    let mut names = Vec::with_capacity(ids.len());
    for assignee_id in &ids {
        let user = users
            .iter()
            .find(|u| u.id == *assignee_id)
            .ok_or_else(|| CoreError::Validation(format!("No active user with id {assignee_id}")))?;
        if !user.role()?.is_technician() {
            return Err(AppError::Core(CoreError::Validation(format!(
                "'{}' is not general services personnel",
                user.name
            ))));
        }
        names.push(user.name.clone());
    }

    let status = status_after_assignment(ticket.status()?, ids.len())?;
    let changed = updated(
        TicketRepo::set_assignees(&state.pool, id, &ids, &names, status).await?,
        id,
    )?;
    let added: Vec<DbId> = ids
        .iter()
        .copied()
        .filter(|i| !ticket.assignee_ids.contains(i))
        .collect();

    AuditWriter::record(
        &state.pool,
        &admin,
        actions::UPDATE_ASSIGNMENT,
        json!({
            "ticket_id": id,
            "code": ticket.code,
            "old_value": ticket.assignee_names,
            "new_value": names,
        }),
    )
    .await;
    publish(
        &state,
        &admin,
        event_types::TICKET_ASSIGNED,
        &changed,
        json!({
            "code": changed.code,
            "title": changed.title,
            "assignee_ids": ids,
            "added_assignee_ids": added,
        }),
    );

    Ok(Json(DataResponse { data: changed }))
}

/// POST /api/v1/tickets/{id}/transition
pub async fn transition(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<TransitionRequest>,
) -> AppResult<Json<DataResponse<Ticket>>> {
    let ticket = load_visible_ticket(&state, &auth, id).await?;
    let moved = apply_transition(&state, &auth, &ticket, input.status, input.comment.as_deref()).await?;
    Ok(Json(DataResponse { data: moved }))
}

async fn decide(
    auth: AuthUser,
    state: AppState,
    id: DbId,
    to: TicketStatus,
    comment: Option<String>,
) -> AppResult<Json<DataResponse<Ticket>>> {
    let ticket = load_visible_ticket(&state, &auth, id).await?;
    let status = ticket.status()?;
    if status != TicketStatus::RequiresApproval {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Ticket is '{status}', not awaiting approval"
        ))));
    }
    let moved = apply_transition(&state, &auth, &ticket, to, comment.as_deref()).await?;
    Ok(Json(DataResponse { data: moved }))
}

/// POST /api/v1/tickets/{id}/approve
///
/// The requester (or an administrator) accepts the work: `Cerrado`.
pub async fn approve(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<DecisionRequest>>,
) -> AppResult<Json<DataResponse<Ticket>>> {
    let comment = body.and_then(|Json(b)| b.comment);
    decide(auth, state, id, TicketStatus::Closed, comment).await
}

/// POST /api/v1/tickets/{id}/reject
///
/// The requester (or an administrator) sends the work back: `Asignado`.
pub async fn reject(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<DecisionRequest>>,
) -> AppResult<Json<DataResponse<Ticket>>> {
    let comment = body.and_then(|Json(b)| b.comment);
    decide(auth, state, id, TicketStatus::Assigned, comment).await
}

/// POST /api/v1/tickets/{id}/evidence (multipart: `file`..., `comment`)
///
/// The assigned technician or an administrator uploads proof of the finished
/// work; the ticket moves to `Requiere Aprobación`.
pub async fn submit_evidence(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<Ticket>>> {
    let ticket = load_visible_ticket(&state, &auth, id).await?;
    if !can_edit(auth.actor(), ticket.parties()) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the assigned personnel or an administrator can submit evidence".into(),
        )));
    }
    let from = ticket.status()?;
    ensure_evidence_allowed(from)?;

    let form = read_form(multipart).await?;
    let files = store_files(state.blobs.as_ref(), &evidence_prefix(id), &form.files).await?;
    let to = TicketStatus::RequiresApproval;
    let changed = updated(
        TicketRepo::submit_evidence(&state.pool, id, &files, to).await?,
        id,
    )?;

    AuditWriter::record(
        &state.pool,
        &auth,
        actions::SUBMIT_EVIDENCE,
        json!({ "ticket_id": id, "code": ticket.code, "files": files.len(), "old_value": from, "new_value": to }),
    )
    .await;
    if let Some(comment) = form.field("comment") {
        AuditWriter::record(
            &state.pool,
            &auth,
            actions::ADD_COMMENT,
            json!({ "ticket_id": id, "comment": comment, "status": to }),
        )
        .await;
    }
    publish(&state, &auth, event_types::TICKET_STATUS_CHANGED, &changed, status_payload(&changed, from, to));

    Ok(Json(DataResponse { data: changed }))
}

/// POST /api/v1/tickets/{id}/attachments (multipart: `file`...)
///
/// The requester, the assigned technician or an administrator may attach
/// files while the ticket is not final.
pub async fn add_attachments(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<Ticket>>> {
    let ticket = load_visible_ticket(&state, &auth, id).await?;
    let is_requester = ticket.requester_id == auth.user_id;
    if !is_requester && !can_edit(auth.actor(), ticket.parties()) {
        return Err(AppError::Core(CoreError::Forbidden(
            "You cannot add attachments to this ticket".into(),
        )));
    }
    let status = ticket.status()?;
    if status.is_final() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Cannot attach files to a ticket in status '{status}'"
        ))));
    }

    let form = read_form(multipart).await?;
    let files = store_files(state.blobs.as_ref(), TICKET_ATTACHMENTS, &form.files).await?;
    let changed = updated(
        TicketRepo::append_attachments(&state.pool, id, &files).await?,
        id,
    )?;

    AuditWriter::record(
        &state.pool,
        &auth,
        actions::ADD_ATTACHMENT,
        json!({ "ticket_id": id, "code": ticket.code, "files": files }),
    )
    .await;
    publish(&state, &auth, event_types::TICKET_UPDATED, &changed, json!({ "field": "attachments" }));

    Ok(Json(DataResponse { data: changed }))
}

/// GET /api/v1/tickets/{id}/advice
pub async fn advice(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TransitionAdvice>>> {
    let ticket = load_visible_ticket(&state, &auth, id).await?;
    let advice = advise(ticket.status()?, ticket.due_date, Utc::now());
    Ok(Json(DataResponse { data: advice }))
}

/// GET /api/v1/tickets/{id}/logs
///
/// The ticket's audit history, oldest first.
pub async fn ticket_logs(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<LogEntry>>>> {
    load_visible_ticket(&state, &auth, id).await?;
    let logs = LogRepo::for_ticket(&state.pool, id).await?;
    Ok(Json(DataResponse { data: logs }))
}

/// Shared with the AI handlers.
pub(crate) async fn visible_ticket(state: &AppState, auth: &AuthUser, id: DbId) -> AppResult<Ticket> {
    load_visible_ticket(state, auth, id).await
}
