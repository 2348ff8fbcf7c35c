//! Handlers for the `/requisitions` resource (administrators only).
//!
//! The stored status is re-derived from the item list by the repository after
//! every item mutation. A rejected requisition is frozen.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Datelike, Utc};
use gemellifix_core::audit::actions;
use gemellifix_core::error::CoreError;
use gemellifix_core::requisition::{ensure_mutable, next_number, validate_item, validate_items};
use gemellifix_core::status::RequisitionStatus;
use gemellifix_core::storage::REQUISITION_ATTACHMENTS;
use gemellifix_core::types::DbId;
use gemellifix_db::models::requisition::{
    CreateRequisition, CreateRequisitionItem, ItemRemoval, Requisition, RequisitionDetail,
    RequisitionFilter, RequisitionItem, UpdateRequisitionItem,
};
use gemellifix_db::repositories::RequisitionRepo;
use gemellifix_events::{event_types, ChangeEvent};
use serde_json::json;

use crate::audit::AuditWriter;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::AppJson;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::upload::{read_form, store_files};

const COLLECTION: &str = "requisitions";

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Requisition",
        id,
    })
}

async fn load_requisition(state: &AppState, id: DbId) -> AppResult<Requisition> {
    RequisitionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Load a requisition that still accepts changes.
async fn load_mutable(state: &AppState, id: DbId) -> AppResult<Requisition> {
    let requisition = load_requisition(state, id).await?;
    ensure_mutable(requisition.status()?)?;
    Ok(requisition)
}

async fn load_detail(state: &AppState, id: DbId) -> AppResult<RequisitionDetail> {
    RequisitionRepo::find_detail(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))
}

fn publish(state: &AppState, admin: &AuthUser, event_type: &str, detail: &RequisitionDetail) {
    state.event_bus.publish(
        ChangeEvent::new(event_type)
            .on(COLLECTION, detail.requisition.id)
            .with_actor(admin.user_id)
            .with_payload(json!({
                "number": detail.requisition.number,
                "status": detail.requisition.status,
            })),
    );
}

/// Record an item-level change and return the refreshed requisition.
async fn finish_update(
    state: &AppState,
    admin: &AuthUser,
    id: DbId,
    details: serde_json::Value,
) -> AppResult<RequisitionDetail> {
    let detail = load_detail(state, id).await?;
    AuditWriter::record(&state.pool, admin, actions::UPDATE_REQUISITION, details).await;
    publish(state, admin, event_types::REQUISITION_UPDATED, &detail);
    Ok(detail)
}

/// GET /api/v1/requisitions?status=&limit=&offset=
pub async fn list_requisitions(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filter): Query<RequisitionFilter>,
) -> AppResult<Json<DataResponse<Vec<Requisition>>>> {
    if let Some(status) = filter.status.as_deref() {
        status.parse::<RequisitionStatus>()?;
    }
    let requisitions = RequisitionRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data: requisitions }))
}

/// POST /api/v1/requisitions
///
/// The number continues the sequence of the latest requisition. Two creates
/// racing for the same number: the loser gets 409 from
/// `uq_requisitions_number`.
pub async fn create_requisition(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    AppJson(input): AppJson<CreateRequisition>,
) -> AppResult<(StatusCode, Json<DataResponse<RequisitionDetail>>)> {
    validate_items(&input.items)?;

    let last = RequisitionRepo::latest_number(&state.pool).await?;
    let number = next_number(last.as_deref(), Utc::now().year());
    let detail =
        RequisitionRepo::create(&state.pool, &number, admin.user_id, &admin.name, &input).await?;

    tracing::info!(
        requisition_id = detail.requisition.id,
        number = %detail.requisition.number,
        status = %detail.requisition.status,
        "Requisition created",
    );
    AuditWriter::record(
        &state.pool,
        &admin,
        actions::CREATE_REQUISITION,
        json!({
            "requisition_id": detail.requisition.id,
            "number": detail.requisition.number,
            "items": detail.items.len(),
        }),
    )
    .await;
    publish(&state, &admin, event_types::REQUISITION_CREATED, &detail);

    Ok((StatusCode::CREATED, Json(DataResponse { data: detail })))
}

/// GET /api/v1/requisitions/{id}
pub async fn get_requisition(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<RequisitionDetail>>> {
    let detail = load_detail(&state, id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// POST /api/v1/requisitions/{id}/items
pub async fn add_item(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    AppJson(item): AppJson<CreateRequisitionItem>,
) -> AppResult<(StatusCode, Json<DataResponse<RequisitionDetail>>)> {
    load_mutable(&state, id).await?;
    validate_item(&item)?;

    let created = RequisitionRepo::add_item(&state.pool, id, &item).await?;
    let detail = finish_update(
        &state,
        &admin,
        id,
        json!({ "requisition_id": id, "item_id": created.id, "change": "add_item", "product": created.product }),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: detail })))
}

/// Merge a patch over the stored item so the result can be validated whole.
fn merged(current: &RequisitionItem, patch: &UpdateRequisitionItem) -> CreateRequisitionItem {
    CreateRequisitionItem {
        quantity: patch.quantity.unwrap_or(current.quantity),
        product: patch
            .product
            .clone()
            .unwrap_or_else(|| current.product.clone()),
        description: patch
            .description
            .clone()
            .unwrap_or_else(|| current.description.clone()),
        authorized: patch.authorized.unwrap_or(current.authorized),
        received: patch.received.unwrap_or(current.received),
    }
}

/// PUT /api/v1/requisitions/{id}/items/{item_id}
///
/// Partial update of one line (quantity, product, description, authorized,
/// received). A line cannot end up received without being authorized.
pub async fn update_item(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path((id, item_id)): Path<(DbId, DbId)>,
    AppJson(patch): AppJson<UpdateRequisitionItem>,
) -> AppResult<Json<DataResponse<RequisitionDetail>>> {
    load_mutable(&state, id).await?;
    let items = RequisitionRepo::items(&state.pool, id).await?;
    let current = items
        .iter()
        .find(|i| i.id == item_id)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "RequisitionItem",
            id: item_id,
        }))?;
    validate_item(&merged(current, &patch))?;

    RequisitionRepo::update_item(&state.pool, id, item_id, &patch)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "RequisitionItem",
            id: item_id,
        }))?;

    let detail = finish_update(
        &state,
        &admin,
        id,
        json!({
            "requisition_id": id,
            "item_id": item_id,
            "change": "update_item",
            "authorized": patch.authorized,
            "received": patch.received,
            "quantity": patch.quantity,
        }),
    )
    .await?;
    Ok(Json(DataResponse { data: detail }))
}

/// DELETE /api/v1/requisitions/{id}/items/{item_id}
///
/// The last remaining item cannot be removed.
pub async fn delete_item(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path((id, item_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<RequisitionDetail>>> {
    load_mutable(&state, id).await?;
    match RequisitionRepo::delete_item(&state.pool, id, item_id).await? {
        ItemRemoval::Removed => {}
        ItemRemoval::NotFound => {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "RequisitionItem",
                id: item_id,
            }));
        }
        ItemRemoval::LastItem => {
            return Err(AppError::Core(CoreError::Conflict(
                "A requisition needs at least one item".into(),
            )));
        }
    }

    let detail = finish_update(
        &state,
        &admin,
        id,
        json!({ "requisition_id": id, "item_id": item_id, "change": "delete_item" }),
    )
    .await?;
    Ok(Json(DataResponse { data: detail }))
}

/// POST /api/v1/requisitions/{id}/reject
pub async fn reject_requisition(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<RequisitionDetail>>> {
    let previous = load_mutable(&state, id).await?;
    RequisitionRepo::reject(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    let detail = load_detail(&state, id).await?;

    tracing::info!(requisition_id = id, number = %previous.number, "Requisition rejected");
    AuditWriter::record(
        &state.pool,
        &admin,
        actions::REJECT_REQUISITION,
        json!({
            "requisition_id": id,
            "number": previous.number,
            "old_value": previous.status,
            "new_value": RequisitionStatus::Rejected,
        }),
    )
    .await;
    publish(&state, &admin, event_types::REQUISITION_UPDATED, &detail);

    Ok(Json(DataResponse { data: detail }))
}

/// POST /api/v1/requisitions/{id}/attachments (multipart: `file`...)
pub async fn add_attachments(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<RequisitionDetail>>> {
    load_mutable(&state, id).await?;
    let form = read_form(multipart).await?;
    let files = store_files(state.blobs.as_ref(), REQUISITION_ATTACHMENTS, &form.files).await?;
    RequisitionRepo::append_attachments(&state.pool, id, &files)
        .await?
        .ok_or_else(|| not_found(id))?;

    let detail = finish_update(
        &state,
        &admin,
        id,
        json!({ "requisition_id": id, "change": "add_attachment", "files": files }),
    )
    .await?;
    Ok(Json(DataResponse { data: detail }))
}
