//! Handlers for zones, sites and categories.
//!
//! Any signed-in user may read the catalog; only administrators extend it
//! or rename entries.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use gemellifix_core::audit::actions;
use gemellifix_core::error::CoreError;
use gemellifix_core::types::DbId;
use gemellifix_core::validation::require_text;
use gemellifix_db::models::catalog::{
    Category, CreateCategory, CreateSite, CreateZone, RenameCatalogEntry, Site, Zone,
};
use gemellifix_db::repositories::{CategoryRepo, SiteRepo, ZoneRepo};
use gemellifix_events::{event_types, ChangeEvent};
use serde::Deserialize;
use serde_json::json;

use crate::audit::AuditWriter;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::query::AppJson;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SiteListParams {
    pub zone_id: Option<DbId>,
}

/// GET /api/v1/zones
pub async fn list_zones(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
) -> AppResult<Json<DataResponse<Vec<Zone>>>> {
    let zones = ZoneRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: zones }))
}

/// POST /api/v1/zones
pub async fn create_zone(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    AppJson(input): AppJson<CreateZone>,
) -> AppResult<(StatusCode, Json<DataResponse<Zone>>)> {
    let name = require_text("name", &input.name)?;
    let zone = ZoneRepo::create(&state.pool, name).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: zone })))
}

/// PUT /api/v1/zones/{id}
pub async fn rename_zone(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<RenameCatalogEntry>,
) -> AppResult<Json<DataResponse<Zone>>> {
    let name = require_text("name", &input.name)?;
    let zone = ZoneRepo::rename(&state.pool, id, name)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Zone", id }))?;
    record_rename(&state, &admin, "zones", id, &zone.name).await;
    Ok(Json(DataResponse { data: zone }))
}

/// GET /api/v1/sites?zone_id=
pub async fn list_sites(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Query(params): Query<SiteListParams>,
) -> AppResult<Json<DataResponse<Vec<Site>>>> {
    let sites = SiteRepo::list(&state.pool, params.zone_id).await?;
    Ok(Json(DataResponse { data: sites }))
}

/// POST /api/v1/sites
pub async fn create_site(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    AppJson(input): AppJson<CreateSite>,
) -> AppResult<(StatusCode, Json<DataResponse<Site>>)> {
    let name = require_text("name", &input.name)?;
    ZoneRepo::find_by_id(&state.pool, input.zone_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Zone",
            id: input.zone_id,
        }))?;
    let site = SiteRepo::create(&state.pool, input.zone_id, name).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: site })))
}

/// PUT /api/v1/sites/{id}
///
/// Only the name changes; a site stays in its zone.
pub async fn rename_site(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<RenameCatalogEntry>,
) -> AppResult<Json<DataResponse<Site>>> {
    let name = require_text("name", &input.name)?;
    let site = SiteRepo::rename(&state.pool, id, name)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Site", id }))?;
    record_rename(&state, &admin, "sites", id, &site.name).await;
    Ok(Json(DataResponse { data: site }))
}

async fn record_rename(
    state: &AppState,
    admin: &AuthUser,
    collection: &'static str,
    id: DbId,
    name: &str,
) {
    AuditWriter::record(
        &state.pool,
        admin,
        actions::UPDATE_CATALOG,
        json!({ "collection": collection, "id": id, "name": name }),
    )
    .await;
    state.event_bus.publish(
        ChangeEvent::new(event_types::CATALOG_UPDATED)
            .on(collection, id)
            .with_actor(admin.user_id),
    );
}

/// GET /api/v1/categories
pub async fn list_categories(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
) -> AppResult<Json<DataResponse<Vec<Category>>>> {
    let categories = CategoryRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: categories }))
}

/// POST /api/v1/categories
pub async fn create_category(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    AppJson(input): AppJson<CreateCategory>,
) -> AppResult<(StatusCode, Json<DataResponse<Category>>)> {
    let name = require_text("name", &input.name)?;
    let category = CategoryRepo::create(&state.pool, name).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: category })))
}
