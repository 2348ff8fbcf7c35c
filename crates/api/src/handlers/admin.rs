//! Handlers for the `/admin` resource (account management).
//!
//! All handlers require the `Administrador` role via [`RequireAdmin`]. The
//! role check runs before the body is parsed, so an unauthenticated caller
//! gets 401/403 even with a malformed body.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use gemellifix_core::audit::actions;
use gemellifix_core::error::CoreError;
use gemellifix_core::roles::Role;
use gemellifix_core::types::DbId;
use gemellifix_core::validation::{require_text, validate_email, validate_password};
use gemellifix_db::models::user::{CreateUser, UpdateUser, UserResponse};
use gemellifix_db::repositories::UserRepo;
use gemellifix_events::{event_types, ChangeEvent};
use serde::Deserialize;
use serde_json::json;

use crate::audit::AuditWriter;
use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::AppJson;
use crate::response::{CreatedUid, DataResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body of `POST /admin/users` and `POST /admin/create-user`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub avatar: Option<String>,
}

/// Body of `PUT /admin/users/{id}`. Omitted fields are left as they are.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserListParams {
    pub role: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/users
///
/// Create an account and answer `201 { "uid": <id> }`. A duplicate email is
/// 409 (`uq_users_email`).
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    AppJson(input): AppJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<CreatedUid>)> {
    let name = require_text("name", &input.name)?.to_string();
    let email = input.email.trim().to_lowercase();
    validate_email(&email)?;
    validate_password(&input.password)?;
    let role: Role = input.role.trim().parse()?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            name,
            email,
            avatar: input.avatar.filter(|a| !a.trim().is_empty()),
            role,
            password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, role = %role, "User created");
    AuditWriter::record(
        &state.pool,
        &admin,
        actions::CREATE_USER,
        json!({ "uid": user.id, "email": user.email, "name": user.name, "role": user.role }),
    )
    .await;
    state.event_bus.publish(
        ChangeEvent::new(event_types::USER_CREATED)
            .on("users", user.id)
            .with_actor(admin.user_id),
    );

    Ok((StatusCode::CREATED, Json(CreatedUid { uid: user.id })))
}

/// GET /api/v1/admin/users?role=
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<UserListParams>,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let role = params
        .role
        .as_deref()
        .map(|r| r.parse::<Role>())
        .transpose()?;
    let users = UserRepo::list(&state.pool, role.map(Role::as_str)).await?;
    Ok(Json(DataResponse {
        data: users.into_iter().map(UserResponse::from).collect(),
    }))
}

/// GET /api/v1/admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    Ok(Json(DataResponse { data: user.into() }))
}

/// PUT /api/v1/admin/users/{id}
///
/// Rename an account or change its role. Administrators cannot demote
/// themselves.
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<UpdateUserRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let name = input
        .name
        .as_deref()
        .map(|n| require_text("name", n))
        .transpose()?;
    let role = input
        .role
        .as_deref()
        .map(|r| r.trim().parse::<Role>())
        .transpose()?;
    if name.is_none() && role.is_none() {
        return Err(AppError::BadRequest("Nothing to update".into()));
    }
    if id == admin.user_id && role.is_some_and(|r| r != Role::Admin) {
        return Err(AppError::Core(CoreError::Conflict(
            "You cannot remove your own administrator role".into(),
        )));
    }

    let user = UserRepo::update(
        &state.pool,
        id,
        &UpdateUser {
            name: name.map(str::to_string),
            role,
        },
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;

    tracing::info!(user_id = user.id, role = %user.role, "User updated");
    AuditWriter::record(
        &state.pool,
        &admin,
        actions::UPDATE_USER,
        json!({ "uid": user.id, "name": user.name, "role": user.role }),
    )
    .await;
    state.event_bus.publish(
        ChangeEvent::new(event_types::USER_UPDATED)
            .on("users", user.id)
            .with_actor(admin.user_id),
    );

    Ok(Json(DataResponse { data: user.into() }))
}

/// DELETE /api/v1/admin/users/{id}
///
/// Deactivate an account; its history stays. Administrators cannot
/// deactivate themselves.
pub async fn deactivate_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if id == admin.user_id {
        return Err(AppError::Core(CoreError::Conflict(
            "You cannot deactivate your own account".into(),
        )));
    }
    let deactivated = UserRepo::deactivate(&state.pool, id).await?;
    if !deactivated {
        return Err(AppError::Core(CoreError::NotFound { entity: "User", id }));
    }

    AuditWriter::record(
        &state.pool,
        &admin,
        actions::DEACTIVATE_USER,
        json!({ "uid": id }),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
