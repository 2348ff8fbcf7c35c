//! Handlers for the `/auth` resource (login, current user, own profile).

use axum::extract::{Multipart, State};
use axum::Json;
use gemellifix_core::audit::actions;
use gemellifix_core::error::CoreError;
use gemellifix_core::storage::{avatar_prefix, validate_avatar};
use gemellifix_core::validation::{require_text, validate_password};
use gemellifix_db::models::user::{UpdateUser, User, UserResponse};
use gemellifix_db::repositories::UserRepo;
use gemellifix_events::{event_types, ChangeEvent};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::audit::{AuditActor, AuditWriter};
use crate::auth::jwt::{generate_access_token, TokenSubject};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::AppJson;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::upload::{read_form, store_files, FILE_FIELD};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

/// Body of `PUT /auth/me`. A password change needs the current password.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized("Invalid email or password".into()))
}

/// POST /api/v1/auth/login
///
/// Exchange email + password for an access token.
pub async fn login(
    State(state): State<AppState>,
    AppJson(input): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = UserRepo::find_by_email(&state.pool, &input.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        return Err(invalid_credentials());
    }

    let access_token = generate_access_token(
        TokenSubject {
            user_id: user.id,
            role: &user.role,
            name: &user.name,
            email: &user.email,
        },
        &state.config.jwt,
    )
    .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    AuditWriter::record(
        &state.pool,
        AuditActor {
            user_id: Some(user.id),
            name: user.name.clone(),
            email: user.email.clone(),
        },
        actions::LOGIN,
        json!({ "role": user.role }),
    )
    .await;

    Ok(Json(AuthResponse {
        access_token,
        token_type: "Bearer",
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
        user: user.into(),
    }))
}

async fn current_user(state: &AppState, auth: &AuthUser) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))
}

fn publish_profile_change(state: &AppState, user: &User, fields: &[&str]) {
    state.event_bus.publish(
        ChangeEvent::new(event_types::USER_UPDATED)
            .on("users", user.id)
            .with_actor(user.id)
            .with_payload(json!({ "fields": fields })),
    );
}

/// GET /api/v1/auth/me
pub async fn me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = current_user(&state, &auth).await?;
    Ok(Json(DataResponse { data: user.into() }))
}

/// PUT /api/v1/auth/me
///
/// Change the caller's display name and/or password. Email and role are
/// managed by administrators. Tokens already issued keep the old name until
/// they expire.
pub async fn update_me(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let name = input
        .name
        .as_deref()
        .map(|n| require_text("name", n))
        .transpose()?;
    if name.is_none() && input.new_password.is_none() {
        return Err(AppError::BadRequest("Nothing to update".into()));
    }

    let mut user = current_user(&state, &auth).await?;
    let mut fields = Vec::new();

    if let Some(new_password) = input.new_password.as_deref() {
        let current = input.current_password.as_deref().ok_or_else(|| {
            AppError::Core(CoreError::validation(
                "current_password is required to change the password",
            ))
        })?;
        let matches = verify_password(current, &user.password_hash)
            .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
        if !matches {
            return Err(AppError::Core(CoreError::validation(
                "Current password is incorrect",
            )));
        }
        validate_password(new_password)?;
        let password_hash = hash_password(new_password)
            .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
        UserRepo::set_password_hash(&state.pool, user.id, &password_hash).await?;
        fields.push("password");
    }

    if let Some(name) = name {
        user = UserRepo::update(
            &state.pool,
            user.id,
            &UpdateUser {
                name: Some(name.to_string()),
                role: None,
            },
        )
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;
        fields.push("name");
    }

    tracing::info!(user_id = user.id, fields = ?fields, "Profile updated");
    AuditWriter::record(
        &state.pool,
        &auth,
        actions::UPDATE_PROFILE,
        json!({ "uid": user.id, "name": user.name, "fields": fields }),
    )
    .await;
    publish_profile_change(&state, &user, &fields);

    Ok(Json(DataResponse { data: user.into() }))
}

/// POST /api/v1/auth/me/avatar (multipart, one image in the `file` part)
///
/// Stored under `avatars/{uid}/`; the user's avatar becomes the new URL.
/// Earlier pictures stay in the blob store.
pub async fn upload_avatar(
    auth: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let form = read_form(multipart).await?;
    let [file] = form.files.as_slice() else {
        return Err(AppError::BadRequest(format!(
            "Exactly one '{FILE_FIELD}' part is required"
        )));
    };
    validate_avatar(&file.content_type, file.bytes.len())?;

    let stored = store_files(
        state.blobs.as_ref(),
        &avatar_prefix(auth.user_id),
        std::slice::from_ref(file),
    )
    .await?;
    let url = stored
        .into_iter()
        .next()
        .map(|a| a.url)
        .ok_or_else(|| AppError::InternalError("Avatar was not stored".into()))?;

    let user = UserRepo::set_avatar(&state.pool, auth.user_id, &url)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;

    AuditWriter::record(
        &state.pool,
        &auth,
        actions::UPDATE_PROFILE,
        json!({ "uid": user.id, "fields": ["avatar"], "avatar": url }),
    )
    .await;
    publish_profile_change(&state, &user, &["avatar"]);

    Ok(Json(DataResponse { data: user.into() }))
}
