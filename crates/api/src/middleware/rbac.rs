//! Role extractors.
//!
//! Each wraps [`AuthUser`] and rejects callers whose role falls short with
//! 403, so a handler's signature states who may call it.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use gemellifix_core::error::CoreError;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `Administrador` role.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.role.is_admin() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}

/// Requires a role that oversees every ticket: `Administrador` or the
/// read-only `SST`.
pub struct RequireOversight(pub AuthUser);

impl FromRequestParts<AppState> for RequireOversight {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.role.sees_all_tickets() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin or SST role required".into(),
            )));
        }
        Ok(RequireOversight(user))
    }
}

/// Requires any authenticated user. Same as [`AuthUser`], named for intent.
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(RequireAuth(user))
    }
}
