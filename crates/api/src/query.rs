//! Shared query and body extractors.

use axum::extract::FromRequest;
use serde::Deserialize;

use crate::error::AppError;

/// Generic pagination parameters (`?limit=&offset=`). Clamped in the
/// repository layer.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `axum::Json` whose rejection (malformed body, wrong content type) is an
/// [`AppError`], so it renders as the usual `{ "error", "code" }` 400.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
