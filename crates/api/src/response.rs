//! Shared response envelope types for API handlers.
//!
//! Every successful response body is `{ "data": ... }`.

use gemellifix_core::types::DbId;
use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Body of `201 Created` answers to account creation.
#[derive(Debug, Serialize)]
pub struct CreatedUid {
    pub uid: DbId,
}
