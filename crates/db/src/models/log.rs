//! Audit log rows. Write-once: there is no update DTO.

use gemellifix_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LogEntry {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub user_name: String,
    pub user_email: String,
    pub action: String,
    pub details: serde_json::Value,
    pub ticket_id: Option<DbId>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateLogEntry {
    pub user_id: Option<DbId>,
    pub user_name: String,
    pub user_email: String,
    pub action: String,
    pub details: serde_json::Value,
    pub ticket_id: Option<DbId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    pub action: Option<String>,
    pub ticket_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
