//! Calendar entries: technician shifts, scheduled ticket work and tasks.

use gemellifix_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScheduleEvent {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub kind: String,
    pub technician_id: Option<DbId>,
    pub ticket_id: Option<DbId>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CreateScheduleEvent {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub kind: String,
    pub technician_id: Option<DbId>,
    pub ticket_id: Option<DbId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleQuery {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub technician_id: Option<DbId>,
}
