//! In-app notification model.

use gemellifix_core::status::NotificationKind;
use gemellifix_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub description: String,
    pub kind: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub user_id: DbId,
    pub title: String,
    pub description: String,
    pub kind: NotificationKind,
    pub link: Option<String>,
}
