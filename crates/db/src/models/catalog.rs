//! Zones, sites and ticket categories.

use gemellifix_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A campus area (building, block, wing).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Zone {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
}

/// A room or space inside a zone.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Site {
    pub id: DbId,
    pub zone_id: DbId,
    pub name: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CreateZone {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSite {
    pub zone_id: DbId,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategory {
    pub name: String,
}

/// Body of `PUT /zones/{id}` and `PUT /sites/{id}`.
#[derive(Debug, Deserialize)]
pub struct RenameCatalogEntry {
    pub name: String,
}
