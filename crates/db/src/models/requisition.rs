//! Purchase requisitions and their line items.

use gemellifix_core::error::CoreError;
use gemellifix_core::requisition::{ItemFields, ItemFlags};
use gemellifix_core::status::RequisitionStatus;
use gemellifix_core::types::{Attachment, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Requisition {
    pub id: DbId,
    pub number: String,
    pub requester_id: DbId,
    pub requester_name: String,
    pub request_date: Timestamp,
    pub cost_center: String,
    pub description: String,
    pub attachments: Json<Vec<Attachment>>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Requisition {
    pub fn status(&self) -> Result<RequisitionStatus, CoreError> {
        self.status.parse()
    }
}

/// A `requisition_items` row. `position` keeps the submitted order.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RequisitionItem {
    pub id: DbId,
    pub requisition_id: DbId,
    pub position: i32,
    pub quantity: i32,
    pub product: String,
    pub description: String,
    pub authorized: bool,
    pub authorized_at: Option<Timestamp>,
    pub received: bool,
    pub received_at: Option<Timestamp>,
}

impl ItemFlags for RequisitionItem {
    fn authorized(&self) -> bool {
        self.authorized
    }

    fn received(&self) -> bool {
        self.received
    }
}

/// A requisition together with its ordered items.
#[derive(Debug, Clone, Serialize)]
pub struct RequisitionDetail {
    #[serde(flatten)]
    pub requisition: Requisition,
    pub items: Vec<RequisitionItem>,
}

/// Line item as submitted by a client.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRequisitionItem {
    pub quantity: i32,
    pub product: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub authorized: bool,
    #[serde(default)]
    pub received: bool,
}

impl ItemFlags for CreateRequisitionItem {
    fn authorized(&self) -> bool {
        self.authorized
    }

    fn received(&self) -> bool {
        self.received
    }
}

impl ItemFields for CreateRequisitionItem {
    fn quantity(&self) -> i32 {
        self.quantity
    }

    fn product(&self) -> &str {
        &self.product
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRequisition {
    #[serde(default)]
    pub cost_center: String,
    #[serde(default)]
    pub description: String,
    pub request_date: Option<Timestamp>,
    pub items: Vec<CreateRequisitionItem>,
}

/// Patch for one line item. `None` leaves the field unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequisitionItem {
    pub quantity: Option<i32>,
    pub product: Option<String>,
    pub description: Option<String>,
    pub authorized: Option<bool>,
    pub received: Option<bool>,
}

/// Outcome of [`RequisitionRepo::delete_item`](crate::repositories::RequisitionRepo::delete_item).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRemoval {
    Removed,
    NotFound,
    /// The item is the requisition's only one and was kept.
    LastItem,
}

#[derive(Debug, Default, Deserialize)]
pub struct RequisitionFilter {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
