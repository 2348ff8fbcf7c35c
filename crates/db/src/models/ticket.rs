//! Maintenance ticket model and DTOs.

use gemellifix_core::error::CoreError;
use gemellifix_core::status::{TicketPriority, TicketStatus};
use gemellifix_core::ticket::TicketParties;
use gemellifix_core::types::{Attachment, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A `tickets` row.
///
/// Zone, site, category and requester names are copied in at creation so the
/// ticket keeps reading the same after the catalog changes.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Ticket {
    pub id: DbId,
    pub code: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub zone: String,
    pub site: String,
    pub priority: String,
    pub status: String,
    pub requester_id: DbId,
    pub requester_name: String,
    pub assignee_ids: Vec<DbId>,
    pub assignee_names: Vec<String>,
    pub attachments: Json<Vec<Attachment>>,
    pub evidence: Json<Vec<Attachment>>,
    pub created_at: Timestamp,
    pub due_date: Timestamp,
    pub resolved_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

impl Ticket {
    pub fn status(&self) -> Result<TicketStatus, CoreError> {
        self.status.parse()
    }

    pub fn priority(&self) -> Result<TicketPriority, CoreError> {
        self.priority.parse()
    }

    pub fn parties(&self) -> TicketParties<'_> {
        TicketParties {
            requester_id: self.requester_id,
            assignee_ids: &self.assignee_ids,
        }
    }
}

/// Insert input, fully resolved by the handler (names looked up, code and
/// due date computed).
#[derive(Debug)]
pub struct CreateTicket {
    pub code: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub zone: String,
    pub site: String,
    pub priority: TicketPriority,
    pub requester_id: DbId,
    pub requester_name: String,
    pub attachments: Vec<Attachment>,
    pub created_at: Timestamp,
    pub due_date: Timestamp,
}

/// List filters. `visible_to` restricts to tickets the user requested or is
/// assigned to; `None` lists everything.
#[derive(Debug, Default, Deserialize)]
pub struct TicketFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(skip)]
    pub visible_to: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
