//! Audit log writer.
//!
//! Every state-changing operation records who did what. Recording is
//! best-effort: a failed insert is reported on the operator channel and the
//! caller's operation still succeeds.

use gemellifix_core::audit::{is_known_action, redact_sensitive_fields};
use gemellifix_core::types::DbId;
use gemellifix_db::models::log::CreateLogEntry;
use gemellifix_db::repositories::LogRepo;
use gemellifix_db::DbPool;
use serde_json::Value;

use crate::middleware::auth::AuthUser;

/// Tracing target for failures an operator has to look at.
pub const OPERATOR_TARGET: &str = "gemellifix::operator";

/// Identity stamped on an entry.
#[derive(Debug, Clone)]
pub struct AuditActor {
    pub user_id: Option<DbId>,
    pub name: String,
    pub email: String,
}

impl From<&AuthUser> for AuditActor {
    fn from(user: &AuthUser) -> Self {
        Self {
            user_id: Some(user.user_id),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

pub struct AuditWriter;

impl AuditWriter {
    /// Persist one entry with a server-assigned timestamp.
    ///
    /// Sensitive keys in `details` are redacted first. A numeric `ticket_id`
    /// key links the entry to that ticket's history.
    pub async fn record(
        pool: &DbPool,
        actor: impl Into<AuditActor>,
        action: &str,
        details: Value,
    ) {
        let actor = actor.into();
        if !is_known_action(action) {
            tracing::warn!(action, "Recording unregistered audit action");
        }
        let ticket_id = details.get("ticket_id").and_then(Value::as_i64);
        let entry = CreateLogEntry {
            user_id: actor.user_id,
            user_name: actor.name,
            user_email: actor.email,
            action: action.to_string(),
            details: redact_sensitive_fields(&details),
            ticket_id,
        };

        if let Err(e) = LogRepo::insert(pool, &entry).await {
            tracing::error!(
                target: OPERATOR_TARGET,
                error = %e,
                action,
                user_id = ?entry.user_id,
                "Failed to write audit log entry"
            );
        }
    }
}
