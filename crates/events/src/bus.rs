//! In-process change bus backed by `tokio::sync::broadcast`.

use chrono::{DateTime, Utc};
use gemellifix_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Dot-separated event names. The part before the dot is the collection.
pub mod event_types {
    pub const TICKET_CREATED: &str = "ticket.created";
    pub const TICKET_UPDATED: &str = "ticket.updated";
    pub const TICKET_STATUS_CHANGED: &str = "ticket.status_changed";
    /// Payload carries `assignee_ids` (the full new list) and
    /// `added_assignee_ids` (only the newly assigned technicians).
    pub const TICKET_ASSIGNED: &str = "ticket.assigned";
    pub const REQUISITION_CREATED: &str = "requisition.created";
    pub const REQUISITION_UPDATED: &str = "requisition.updated";
    pub const SCHEDULE_CHANGED: &str = "schedule.changed";
    pub const USER_CREATED: &str = "user.created";
    pub const USER_UPDATED: &str = "user.updated";
    /// Published with the collection (`zones` or `sites`) set on the event.
    pub const CATALOG_UPDATED: &str = "catalog.updated";
}

/// Something changed in a stored collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub event_type: String,
    pub collection: Option<String>,
    pub entity_id: Option<DbId>,
    pub actor_user_id: Option<DbId>,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            collection: None,
            entity_id: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach the changed row.
    pub fn on(mut self, collection: impl Into<String>, entity_id: DbId) -> Self {
        self.collection = Some(collection.into());
        self.entity_id = Some(entity_id);
        self
    }

    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Ids listed under `key` in the payload; empty when absent or malformed.
    pub fn payload_ids(&self, key: &str) -> Vec<DbId> {
        self.payload
            .get(key)
            .and_then(|v| v.as_array())
            .map(|ids| ids.iter().filter_map(|v| v.as_i64()).collect())
            .unwrap_or_default()
    }
}

const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out bus shared as `Arc<EventBus>`.
///
/// Slow receivers that fall more than the channel capacity behind observe
/// `RecvError::Lagged` and skip ahead.
pub struct EventBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to every current subscriber. With no subscribers the event is
    /// dropped.
    pub fn publish(&self, event: ChangeEvent) {
        tracing::trace!(event_type = %event.event_type, entity_id = ?event.entity_id, "Publishing change");
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
