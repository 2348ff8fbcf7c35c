use std::sync::Arc;

use gemellifix_core::types::{DbId, Timestamp};
use gemellifix_events::ChangeEvent;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::ws::manager::{json_message, WsManager};

/// What connected clients receive for each change: enough to know which
/// collection to refetch, nothing more.
#[derive(Debug, Serialize)]
struct ChangeFrame<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    action: &'a str,
    collection: Option<&'a str>,
    entity_id: Option<DbId>,
    actor_user_id: Option<DbId>,
    timestamp: Timestamp,
}

impl<'a> From<&'a ChangeEvent> for ChangeFrame<'a> {
    fn from(event: &'a ChangeEvent) -> Self {
        Self {
            kind: "change",
            action: &event.event_type,
            collection: event.collection.as_deref(),
            entity_id: event.entity_id,
            actor_user_id: event.actor_user_id,
            timestamp: event.timestamp,
        }
    }
}

/// Fan every bus event out to all connected clients. Returns when the bus
/// is dropped.
pub async fn run_change_feed(
    ws_manager: Arc<WsManager>,
    mut receiver: broadcast::Receiver<ChangeEvent>,
) {
    loop {
        match receiver.recv().await {
            Ok(event) => {
                if let Some(message) = json_message(&ChangeFrame::from(&event)) {
                    ws_manager.broadcast(message).await;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(skipped = n, "Change feed lagged");
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::info!("Event bus closed, change feed shutting down");
                break;
            }
        }
    }
}
