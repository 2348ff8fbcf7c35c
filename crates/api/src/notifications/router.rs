//! Event-to-notification routing.
//!
//! [`NotificationRouter`] subscribes to the event bus, decides who should
//! hear about each event, stores a notification row per recipient and pushes
//! it to that user's open sockets.

use std::sync::Arc;

use gemellifix_core::status::{NotificationKind, TicketStatus};
use gemellifix_core::types::DbId;
use gemellifix_db::models::notification::{CreateNotification, Notification};
use gemellifix_db::repositories::NotificationRepo;
use gemellifix_db::DbPool;
use gemellifix_events::{event_types, ChangeEvent};
use serde_json::json;
use tokio::sync::broadcast;

use crate::ws::manager::json_message;
use crate::ws::WsManager;

pub struct NotificationRouter {
    pool: DbPool,
    ws_manager: Arc<WsManager>,
}

/// A notification to deliver, before it has recipients.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub title: String,
    pub description: String,
    pub kind: NotificationKind,
    pub link: Option<String>,
}

fn payload_str<'a>(event: &'a ChangeEvent, key: &str) -> &'a str {
    event.payload.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

fn ticket_link(event: &ChangeEvent) -> Option<String> {
    event.entity_id.map(|id| format!("/tickets/{id}"))
}

/// Recipients and content for `event`, or `None` when nobody is notified.
///
/// - `ticket.assigned`: every newly added technician.
/// - `ticket.status_changed` into `Requiere Aprobación`: the requester.
pub fn plan(event: &ChangeEvent) -> Option<(Vec<DbId>, Draft)> {
    let title = payload_str(event, "title");
    let code = payload_str(event, "code");

    match event.event_type.as_str() {
        event_types::TICKET_ASSIGNED => {
            let targets = event.payload_ids("added_assignee_ids");
            if targets.is_empty() {
                return None;
            }
            Some((
                targets,
                Draft {
                    title: "Nuevo Ticket Asignado".into(),
                    description: format!("Se te ha asignado el ticket: \"{title}\" ({code})"),
                    kind: NotificationKind::Ticket,
                    link: ticket_link(event),
                },
            ))
        }
        event_types::TICKET_STATUS_CHANGED => {
            if payload_str(event, "to") != TicketStatus::RequiresApproval.as_str() {
                return None;
            }
            let requester = event.payload.get("requester_id").and_then(|v| v.as_i64())?;
            Some((
                vec![requester],
                Draft {
                    title: "Ticket Requiere Aprobación".into(),
                    description: format!(
                        "El trabajo del ticket \"{title}\" ({code}) está listo para tu revisión"
                    ),
                    kind: NotificationKind::Ticket,
                    link: ticket_link(event),
                },
            ))
        }
        _ => None,
    }
}

impl NotificationRouter {
    pub fn new(pool: DbPool, ws_manager: Arc<WsManager>) -> Self {
        Self { pool, ws_manager }
    }

    /// Process events until the bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<ChangeEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.route_event(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to route event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    async fn route_event(&self, event: &ChangeEvent) -> Result<(), sqlx::Error> {
        let Some((targets, draft)) = plan(event) else {
            return Ok(());
        };

        for user_id in targets {
            let input = CreateNotification {
                user_id,
                title: draft.title.clone(),
                description: draft.description.clone(),
                kind: draft.kind,
                link: draft.link.clone(),
            };
            let notification = NotificationRepo::create(&self.pool, &input).await?;
            self.push(&notification).await;
        }
        Ok(())
    }

    async fn push(&self, notification: &Notification) {
        let frame = json!({
            "type": "notification",
            "notification": notification,
        });
        if let Some(message) = json_message(&frame) {
            let delivered = self
                .ws_manager
                .send_to_user(notification.user_id, message)
                .await;
            tracing::debug!(user_id = notification.user_id, delivered, "Pushed notification");
        }
    }
}
