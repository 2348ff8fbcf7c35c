use std::sync::Arc;

use gemellifix_ai::PromptGateway;
use gemellifix_events::EventBus;

use crate::config::ServerConfig;
use crate::storage::BlobStore;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Built once at startup and cloned per request; everything shared sits
/// behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: gemellifix_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Connected browser clients.
    pub ws_manager: Arc<WsManager>,
    /// Change events published by mutating handlers.
    pub event_bus: Arc<EventBus>,
    /// Model gateway behind the `/ai` endpoints.
    pub ai: Arc<dyn PromptGateway>,
    /// Where uploaded attachments and evidence are written.
    pub blobs: Arc<dyn BlobStore>,
}
