//! WebSocket push channel for browser clients.
//!
//! Clients connect to `/ws?token=<jwt>`; the server pushes change
//! events (the feed) and per-user notifications (the notification router).

mod feed;
mod handler;
mod heartbeat;
pub mod manager;

pub use feed::run_change_feed;
pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
