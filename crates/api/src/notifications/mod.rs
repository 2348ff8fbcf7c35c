//! Turns change events into in-app notifications.

pub mod router;

pub use router::NotificationRouter;
