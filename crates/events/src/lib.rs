//! Change feed for GemelliFix.
//!
//! Every mutation the API commits is announced as a [`ChangeEvent`] on the
//! in-process [`EventBus`]. The WebSocket layer relays them to connected
//! clients and the notification router turns assignments into inbox entries.

pub mod bus;

pub use bus::{event_types, ChangeEvent, EventBus};
