//! `WsManager` and the change feed, without HTTP upgrades.

use std::sync::Arc;

use axum::extract::ws::Message;
use gemellifix_api::ws::{run_change_feed, WsManager};
use gemellifix_events::{event_types, ChangeEvent, EventBus};

#[tokio::test]
async fn add_and_remove_track_connection_count() {
    let manager = WsManager::new();
    assert_eq!(manager.connection_count().await, 0);

    let _rx = manager.add("conn-1".to_string(), 1).await;
    let _rx2 = manager.add("conn-2".to_string(), 2).await;
    assert_eq!(manager.connection_count().await, 2);

    manager.remove("conn-1").await;
    manager.remove("unknown").await;
    assert_eq!(manager.connection_count().await, 1);
}

#[tokio::test]
async fn send_to_user_reaches_only_that_users_sockets() {
    let manager = WsManager::new();
    let mut phone = manager.add("phone".to_string(), 7).await;
    let mut laptop = manager.add("laptop".to_string(), 7).await;
    let mut other = manager.add("other".to_string(), 8).await;

    let delivered = manager
        .send_to_user(7, Message::Text("hola".into()))
        .await;

    assert_eq!(delivered, 2);
    assert!(matches!(phone.try_recv(), Ok(Message::Text(t)) if t.as_str() == "hola"));
    assert!(matches!(laptop.try_recv(), Ok(Message::Text(_))));
    assert!(other.try_recv().is_err());
}

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let manager = WsManager::new();
    let mut rx = manager.add("conn".to_string(), 1).await;

    manager.shutdown_all().await;

    assert!(matches!(rx.try_recv(), Ok(Message::Close(None))));
    assert_eq!(manager.connection_count().await, 0);
}

#[tokio::test]
async fn ping_all_sends_ping_frames() {
    let manager = WsManager::new();
    let mut rx = manager.add("conn".to_string(), 1).await;

    manager.ping_all().await;

    assert!(matches!(rx.try_recv(), Ok(Message::Ping(_))));
}

#[tokio::test]
async fn change_feed_relays_events_as_json_frames() {
    let manager = Arc::new(WsManager::new());
    let mut rx = manager.add("conn".to_string(), 1).await;
    let bus = EventBus::default();
    let feed = tokio::spawn(run_change_feed(Arc::clone(&manager), bus.subscribe()));

    bus.publish(
        ChangeEvent::new(event_types::TICKET_CREATED)
            .on("tickets", 42)
            .with_actor(1),
    );
    drop(bus);
    feed.await.unwrap();

    let Ok(Message::Text(text)) = rx.try_recv() else {
        panic!("expected a text frame");
    };
    let frame: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
    assert_eq!(frame["type"], "change");
    assert_eq!(frame["action"], "ticket.created");
    assert_eq!(frame["collection"], "tickets");
    assert_eq!(frame["entity_id"], 42);
}
