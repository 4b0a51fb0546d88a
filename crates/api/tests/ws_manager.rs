//! Unit tests for `WsManager`, without any HTTP upgrade.

use axum::extract::ws::Message;
use encodrop_api::ws::WsManager;

#[tokio::test]
async fn add_and_remove_track_connection_count() {
    let manager = WsManager::new();
    assert_eq!(manager.connection_count().await, 0);

    let _rx1 = manager.add("conn-1".to_string()).await;
    let _rx2 = manager.add("conn-2".to_string()).await;
    assert_eq!(manager.connection_count().await, 2);

    manager.remove("conn-1").await;
    manager.remove("nonexistent").await;
    assert_eq!(manager.connection_count().await, 1);
}

#[tokio::test]
async fn broadcast_reaches_every_open_connection() {
    let manager = WsManager::new();
    let mut rx1 = manager.add("conn-1".to_string()).await;
    let mut rx2 = manager.add("conn-2".to_string()).await;

    let delivered = manager
        .broadcast(Message::Text(r#"{"type":"job_running","index":0}"#.into()))
        .await;
    assert_eq!(delivered, 2);

    for rx in [&mut rx1, &mut rx2] {
        match rx.recv().await {
            Some(Message::Text(text)) => assert!(text.as_str().contains("job_running")),
            other => panic!("expected a text frame, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn broadcast_skips_closed_channels() {
    let manager = WsManager::new();
    let rx1 = manager.add("conn-1".to_string()).await;
    let _rx2 = manager.add("conn-2".to_string()).await;
    drop(rx1);

    let delivered = manager.broadcast(Message::Text("x".into())).await;
    assert_eq!(delivered, 1);
}

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let manager = WsManager::new();
    let mut rx1 = manager.add("conn-1".to_string()).await;
    let mut rx2 = manager.add("conn-2".to_string()).await;

    manager.shutdown_all().await;
    assert_eq!(manager.connection_count().await, 0);

    assert!(matches!(rx1.recv().await, Some(Message::Close(None))));
    assert!(matches!(rx2.recv().await, Some(Message::Close(None))));
}

#[tokio::test]
async fn ping_all_sends_ping_frames() {
    let manager = WsManager::new();
    let mut rx = manager.add("conn-1".to_string()).await;

    manager.ping_all().await;

    assert!(matches!(rx.recv().await, Some(Message::Ping(_))));
}
