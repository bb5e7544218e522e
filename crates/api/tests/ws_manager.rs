//! Unit tests for `WsManager`.
//!
//! These tests exercise the WebSocket connection manager directly, without
//! performing any HTTP upgrades. They verify add/remove semantics, job
//! update delivery (owner + watchers), and graceful shutdown behaviour.

use axum::extract::ws::Message;
use gala_api::ws::WsManager;

// ---------------------------------------------------------------------------
// Test: new manager starts with zero connections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_manager_has_zero_connections() {
    let manager = WsManager::new();

    assert_eq!(manager.connection_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: add() / remove() adjust the connection count
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_and_remove_adjust_connection_count() {
    let manager = WsManager::new();

    let _rx = manager.add("conn-1".to_string(), 1).await;
    assert_eq!(manager.connection_count().await, 1);

    manager.remove("conn-1").await;
    assert_eq!(manager.connection_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: remove() with unknown ID is a no-op
// ---------------------------------------------------------------------------

#[tokio::test]
async fn remove_unknown_id_is_noop() {
    let manager = WsManager::new();

    let _rx = manager.add("conn-1".to_string(), 1).await;
    manager.remove("nonexistent").await;

    assert_eq!(manager.connection_count().await, 1);
}

// ---------------------------------------------------------------------------
// Test: job updates reach the owner's connections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn job_update_reaches_owner_connections() {
    let manager = WsManager::new();

    let mut owner_rx = manager.add("owner-conn".to_string(), 7).await;
    let mut other_rx = manager.add("other-conn".to_string(), 8).await;

    let delivered = manager
        .send_job_update(7, 99, Message::Text("progress".into()))
        .await;
    assert_eq!(delivered, 1);

    let msg = owner_rx.recv().await.expect("owner should receive update");
    assert!(matches!(&msg, Message::Text(t) if *t == "progress"));

    // The other user got nothing.
    assert!(other_rx.try_recv().is_err());
}

// ---------------------------------------------------------------------------
// Test: watchers receive updates for jobs they do not own
// ---------------------------------------------------------------------------

#[tokio::test]
async fn watcher_receives_updates_for_watched_job() {
    let manager = WsManager::new();

    let mut watcher_rx = manager.add("watcher-conn".to_string(), 8).await;
    manager.watch_job("watcher-conn", 99).await;

    let delivered = manager
        .send_job_update(7, 99, Message::Text("watched".into()))
        .await;
    assert_eq!(delivered, 1);

    let msg = watcher_rx.recv().await.expect("watcher should receive update");
    assert!(matches!(&msg, Message::Text(t) if *t == "watched"));

    // Unwatching stops delivery.
    manager.unwatch_job("watcher-conn", 99).await;
    let delivered = manager
        .send_job_update(7, 99, Message::Text("gone".into()))
        .await;
    assert_eq!(delivered, 0);
}

// ---------------------------------------------------------------------------
// Test: send_to_user targets every connection of one user
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_to_user_targets_all_user_connections() {
    let manager = WsManager::new();

    let mut rx1 = manager.add("tab-1".to_string(), 5).await;
    let mut rx2 = manager.add("tab-2".to_string(), 5).await;
    let mut other = manager.add("tab-3".to_string(), 6).await;

    let count = manager.send_to_user(5, Message::Text("hi".into())).await;
    assert_eq!(count, 2);

    assert!(rx1.recv().await.is_some());
    assert!(rx2.recv().await.is_some());
    assert!(other.try_recv().is_err());
}

// ---------------------------------------------------------------------------
// Test: shutdown_all() sends Close and clears all connections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let manager = WsManager::new();

    let mut rx1 = manager.add("conn-1".to_string(), 1).await;
    let mut rx2 = manager.add("conn-2".to_string(), 2).await;
    assert_eq!(manager.connection_count().await, 2);

    manager.shutdown_all().await;

    // Connection count should be zero after shutdown.
    assert_eq!(manager.connection_count().await, 0);

    // Both receivers should have received a Close message.
    let msg1 = rx1.recv().await.expect("rx1 should receive Close");
    assert!(
        matches!(msg1, Message::Close(None)),
        "Expected Close(None), got: {msg1:?}"
    );

    let msg2 = rx2.recv().await.expect("rx2 should receive Close");
    assert!(
        matches!(msg2, Message::Close(None)),
        "Expected Close(None), got: {msg2:?}"
    );

    // After Close, the channel should be closed (no more messages).
    assert!(
        rx1.recv().await.is_none(),
        "Channel should be closed after shutdown"
    );
}

// ---------------------------------------------------------------------------
// Test: delivery skips closed channels without panicking
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delivery_skips_closed_channels() {
    let manager = WsManager::new();

    let rx1 = manager.add("conn-1".to_string(), 5).await;
    let mut rx2 = manager.add("conn-2".to_string(), 5).await;

    // Drop rx1 to close its channel.
    drop(rx1);

    // Delivery should not panic even though conn-1's channel is closed.
    manager.send_to_user(5, Message::Text("still alive".into())).await;

    let msg = rx2.recv().await.expect("rx2 should receive message");
    assert!(matches!(&msg, Message::Text(t) if *t == "still alive"));
}

// ---------------------------------------------------------------------------
// Test: adding with duplicate ID replaces the previous connection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_id_replaces_previous_connection() {
    let manager = WsManager::new();

    let _rx_old = manager.add("conn-1".to_string(), 1).await;
    assert_eq!(manager.connection_count().await, 1);

    // Re-add with the same ID -- should replace, not duplicate.
    let mut rx_new = manager.add("conn-1".to_string(), 1).await;
    assert_eq!(manager.connection_count().await, 1);

    manager.send_to_user(1, Message::Text("replaced".into())).await;
    let msg = rx_new.recv().await.expect("New rx should receive message");
    assert!(matches!(&msg, Message::Text(t) if *t == "replaced"));
}
