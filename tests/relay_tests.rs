/// Relay routing tests
/// Tests connection bindings, message fan-out, and dispatcher behavior
use mls_relay_server::dispatch::dispatch;
use mls_relay_server::error::ErrorKind;
use mls_relay_server::protocol::{MessageType, Request, ServerMessage};
use mls_relay_server::registry::{ConnectionHandle, Registries};
use mls_relay_server::router;

fn parse(line: String) -> ServerMessage {
    serde_json::from_str(&line).expect("Bad JSON on channel")
}

#[tokio::test]
async fn test_connection_lifecycle() {
    let registries = Registries::new();

    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let conn = ConnectionHandle::new(tx);

    registries.connections.bind("client1", &conn).await;
    assert!(registries.connections.lookup("client1").await.is_some());

    registries.connections.unbind_on_close(conn.conn_id()).await;
    assert!(registries.connections.lookup("client1").await.is_none());
}

#[tokio::test]
async fn test_relay_fan_out_excludes_sender() {
    let registries = Registries::new();

    let (tx1, mut rx1) = tokio::sync::mpsc::unbounded_channel();
    let (tx2, mut rx2) = tokio::sync::mpsc::unbounded_channel();
    let (tx3, mut rx3) = tokio::sync::mpsc::unbounded_channel();

    let alice = ConnectionHandle::new(tx1);
    let bob = ConnectionHandle::new(tx2);
    let carol = ConnectionHandle::new(tx3);

    registries.connections.bind("alice", &alice).await;
    registries.connections.bind("bob", &bob).await;
    registries.connections.bind("carol", &carol).await;

    registries.groups.create("group1", "alice").await.unwrap();
    registries.groups.join("group1", "bob").await.unwrap();
    registries.groups.join("group1", "carol").await.unwrap();

    let receipt = router::relay(
        &registries,
        "group1",
        "alice",
        MessageType::Application,
        vec![9, 9],
    )
    .await
    .expect("Relay failed");

    assert_eq!(receipt.delivered, 2);
    assert_eq!(receipt.recipients, 2);

    // Both other members receive the forward
    for rx in [&mut rx2, &mut rx3] {
        let forwarded = parse(rx.recv().await.expect("No forward received"));
        assert_eq!(
            forwarded,
            ServerMessage::Forward {
                sender: "alice".to_string(),
                message_type: MessageType::Application,
                payload: vec![9, 9],
            }
        );
    }

    // The sender does not receive its own message
    let timeout_result = tokio::time::timeout(
        std::time::Duration::from_millis(100),
        rx1.recv(),
    )
    .await;
    assert!(timeout_result.is_err()); // Timeout indicates no message received
}

#[tokio::test]
async fn test_relay_does_not_cross_groups() {
    let registries = Registries::new();

    let (tx1, _rx1) = tokio::sync::mpsc::unbounded_channel();
    let (tx2, mut rx2) = tokio::sync::mpsc::unbounded_channel();

    let alice = ConnectionHandle::new(tx1);
    let bob = ConnectionHandle::new(tx2);
    registries.connections.bind("alice", &alice).await;
    registries.connections.bind("bob", &bob).await;

    registries.groups.create("group1", "alice").await.unwrap();
    registries.groups.create("group2", "bob").await.unwrap();

    router::relay(&registries, "group1", "alice", MessageType::Commit, vec![1])
        .await
        .expect("Relay failed");

    // Bob is not in group1 and should see nothing
    let timeout_result = tokio::time::timeout(
        std::time::Duration::from_millis(100),
        rx2.recv(),
    )
    .await;
    assert!(timeout_result.is_err());
}

#[tokio::test]
async fn test_disconnected_member_is_skipped() {
    let registries = Registries::new();

    let (tx1, _rx1) = tokio::sync::mpsc::unbounded_channel();
    let (tx2, _rx2) = tokio::sync::mpsc::unbounded_channel();

    let alice = ConnectionHandle::new(tx1);
    let bob = ConnectionHandle::new(tx2);
    registries.connections.bind("alice", &alice).await;
    registries.connections.bind("bob", &bob).await;

    registries.groups.create("group1", "alice").await.unwrap();
    registries.groups.join("group1", "bob").await.unwrap();

    // Bob disconnects; his binding goes away but his membership stays
    registries.connections.unbind_on_close(bob.conn_id()).await;

    let receipt = router::relay(
        &registries,
        "group1",
        "alice",
        MessageType::Application,
        vec![5],
    )
    .await
    .expect("Relay failed");

    assert_eq!(receipt.delivered, 0);
    assert_eq!(receipt.recipients, 1);
    assert!(registries.groups.is_member("group1", "bob").await.unwrap());
}

#[tokio::test]
async fn test_rebind_routes_through_latest_connection() {
    let registries = Registries::new();

    let (old_tx, mut old_rx) = tokio::sync::mpsc::unbounded_channel();
    let (new_tx, mut new_rx) = tokio::sync::mpsc::unbounded_channel();
    let (sender_tx, _sender_rx) = tokio::sync::mpsc::unbounded_channel();

    let bob_old = ConnectionHandle::new(old_tx);
    let bob_new = ConnectionHandle::new(new_tx);
    let alice = ConnectionHandle::new(sender_tx);

    registries.connections.bind("alice", &alice).await;
    registries.connections.bind("bob", &bob_old).await;
    registries.connections.bind("bob", &bob_new).await;

    registries.groups.create("group1", "alice").await.unwrap();
    registries.groups.join("group1", "bob").await.unwrap();

    router::relay(&registries, "group1", "alice", MessageType::Welcome, vec![3])
        .await
        .expect("Relay failed");

    // Only the most recent connection receives the forward
    assert!(matches!(
        parse(new_rx.recv().await.expect("No forward received")),
        ServerMessage::Forward { .. }
    ));
    let timeout_result = tokio::time::timeout(
        std::time::Duration::from_millis(100),
        old_rx.recv(),
    )
    .await;
    assert!(timeout_result.is_err());
}

#[tokio::test]
async fn test_dispatch_full_conversation() {
    let registries = Registries::new();

    let (alice_tx, _alice_rx) = tokio::sync::mpsc::unbounded_channel();
    let (bob_tx, mut bob_rx) = tokio::sync::mpsc::unbounded_channel();
    let alice = ConnectionHandle::new(alice_tx);
    let bob = ConnectionHandle::new(bob_tx);

    // Alice stores a key package and creates a group
    let response = dispatch(
        Request::StoreKeyPackage {
            client_id: "alice".to_string(),
            key_package: vec![1, 2, 3],
        },
        &registries,
        &alice,
    )
    .await;
    assert!(matches!(response, ServerMessage::Ack { success: true, .. }));

    let response = dispatch(
        Request::CreateGroup {
            group_id: "g1".to_string(),
            creator_id: "alice".to_string(),
        },
        &registries,
        &alice,
    )
    .await;
    assert_eq!(
        response,
        ServerMessage::Group {
            group_id: "g1".to_string(),
            members: vec!["alice".to_string()],
        }
    );

    // Bob joins from his own connection; dispatch binds him automatically
    let response = dispatch(
        Request::JoinGroup {
            group_id: "g1".to_string(),
            client_id: "bob".to_string(),
        },
        &registries,
        &bob,
    )
    .await;
    assert_eq!(
        response,
        ServerMessage::Group {
            group_id: "g1".to_string(),
            members: vec!["alice".to_string(), "bob".to_string()],
        }
    );

    // Alice relays; bob's connection receives the forward
    let response = dispatch(
        Request::RelayMessage {
            group_id: "g1".to_string(),
            sender_id: "alice".to_string(),
            message: vec![9, 9],
            message_type: MessageType::Application,
        },
        &registries,
        &alice,
    )
    .await;
    assert_eq!(
        response,
        ServerMessage::Relayed {
            group_id: "g1".to_string(),
            delivered: 1,
            recipients: 1,
        }
    );

    let forwarded = parse(bob_rx.recv().await.expect("No forward received"));
    assert_eq!(
        forwarded,
        ServerMessage::Forward {
            sender: "alice".to_string(),
            message_type: MessageType::Application,
            payload: vec![9, 9],
        }
    );
}

#[tokio::test]
async fn test_dispatch_error_kinds() {
    let registries = Registries::new();

    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let conn = ConnectionHandle::new(tx);

    let response = dispatch(
        Request::JoinGroup {
            group_id: "nope".to_string(),
            client_id: "dan".to_string(),
        },
        &registries,
        &conn,
    )
    .await;
    match response {
        ServerMessage::Error { kind, .. } => assert_eq!(kind, ErrorKind::NotFound),
        other => panic!("Expected NotFound error, got {:?}", other),
    }

    registries.groups.create("g1", "alice").await.unwrap();
    let response = dispatch(
        Request::CreateGroup {
            group_id: "g1".to_string(),
            creator_id: "bob".to_string(),
        },
        &registries,
        &conn,
    )
    .await;
    match response {
        ServerMessage::Error { kind, .. } => assert_eq!(kind, ErrorKind::AlreadyExists),
        other => panic!("Expected AlreadyExists error, got {:?}", other),
    }
}
