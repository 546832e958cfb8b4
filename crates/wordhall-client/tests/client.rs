//! Integration tests for the client session.
//!
//! A bare `TcpListener` plays the server so every byte the client sends
//! can be inspected.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use wordhall_client::{ClientConfig, ClientError, GameClient, LOADING_MASK, WELCOME_MESSAGE};
use wordhall_protocol::{ClientMessage, ServerMessage};

// =========================================================================
// Helpers
// =========================================================================

fn fast() -> ClientConfig {
    ClientConfig {
        poll_interval_ms: 20,
        ..ClientConfig::default()
    }
}

/// Connects a client named `name` to a fresh fake server.
async fn pair(name: &str) -> (GameClient, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr").to_string();
    let (client, accepted) = tokio::join!(
        GameClient::connect_with(&addr, name, fast()),
        listener.accept()
    );
    let (server, _) = accepted.expect("accept");
    (client.expect("connect"), server)
}

async fn started(name: &str) -> (GameClient, TcpStream) {
    let (mut client, mut server) = pair(name).await;
    client.start().await.expect("start");
    let join = read_client(&mut server).await;
    assert_eq!(join, ClientMessage::Join(name.to_string()));
    (client, server)
}

async fn read_client(server: &mut TcpStream) -> ClientMessage {
    tokio::time::timeout(Duration::from_secs(2), ClientMessage::read_from(server))
        .await
        .expect("client message in time")
        .expect("well-formed client message")
}

async fn push(server: &mut TcpStream, msg: ServerMessage) {
    server.write_all(&msg.encode().unwrap()).await.expect("write");
}

/// Polls `check` until it holds or two seconds pass.
async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

// =========================================================================
// start()
// =========================================================================

#[tokio::test]
async fn test_start_valid_name_lengths_succeed() {
    for name in ["Abby", "Alice", "Bartholome"] {
        let (client, _server) = started(name).await;
        assert!(client.is_operable(), "{name} should be operable");
    }
}

#[tokio::test]
async fn test_start_invalid_name_sends_nothing() {
    for name in ["Bob", "", "Maximiliano", "Ali\nce"] {
        let (mut client, mut server) = pair(name).await;
        let result = client.start().await;
        assert!(
            matches!(result, Err(ClientError::InvalidName(ref n)) if n == name),
            "{name:?} should be rejected"
        );
        assert!(!client.is_operable());

        drop(client);
        let mut received = Vec::new();
        server.read_to_end(&mut received).await.expect("read");
        assert!(received.is_empty(), "nothing may be sent for {name:?}");
    }
}

#[tokio::test]
async fn test_start_twice_already_started() {
    let (mut client, _server) = started("Alice").await;
    assert!(matches!(client.start().await, Err(ClientError::AlreadyStarted)));
}

#[tokio::test]
async fn test_send_guess_before_start_not_operable() {
    let (client, _server) = pair("Alice").await;
    assert!(matches!(client.send_guess("cat").await, Err(ClientError::NotOperable)));
}

// =========================================================================
// Read loop
// =========================================================================

#[tokio::test]
async fn test_read_loop_ping_answered_with_pong() {
    let (_client, mut server) = started("Alice").await;
    push(&mut server, ServerMessage::Ping).await;
    assert_eq!(read_client(&mut server).await, ClientMessage::Pong);
}

#[tokio::test]
async fn test_read_loop_chat_appended_trimmed_after_welcome() {
    let (client, mut server) = started("Alice").await;
    assert_eq!(client.chat_log(), vec![WELCOME_MESSAGE]);

    push(&mut server, ServerMessage::Chat("  Bob: dog \n".into())).await;
    assert!(eventually(|| client.chat_log().len() == 2).await);
    assert_eq!(client.chat_log(), vec![WELCOME_MESSAGE, "Bob: dog"]);
}

#[tokio::test]
async fn test_read_loop_lobby_replaces_roster() {
    let (client, mut server) = started("Alice").await;
    push(&mut server, ServerMessage::Lobby(vec!["Alice".into(), "N00B".into()])).await;
    push(&mut server, ServerMessage::Lobby(vec!["Alice".into(), "Bobby".into()])).await;
    assert!(eventually(|| client.lobby_roster() == ["Alice", "Bobby"]).await);
}

#[tokio::test]
async fn test_read_loop_word_replaces_loading_mask() {
    let (client, mut server) = started("Alice").await;
    assert_eq!(client.current_word_mask(), LOADING_MASK);

    push(&mut server, ServerMessage::Word("___".into())).await;
    assert!(eventually(|| client.current_word_mask() == "___").await);
}

#[tokio::test]
async fn test_read_loop_unknown_opcode_keeps_running() {
    let (client, mut server) = started("Alice").await;
    server.write_all(b"UPDT").await.unwrap();
    push(&mut server, ServerMessage::Chat("still here".into())).await;

    assert!(eventually(|| client.chat_log().len() == 2).await);
    assert!(client.is_operable());
}

#[tokio::test]
async fn test_read_loop_server_close_not_operable() {
    let (client, server) = started("Alice").await;
    drop(server);
    assert!(eventually(|| !client.is_operable()).await);
}

// =========================================================================
// UI actions
// =========================================================================

#[tokio::test]
async fn test_actions_send_expected_frames() {
    let (client, mut server) = started("Alice").await;

    client.send_guess("cat").await.unwrap();
    client.request_start().await.unwrap();
    client.request_skip().await.unwrap();
    client.send_frame(vec![1u8, 2, 3]).await.unwrap();

    assert_eq!(read_client(&mut server).await, ClientMessage::Guess("cat".into()));
    assert_eq!(read_client(&mut server).await, ClientMessage::Start);
    assert_eq!(read_client(&mut server).await, ClientMessage::Skip);
    assert_eq!(
        read_client(&mut server).await,
        ClientMessage::Frame(vec![1u8, 2, 3].into())
    );
}

#[tokio::test]
async fn test_close_shuts_connection() {
    let (mut client, mut server) = started("Alice").await;
    client.close().await.expect("close");
    assert!(!client.is_operable());

    let mut rest = Vec::new();
    server.read_to_end(&mut rest).await.expect("read");
    assert!(rest.is_empty());
}
