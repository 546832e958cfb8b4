//! Integration tests for the Wordhall server: real loopback sockets, real
//! clients, short timings.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use wordhall::prelude::*;
use wordhall_round::{NOT_RUNNING_NOTICE, SKIP_NOT_RUNNING_NOTICE};

// =========================================================================
// Helpers
// =========================================================================

fn quiet_liveness() -> LivenessConfig {
    LivenessConfig {
        ping_interval_ms: 60_000,
        roster_interval_ms: 0,
        ..LivenessConfig::default()
    }
}

async fn spawn_server(
    words: &[&str],
    liveness: LivenessConfig,
) -> (ServerHandle<WordList>, String, JoinHandle<Result<(), WordhallError>>) {
    let server = WordhallServerBuilder::new()
        .bind("127.0.0.1:0")
        .session_config(SessionConfig {
            poll_interval_ms: 20,
            ..SessionConfig::default()
        })
        .liveness_config(liveness)
        .build(WordList::new(words.iter().copied()))
        .await
        .expect("server should bind");
    let addr = server.local_addr().expect("local addr").to_string();
    let handle = server.handle();
    let task = tokio::spawn(server.run());
    (handle, addr, task)
}

async fn player(addr: &str, name: &str) -> GameClient {
    let config = ClientConfig {
        poll_interval_ms: 20,
        ..ClientConfig::default()
    };
    let mut client = GameClient::connect_with(addr, name, config)
        .await
        .expect("connect");
    client.start().await.expect("start");
    client
}

fn has_line(client: &GameClient, line: &str) -> bool {
    client.chat_log().iter().any(|l| l == line)
}

/// Polls `check` until it returns `true` or three seconds pass.
async fn wait_until<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..300 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

async fn next_server_message(stream: &mut TcpStream) -> Result<ServerMessage, ProtocolError> {
    tokio::time::timeout(Duration::from_secs(3), ServerMessage::read_from(stream))
        .await
        .expect("server should say something or close")
}

// =========================================================================
// Join and roster
// =========================================================================

#[tokio::test]
async fn test_join_roster_reaches_every_client() {
    let (server, addr, _task) = spawn_server(&["cat"], quiet_liveness()).await;
    let server = &server;
    let alice = player(&addr, "Alice").await;
    let alice = &alice;
    let bob = player(&addr, "Bobby").await;
    let bob = &bob;

    assert!(wait_until(|| async move { server.roster().await == ["Alice", "Bobby"] }).await);
    assert!(wait_until(|| async move { alice.lobby_roster() == ["Alice", "Bobby"] }).await);
    assert!(wait_until(|| async move { bob.lobby_roster() == ["Alice", "Bobby"] }).await);
}

#[tokio::test]
async fn test_join_invalid_name_stays_placeholder() {
    let (server, addr, _task) = spawn_server(&["cat"], quiet_liveness()).await;
    let server = &server;
    let mut raw = TcpStream::connect(&addr).await.unwrap();
    let join = ClientMessage::Join("Al".into()).encode().unwrap();
    raw.write_all(&join).await.unwrap();

    assert!(wait_until(|| async move { server.session_count().await == 1 }).await);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.roster().await, vec!["N00B"]);
}

#[tokio::test]
async fn test_join_late_joiner_gets_current_mask() {
    let (server, addr, _task) = spawn_server(&["cat"], quiet_liveness()).await;
    let server = &server;
    server.start_round().await.expect("round starts");

    let carol = player(&addr, "Carol").await;
    let carol = &carol;
    assert!(wait_until(|| async move { carol.current_word_mask() == "___" }).await);
}

// =========================================================================
// Round flow
// =========================================================================

#[tokio::test]
async fn test_round_alice_bob_cat_scenario() {
    let (server, addr, _task) = spawn_server(&["cat"], quiet_liveness()).await;
    let server = &server;
    let alice = player(&addr, "Alice").await;
    let alice = &alice;
    let bob = player(&addr, "Bobby").await;
    let bob = &bob;
    assert!(wait_until(|| async move { server.roster().await.len() == 2 }).await);

    alice.request_start().await.unwrap();
    assert!(
        wait_until(|| async move {
            alice.current_word_mask() == "___" && bob.current_word_mask() == "___"
        })
        .await
    );
    assert_eq!(server.round_state().await, RoundState::Running);

    bob.send_guess("dog").await.unwrap();
    assert!(
        wait_until(|| async move {
            has_line(alice, "Bobby: dog") && has_line(bob, "Bobby: dog")
        })
        .await
    );

    alice.send_guess("cat").await.unwrap();
    assert!(
        wait_until(|| async move {
            has_line(alice, "_WON Alice: cat") && has_line(bob, "_LOST Alice: cat")
        })
        .await
    );
    assert!(!has_line(alice, "_LOST Alice: cat"));
    assert!(!has_line(bob, "_WON Alice: cat"));
    assert_eq!(server.round_state().await, RoundState::Idle);
}

#[tokio::test]
async fn test_round_win_reveals_answer_to_every_client() {
    let (server, addr, _task) = spawn_server(&["cat"], quiet_liveness()).await;
    let server = &server;
    let alice = player(&addr, "Alice").await;
    let alice = &alice;
    let bob = player(&addr, "Bobby").await;
    let bob = &bob;
    assert!(wait_until(|| async move { server.roster().await.len() == 2 }).await);

    server.start_round().await.unwrap();
    assert!(wait_until(|| async move { bob.current_word_mask() == "___" }).await);

    alice.send_guess("cat").await.unwrap();
    assert!(
        wait_until(|| async move {
            alice.current_word_mask() == "cat" && bob.current_word_mask() == "cat"
        })
        .await
    );
    assert_eq!(server.round_state().await, RoundState::Idle);
}

#[tokio::test]
async fn test_round_same_wrong_guess_twice_two_lines_no_win() {
    let (server, addr, _task) = spawn_server(&["cat"], quiet_liveness()).await;
    let server = &server;
    let alice = player(&addr, "Alice").await;
    let alice = &alice;
    server.start_round().await.unwrap();

    alice.send_guess("dog").await.unwrap();
    alice.send_guess("dog").await.unwrap();
    assert!(wait_until(|| async move {
        alice.chat_log().iter().filter(|l| *l == "Alice: dog").count() == 2
    })
    .await);
    assert_eq!(server.round_state().await, RoundState::Running);
}

#[tokio::test]
async fn test_round_idle_guess_notifies_only_guesser() {
    let (server, addr, _task) = spawn_server(&["cat"], quiet_liveness()).await;
    let server = &server;
    let alice = player(&addr, "Alice").await;
    let alice = &alice;
    let bob = player(&addr, "Bobby").await;
    assert!(wait_until(|| async move { server.roster().await.len() == 2 }).await);

    alice.send_guess("cat").await.unwrap();
    assert!(wait_until(|| async move { has_line(&alice, NOT_RUNNING_NOTICE) }).await);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(bob.chat_log().len(), 1, "only the welcome line");
    assert_eq!(server.round_state().await, RoundState::Idle);
}

#[tokio::test]
async fn test_round_skip_while_idle_private_notice() {
    let (server, addr, _task) = spawn_server(&["cat"], quiet_liveness()).await;
    let server = &server;
    let alice = player(&addr, "Alice").await;
    let alice = &alice;

    alice.request_skip().await.unwrap();
    assert!(wait_until(|| async move { has_line(&alice, SKIP_NOT_RUNNING_NOTICE) }).await);
    assert_eq!(server.round_state().await, RoundState::Idle);
}

#[tokio::test]
async fn test_round_start_with_empty_word_list_stays_idle() {
    let (server, addr, _task) = spawn_server(&[], quiet_liveness()).await;
    let server = &server;
    let alice = player(&addr, "Alice").await;
    let alice = &alice;

    assert!(matches!(
        server.start_round().await,
        Err(WordhallError::Round(RoundError::EmptyWordList(_)))
    ));
    alice.request_start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.round_state().await, RoundState::Idle);
    assert!(alice.is_operable());
}

// =========================================================================
// Connection robustness
// =========================================================================

#[tokio::test]
async fn test_disconnect_abrupt_removed_others_undisturbed() {
    let (server, addr, _task) = spawn_server(&["cat"], quiet_liveness()).await;
    let server = &server;
    let alice = player(&addr, "Alice").await;
    let alice = &alice;
    let bob = player(&addr, "Bobby").await;
    assert!(wait_until(|| async move { alice.lobby_roster().len() == 2 }).await);

    drop(bob);
    assert!(wait_until(|| async move { server.roster().await == ["Alice"] }).await);
    assert!(wait_until(|| async move { alice.lobby_roster() == ["Alice"] }).await);
    assert!(alice.is_operable());
}

#[tokio::test]
async fn test_unknown_opcode_keeps_connection_open() {
    let (server, addr, _task) = spawn_server(&["cat"], quiet_liveness()).await;
    let server = &server;
    let mut raw = TcpStream::connect(&addr).await.unwrap();

    raw.write_all(b"ZZZZ").await.unwrap();
    raw.write_all(&ClientMessage::Join("Dave".into()).encode().unwrap())
        .await
        .unwrap();

    assert!(wait_until(|| async move { server.roster().await == ["Dave"] }).await);
}

#[tokio::test]
async fn test_truncated_payload_closes_session() {
    let (server, addr, _task) = spawn_server(&["cat"], quiet_liveness()).await;
    let server = &server;
    let mut raw = TcpStream::connect(&addr).await.unwrap();
    assert!(wait_until(|| async move { server.session_count().await == 1 }).await);

    // JOIN promising 10 bytes, then the peer hangs up after 2.
    raw.write_all(b"JOIN\x00\x0aAl").await.unwrap();
    raw.shutdown().await.unwrap();

    assert!(wait_until(|| async move { server.session_count().await == 0 }).await);
}

// =========================================================================
// Liveness
// =========================================================================

fn strict_liveness() -> LivenessConfig {
    LivenessConfig {
        sweep_interval_ms: 20,
        ping_interval_ms: 100,
        roster_interval_ms: 0,
        max_missed_pongs: 2,
        initial_jitter_ms: 0,
    }
}

#[tokio::test]
async fn test_liveness_silent_peer_pinged_then_disconnected() {
    let (server, addr, _task) = spawn_server(&["cat"], strict_liveness()).await;
    let server = &server;
    let mut raw = TcpStream::connect(&addr).await.unwrap();

    let mut pings = 0;
    loop {
        match next_server_message(&mut raw).await {
            Ok(ServerMessage::Ping) => pings += 1,
            Ok(_) => {}
            Err(_) => break,
        }
    }

    assert_eq!(pings, 2);
    assert!(wait_until(|| async move { server.session_count().await == 0 }).await);
}

#[tokio::test]
async fn test_liveness_answering_client_stays_connected() {
    let (server, addr, _task) = spawn_server(&["cat"], strict_liveness()).await;
    let server = &server;
    let alice = player(&addr, "Alice").await;
    let alice = &alice;

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(alice.is_operable());
    assert_eq!(server.roster().await, vec!["Alice"]);
}

// =========================================================================
// Frames
// =========================================================================

#[tokio::test]
async fn test_frame_latest_retained() {
    let (server, addr, _task) = spawn_server(&["cat"], quiet_liveness()).await;
    let server = &server;
    let mut frames = server.subscribe_frames();
    let alice = player(&addr, "Alice").await;
    let alice = &alice;

    alice.send_frame(vec![1u8, 2, 3]).await.unwrap();
    alice.send_frame(vec![4u8, 5]).await.unwrap();

    assert!(wait_until(|| async move {
        server.latest_frame().map(|f| f.data) == Some(Bytes::from_static(&[4, 5]))
    })
    .await);
    assert!(frames.has_changed().unwrap());
    assert!(frames.borrow_and_update().is_some());
}

// =========================================================================
// Shutdown
// =========================================================================

#[tokio::test]
async fn test_shutdown_stops_server_and_sessions() {
    let (server, addr, task) = spawn_server(&["cat"], quiet_liveness()).await;
    let server = &server;
    let alice = player(&addr, "Alice").await;
    let alice = &alice;
    assert!(wait_until(|| async move { server.session_count().await == 1 }).await);

    server.shutdown();
    let finished = tokio::time::timeout(Duration::from_secs(3), task)
        .await
        .expect("run should return")
        .expect("run task should not panic");
    assert!(finished.is_ok());

    assert!(wait_until(|| async move { !alice.is_operable() }).await);
    assert!(wait_until(|| async move { server.session_count().await == 0 }).await);
}
