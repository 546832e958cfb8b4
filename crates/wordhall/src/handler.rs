//! Per-connection handler: registration, the read loop, and teardown.
//!
//! Each accepted connection gets two Tokio tasks:
//!   1. the read loop (this handler), which polls for opcodes and
//!      dispatches them;
//!   2. a writer task, the only code that writes to the socket, fed by
//!      the session's outbound queue.
//!
//! The flow is:
//!   1. Register the session (unnamed) → roster broadcast
//!   2. Loop: wait up to one poll interval for an opcode → dispatch
//!   3. Teardown, exactly once: close the queue → unregister → roster
//!      broadcast

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use wordhall_protocol::{ClientMessage, ProtocolError, SessionId};
use wordhall_round::{RoundError, WordSource};
use wordhall_session::{OutboundReceiver, SessionConfig, SessionHandle};
use wordhall_transport::{ConnectionReader, ConnectionWriter, Readiness, TcpConnection};

use crate::WordhallError;
use crate::game;
use crate::server::ServerState;

/// Tears the session down if the handler exits without doing so itself
/// (an error path or a panic).
///
/// `Drop` is synchronous, so the registry removal runs on a
/// fire-and-forget task.
struct SessionGuard<W: WordSource> {
    handle: SessionHandle,
    state: Arc<ServerState<W>>,
}

impl<W: WordSource> Drop for SessionGuard<W> {
    fn drop(&mut self) {
        if !self.handle.begin_close() {
            return;
        }
        let id = self.handle.id();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            unregister(&state, id).await;
        });
    }
}

impl<W: WordSource> SessionGuard<W> {
    /// Normal-path teardown. Idempotent with the drop backstop.
    async fn close(&self) {
        if self.handle.begin_close() {
            unregister(&self.state, self.handle.id()).await;
        }
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<W: WordSource>(
    conn: TcpConnection,
    state: Arc<ServerState<W>>,
) -> Result<(), WordhallError> {
    let id = SessionId(conn.id().into_inner());
    let peer = conn.peer_addr();
    let config = state.session_config.clone();
    let (mut reader, writer) = conn.into_split();

    let (handle, outbound) = SessionHandle::new(id);
    let writer_task = tokio::spawn(write_loop(
        writer,
        outbound,
        handle.clone(),
        config.send_timeout(),
    ));

    {
        let mut registry = state.registry.lock().await;
        if let Err(e) = registry.insert(handle.clone()) {
            handle.begin_close();
            return Err(e.into());
        }
        registry.broadcast_roster();
    }
    let guard = SessionGuard {
        handle: handle.clone(),
        state: Arc::clone(&state),
    };
    info!(session_id = %id, %peer, "session started");

    let result = read_loop(&mut reader, &handle, &state, &config).await;

    guard.close().await;
    // The queue is closed now, so the writer drains and exits.
    let _ = writer_task.await;
    result
}

/// Drops the session from the registry and tells everyone else.
async fn unregister<W: WordSource>(state: &ServerState<W>, id: SessionId) {
    let mut registry = state.registry.lock().await;
    if registry.remove(id).is_some() {
        info!(session_id = %id, remaining = registry.len(), "session removed");
        registry.broadcast_roster();
    }
}

async fn read_loop<W: WordSource>(
    reader: &mut ConnectionReader,
    handle: &SessionHandle,
    state: &ServerState<W>,
    config: &SessionConfig,
) -> Result<(), WordhallError> {
    let id = handle.id();

    loop {
        if !handle.is_running() {
            info!(session_id = %id, "session stopping on request");
            return Ok(());
        }
        if state.is_shutting_down() {
            debug!(session_id = %id, "session stopping for server shutdown");
            return Ok(());
        }

        match reader.wait_readable(config.poll_interval()).await? {
            Readiness::Idle => continue,
            Readiness::Closed => {
                info!(session_id = %id, "connection closed by peer");
                return Ok(());
            }
            Readiness::Ready => {}
        }

        let read =
            tokio::time::timeout(config.frame_timeout(), ClientMessage::read_from(reader)).await;
        let msg = match read {
            Ok(Ok(msg)) => msg,
            Ok(Err(ProtocolError::UnknownOpcode(opcode))) => {
                warn!(session_id = %id, %opcode, "unknown opcode");
                continue;
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                warn!(session_id = %id, "frame did not arrive in time");
                return Ok(());
            }
        };

        dispatch(msg, handle, state).await;
    }
}

async fn dispatch<W: WordSource>(
    msg: ClientMessage,
    handle: &SessionHandle,
    state: &ServerState<W>,
) {
    let id = handle.id();
    match msg {
        ClientMessage::Pong => {
            debug!(session_id = %id, "pong");
            handle.record_pong();
        }
        ClientMessage::Join(name) => game::join(state, id, name).await,
        ClientMessage::Guess(guess) => {
            debug!(session_id = %id, %guess, "guess");
            game::submit_guess(state, id, &guess).await;
        }
        ClientMessage::Start => {
            if let Err(e) = game::start_round(state).await {
                warn!(session_id = %id, error = %e, "could not start round");
            }
        }
        ClientMessage::Skip => match game::skip_word(state, id).await {
            Ok(()) | Err(RoundError::NotRunning) => {}
            Err(e) => warn!(session_id = %id, error = %e, "could not skip word"),
        },
        ClientMessage::Frame(data) => game::store_frame(state, id, data),
    }
}

/// Owns the write half. Every frame goes out in one bounded write, so
/// frames never interleave.
async fn write_loop(
    mut writer: ConnectionWriter,
    mut outbound: OutboundReceiver,
    handle: SessionHandle,
    limit: Duration,
) {
    while let Some(msg) = outbound.recv().await {
        let frame = match msg.encode() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(session_id = %handle.id(), error = %e, "dropping message");
                continue;
            }
        };
        if let Err(e) = writer.send_within(&frame, limit).await {
            debug!(session_id = %handle.id(), error = %e, "write failed");
            handle.request_shutdown();
            break;
        }
    }
    let _ = writer.close().await;
}
