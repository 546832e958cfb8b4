//! Game actions a session can trigger.
//!
//! Each function takes the shared state, applies one action to the round
//! and/or registry, and delivers the resulting messages. Locks are always
//! taken round first, then registry, and held until delivery finishes so
//! everyone observes outcomes in the same order.

use bytes::Bytes;
use tokio::time::Instant;
use wordhall_protocol::{Recipient, ServerMessage, SessionId, validate_name};
use wordhall_round::{RoundError, SKIP_NOT_RUNNING_NOTICE, WordSource};

use crate::server::ServerState;

/// The latest spectator frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub data: Bytes,
    pub from: SessionId,
    pub received_at: Instant,
}

/// Picks a word and starts (or restarts) the round.
pub(crate) async fn start_round<W: WordSource>(state: &ServerState<W>) -> Result<(), RoundError> {
    let mut round = state.round.lock().await;
    let word = state.words.next_word().await?;
    let outcomes = round.start(word)?;
    state.registry.lock().await.deliver_all(outcomes);
    Ok(())
}

/// Replaces the secret word. While idle, only `requester` hears about it.
pub(crate) async fn skip_word<W: WordSource>(
    state: &ServerState<W>,
    requester: SessionId,
) -> Result<(), RoundError> {
    let mut round = state.round.lock().await;
    if !round.is_running() {
        let notice = ServerMessage::Chat(SKIP_NOT_RUNNING_NOTICE.to_string());
        state
            .registry
            .lock()
            .await
            .deliver(&Recipient::Session(requester), &notice);
        return Err(RoundError::NotRunning);
    }
    let word = state.words.next_word().await?;
    let outcomes = round.skip(word)?;
    state.registry.lock().await.deliver_all(outcomes);
    Ok(())
}

/// Checks a guess and delivers the outcome while both locks are held.
pub(crate) async fn submit_guess<W: WordSource>(
    state: &ServerState<W>,
    submitter: SessionId,
    guess: &str,
) {
    let mut round = state.round.lock().await;
    let registry = state.registry.lock().await;
    let Some(name) = registry.name_of(submitter).map(str::to_string) else {
        return;
    };
    let outcomes = round.check_guess(submitter, &name, guess);
    registry.deliver_all(outcomes);
}

/// Binds a display name, refreshes everyone's roster, and catches the
/// joiner up on a running round.
pub(crate) async fn join<W: WordSource>(state: &ServerState<W>, id: SessionId, name: String) {
    if let Err(e) = validate_name(&name) {
        tracing::warn!(session_id = %id, error = %e, "join rejected");
        return;
    }

    let round = state.round.lock().await;
    let mut registry = state.registry.lock().await;
    if let Err(e) = registry.rename(id, name.clone()) {
        tracing::debug!(session_id = %id, error = %e, "join after removal");
        return;
    }
    tracing::info!(session_id = %id, %name, "player joined");

    registry.broadcast_roster();
    if let Some(mask) = round.mask() {
        registry.deliver(&Recipient::Session(id), &ServerMessage::Word(mask));
    }
}

/// Keeps `data` as the latest frame.
pub(crate) fn store_frame<W: WordSource>(state: &ServerState<W>, from: SessionId, data: Bytes) {
    tracing::debug!(session_id = %from, len = data.len(), "frame stored");
    state.frames.send_replace(Some(Frame {
        data,
        from,
        received_at: Instant::now(),
    }));
}
