//! Error types for the session layer.

use wordhall_protocol::SessionId;

/// Errors that can occur while tracking or messaging sessions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session has started (or finished) its teardown and no longer
    /// accepts outbound messages.
    #[error("session {0} is closed")]
    Closed(SessionId),

    /// No live session has this id.
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// A session with this id is already registered.
    /// A session must never appear twice in the registry.
    #[error("session {0} is already registered")]
    AlreadyRegistered(SessionId),
}
