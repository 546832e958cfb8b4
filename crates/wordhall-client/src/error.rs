//! Error types for the client.

use wordhall_protocol::ProtocolError;
use wordhall_transport::TransportError;

/// Errors returned by [`GameClient`](crate::GameClient).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The local display name can't be used; nothing was sent.
    #[error("invalid name {0:?}: must be 4-10 printable characters")]
    InvalidName(String),

    /// `start` was called twice.
    #[error("client already started")]
    AlreadyStarted,

    /// The client hasn't started, or its connection has ended.
    #[error("client is not operable")]
    NotOperable,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
