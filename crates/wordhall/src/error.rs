//! Unified error type for Wordhall.

use wordhall_client::ClientError;
use wordhall_protocol::ProtocolError;
use wordhall_round::RoundError;
use wordhall_session::SessionError;
use wordhall_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps every crate-specific error.
///
/// Each variant converts with `?` through its `#[from]` impl.
#[derive(Debug, thiserror::Error)]
pub enum WordhallError {
    /// Binding, accepting, reading or writing a socket.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Framing: truncated, malformed, unknown or oversized messages.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Registry bookkeeping.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Round rules and word sources.
    #[error(transparent)]
    Round(#[from] RoundError),

    /// The client side of a connection.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The server configuration file.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use wordhall_protocol::{Opcode, SessionId};

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::SendTimedOut(std::time::Duration::from_secs(5));
        let wordhall_err: WordhallError = err.into();
        assert!(matches!(wordhall_err, WordhallError::Transport(_)));
    }

    #[test]
    fn test_from_protocol_error_keeps_message() {
        let err = ProtocolError::UnknownOpcode(Opcode::new(*b"HUH?"));
        let wordhall_err: WordhallError = err.into();
        assert!(matches!(wordhall_err, WordhallError::Protocol(_)));
        assert!(wordhall_err.to_string().contains("HUH?"));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::NotFound(SessionId(3));
        let wordhall_err: WordhallError = err.into();
        assert!(matches!(wordhall_err, WordhallError::Session(_)));
    }

    #[test]
    fn test_from_round_error() {
        let wordhall_err: WordhallError = RoundError::NotRunning.into();
        assert!(matches!(wordhall_err, WordhallError::Round(_)));
    }
}
