//! Error types for the protocol layer.
//!
//! Each crate in Wordhall defines its own error enum. A `ProtocolError`
//! means something went wrong while reading or writing a frame: the peer
//! went away, sent fewer bytes than it promised, or sent a tag we don't
//! know.

use crate::Opcode;

/// Errors that can occur while framing or unframing messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The stream ended cleanly before the first byte of an opcode.
    #[error("transport closed")]
    TransportClosed,

    /// The stream ended before a declared length was satisfied.
    ///
    /// A short payload leaves the stream in an unknown position, so the
    /// connection is unrecoverable and is handled like `TransportClosed`.
    #[error("truncated frame: expected {expected} bytes, received {received}")]
    Truncated {
        /// Bytes the frame declared.
        expected: usize,
        /// Bytes that actually arrived before the stream ended.
        received: usize,
    },

    /// The payload arrived in full but its content is invalid
    /// (e.g. a string that is not UTF-8).
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// The opcode is not part of the protocol.
    ///
    /// Only the 4 tag bytes were consumed. The protocol is forward-tolerant:
    /// the caller logs this and keeps the connection open.
    #[error("unknown opcode {0}")]
    UnknownOpcode(Opcode),

    /// A string or byte payload does not fit the 2-byte length prefix.
    #[error("payload of {0} bytes exceeds the 65535-byte frame limit")]
    PayloadTooLarge(usize),

    /// A display name is outside the allowed length or contains control
    /// characters. Checked locally before anything is sent.
    #[error("invalid name {name:?}: must be 4-10 printable characters")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// Any other I/O failure (reset, aborted, broken pipe).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Returns `true` if the connection cannot be used after this error.
    ///
    /// `UnknownOpcode` is the only read error that leaves the stream usable.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::UnknownOpcode(_) | Self::PayloadTooLarge(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_fatal_unknown_opcode_is_recoverable() {
        let err = ProtocolError::UnknownOpcode(Opcode::new(*b"HUH?"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_is_fatal_truncated_is_fatal() {
        let err = ProtocolError::Truncated {
            expected: 10,
            received: 3,
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("expected 10"));
    }

    #[test]
    fn test_is_fatal_transport_closed_is_fatal() {
        assert!(ProtocolError::TransportClosed.is_fatal());
    }
}
