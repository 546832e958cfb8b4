//! Core protocol types: opcodes, session identity, and delivery targets.
//!
//! Everything that travels "on the wire" starts with an [`Opcode`], a
//! 4-byte ASCII tag that says what the rest of the frame means.

use std::fmt;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Largest string or byte payload a 2-byte length prefix can describe.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Shortest allowed display name, in characters.
pub const MIN_NAME_LEN: usize = 4;

/// Longest allowed display name, in characters.
pub const MAX_NAME_LEN: usize = 10;

// ---------------------------------------------------------------------------
// Opcode
// ---------------------------------------------------------------------------

/// A 4-byte ASCII tag identifying a message's purpose.
///
/// Newtype over `[u8; 4]` so a tag can't be confused with a payload slice.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode([u8; 4]);

impl Opcode {
    /// Liveness probe, server → client.
    pub const PING: Self = Self(*b"PING");
    /// Liveness acknowledgment, client → server.
    pub const PONG: Self = Self(*b"PONG");
    /// Join handshake carrying the display name.
    pub const JOIN: Self = Self(*b"JOIN");
    /// A guess (client → server) or a word mask refresh (server → client).
    pub const WORD: Self = Self(*b"WORD");
    /// A chat line, server → client.
    pub const CHAT: Self = Self(*b"CHAT");
    /// Round start request.
    pub const STRT: Self = Self(*b"STRT");
    /// New secret word request.
    pub const SKIP: Self = Self(*b"SKIP");
    /// Full lobby roster, server → client.
    pub const LOBY: Self = Self(*b"LOBY");
    /// Latest spectator frame, client → server.
    pub const FRME: Self = Self(*b"FRME");

    /// Wraps raw tag bytes.
    pub const fn new(tag: [u8; 4]) -> Self {
        Self(tag)
    }

    /// The raw tag bytes, exactly as they appear on the wire.
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Tags from misbehaving peers may not be ASCII.
        for b in self.0 {
            if b.is_ascii_graphic() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opcode({self})")
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Opaque identifier for a connected session.
///
/// Assigned from a monotonic counter when the connection is accepted, so
/// ordering by `SessionId` is the same as ordering by arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who should receive a server message.
///
/// Game logic returns `(Recipient, ServerMessage)` pairs and the registry
/// decides which sessions that means at delivery time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every live session.
    All,
    /// One specific session.
    Session(SessionId),
    /// Every live session except this one.
    AllExcept(SessionId),
}

impl Recipient {
    /// Returns `true` if `id` is covered by this recipient.
    pub fn includes(&self, id: SessionId) -> bool {
        match self {
            Self::All => true,
            Self::Session(target) => *target == id,
            Self::AllExcept(excluded) => *excluded != id,
        }
    }
}

// ---------------------------------------------------------------------------
// Display names
// ---------------------------------------------------------------------------

/// Checks a display name before it is sent in a join handshake.
///
/// Length is counted in characters, not bytes, and control characters are
/// rejected.
pub fn validate_name(name: &str) -> Result<(), ProtocolError> {
    let len = name.chars().count();
    let printable = name.chars().all(|c| !c.is_control());
    if (MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len) && printable {
        Ok(())
    } else {
        Err(ProtocolError::InvalidName {
            name: name.to_string(),
        })
    }
}
