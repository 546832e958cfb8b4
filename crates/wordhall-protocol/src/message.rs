//! Typed messages for each direction of the wire protocol.
//!
//! The codec in [`crate::codec`] knows how to move tags and payloads;
//! this module knows which payload follows which tag.

use bytes::{Bytes, BytesMut};
use tokio::io::AsyncRead;

use crate::codec::{
    read_bytes, read_int, read_opcode, read_string, write_bytes, write_int,
    write_opcode, write_string,
};
use crate::{Opcode, ProtocolError};

/// Messages a client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Reply to a server `PING`.
    Pong,
    /// Join handshake: bind this connection's display name.
    Join(String),
    /// Submit a guess for the current round.
    Guess(String),
    /// Ask the server to start a round.
    Start,
    /// Ask for a new secret word without ending the round.
    Skip,
    /// The latest spectator frame.
    Frame(Bytes),
}

/// Messages the server sends to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Liveness probe; the client must answer with `PONG`.
    Ping,
    /// Word mask refresh.
    Word(String),
    /// One chat line.
    Chat(String),
    /// Full lobby roster, replacing whatever the client had.
    Lobby(Vec<String>),
}

impl ClientMessage {
    /// The tag this message is framed with.
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Pong => Opcode::PONG,
            Self::Join(_) => Opcode::JOIN,
            Self::Guess(_) => Opcode::WORD,
            Self::Start => Opcode::STRT,
            Self::Skip => Opcode::SKIP,
            Self::Frame(_) => Opcode::FRME,
        }
    }

    /// Serializes the whole frame: tag plus payload.
    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        let mut buf = BytesMut::with_capacity(16);
        write_opcode(&mut buf, self.opcode());
        match self {
            Self::Pong | Self::Start | Self::Skip => {}
            Self::Join(text) | Self::Guess(text) => write_string(&mut buf, text)?,
            Self::Frame(data) => write_bytes(&mut buf, data)?,
        }
        Ok(buf.freeze())
    }

    /// Reads one message: the tag, then whatever payload it implies.
    ///
    /// # Errors
    /// [`ProtocolError::UnknownOpcode`] for tags a client may not send.
    /// Only the tag has been consumed in that case.
    pub async fn read_from<R>(reader: &mut R) -> Result<Self, ProtocolError>
    where
        R: AsyncRead + Unpin,
    {
        let opcode = read_opcode(reader).await?;
        Ok(match opcode {
            Opcode::PONG => Self::Pong,
            Opcode::JOIN => Self::Join(read_string(reader).await?),
            Opcode::WORD => Self::Guess(read_string(reader).await?),
            Opcode::STRT => Self::Start,
            Opcode::SKIP => Self::Skip,
            Opcode::FRME => Self::Frame(read_bytes(reader).await?),
            other => return Err(ProtocolError::UnknownOpcode(other)),
        })
    }
}

impl ServerMessage {
    /// The tag this message is framed with.
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Ping => Opcode::PING,
            Self::Word(_) => Opcode::WORD,
            Self::Chat(_) => Opcode::CHAT,
            Self::Lobby(_) => Opcode::LOBY,
        }
    }

    /// Serializes the whole frame: tag plus payload.
    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        let mut buf = BytesMut::with_capacity(16);
        write_opcode(&mut buf, self.opcode());
        match self {
            Self::Ping => {}
            Self::Word(text) | Self::Chat(text) => write_string(&mut buf, text)?,
            Self::Lobby(names) => {
                write_int(&mut buf, names.len() as u32);
                for name in names {
                    write_string(&mut buf, name)?;
                }
            }
        }
        Ok(buf.freeze())
    }

    /// Reads one message: the tag, then whatever payload it implies.
    pub async fn read_from<R>(reader: &mut R) -> Result<Self, ProtocolError>
    where
        R: AsyncRead + Unpin,
    {
        let opcode = read_opcode(reader).await?;
        Ok(match opcode {
            Opcode::PING => Self::Ping,
            Opcode::WORD => Self::Word(read_string(reader).await?),
            Opcode::CHAT => Self::Chat(read_string(reader).await?),
            Opcode::LOBY => {
                let count = read_int(reader).await?;
                // The count comes from the peer; don't trust it for capacity.
                let mut names = Vec::with_capacity(count.min(64) as usize);
                for _ in 0..count {
                    names.push(read_string(reader).await?);
                }
                Self::Lobby(names)
            }
            other => return Err(ProtocolError::UnknownOpcode(other)),
        })
    }
}
