//! Wire protocol for Wordhall.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`Opcode`], [`SessionId`], [`Recipient`]): tags and
//!   identities shared by every layer.
//! - **Codec** ([`codec`]): 4-byte opcodes, 2-byte length-prefixed
//!   strings and byte blobs, 4-byte integers.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`]): which payload
//!   follows which tag, per direction.
//! - **Errors** ([`ProtocolError`]): what can go wrong while framing.
//!
//! # Architecture
//!
//! ```text
//! Transport (byte stream) → Protocol (typed messages) → Session (player context)
//! ```

pub mod codec;
mod error;
mod message;
mod types;

pub use error::ProtocolError;
pub use message::{ClientMessage, ServerMessage};
pub use types::{
    MAX_NAME_LEN, MAX_PAYLOAD_LEN, MIN_NAME_LEN, Opcode, Recipient, SessionId,
    validate_name,
};
