//! Framing primitives: opcodes and length-prefixed payloads.
//!
//! Reads are async and work on any `AsyncRead`, so the same functions
//! serve the server's session loop, the client, and in-memory tests.
//! Writes append to a [`BytesMut`] so a whole message can be assembled
//! first and put on the socket with a single write.
//!
//! ```text
//! +--------+--------+--------+--------+
//! |        opcode (4 bytes ASCII)     |
//! +--------+--------+--------+--------+----...----+
//! | len (u16 BE)    | len bytes (UTF-8 or raw)    |
//! +--------+--------+--------------...------------+
//!   or
//! +--------+--------+--------+--------+
//! |        value (u32 BE)             |
//! +--------+--------+--------+--------+
//! ```
//!
//! A declared length longer than what arrives before the stream closes
//! is a hard [`ProtocolError::Truncated`], never a partial read.

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{MAX_PAYLOAD_LEN, Opcode, ProtocolError};

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Reads exactly 4 tag bytes.
///
/// # Errors
/// - [`ProtocolError::TransportClosed`] if the stream ends before the
///   first byte.
/// - [`ProtocolError::Truncated`] if it ends mid-tag.
pub async fn read_opcode<R>(reader: &mut R) -> Result<Opcode, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut tag = [0u8; 4];
    let received = fill(reader, &mut tag).await?;
    match received {
        0 => Err(ProtocolError::TransportClosed),
        4 => Ok(Opcode::new(tag)),
        n => Err(ProtocolError::Truncated {
            expected: 4,
            received: n,
        }),
    }
}

/// Reads a 2-byte length prefix followed by that many bytes.
pub async fn read_bytes<R>(reader: &mut R) -> Result<Bytes, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; 2];
    read_exact(reader, &mut prefix).await?;
    let len = u16::from_be_bytes(prefix) as usize;

    let mut payload = vec![0u8; len];
    read_exact(reader, &mut payload).await?;
    Ok(Bytes::from(payload))
}

/// Reads a length-prefixed UTF-8 string.
///
/// # Errors
/// [`ProtocolError::Malformed`] if the payload is not valid UTF-8.
pub async fn read_string<R>(reader: &mut R) -> Result<String, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let payload = read_bytes(reader).await?;
    String::from_utf8(payload.to_vec())
        .map_err(|e| ProtocolError::Malformed(e.to_string()))
}

/// Reads a bare 4-byte big-endian unsigned integer.
pub async fn read_int<R>(reader: &mut R) -> Result<u32, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut raw = [0u8; 4];
    read_exact(reader, &mut raw).await?;
    Ok(u32::from_be_bytes(raw))
}

/// Like `read_exact`, but a short stream becomes `Truncated` with the
/// exact byte counts instead of a bare `UnexpectedEof`.
async fn read_exact<R>(reader: &mut R, buf: &mut [u8]) -> Result<(), ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let received = fill(reader, buf).await?;
    if received < buf.len() {
        return Err(ProtocolError::Truncated {
            expected: buf.len(),
            received,
        });
    }
    Ok(())
}

/// Reads until `buf` is full or the stream ends. Returns bytes read.
async fn fill<R>(reader: &mut R, buf: &mut [u8]) -> Result<usize, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Appends a 4-byte tag.
pub fn write_opcode(buf: &mut BytesMut, opcode: Opcode) {
    buf.put_slice(opcode.as_bytes());
}

/// Appends a 2-byte length prefix and the raw payload.
///
/// # Errors
/// [`ProtocolError::PayloadTooLarge`] above [`MAX_PAYLOAD_LEN`]; nothing is
/// appended in that case.
pub fn write_bytes(buf: &mut BytesMut, payload: &[u8]) -> Result<(), ProtocolError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::PayloadTooLarge(payload.len()));
    }
    buf.reserve(2 + payload.len());
    buf.put_u16(payload.len() as u16);
    buf.put_slice(payload);
    Ok(())
}

/// Appends a length-prefixed UTF-8 string. The prefix is the byte length.
pub fn write_string(buf: &mut BytesMut, value: &str) -> Result<(), ProtocolError> {
    write_bytes(buf, value.as_bytes())
}

/// Appends a 4-byte big-endian unsigned integer.
pub fn write_int(buf: &mut BytesMut, value: u32) {
    buf.put_u32(value);
}
