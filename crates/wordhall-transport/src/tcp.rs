//! TCP transport implementation.

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader, ReadBuf};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

use crate::{ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

fn next_connection_id() -> ConnectionId {
    ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
}

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

/// A TCP [`Transport`] that listens for incoming player connections.
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Binds a new TCP transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await.map_err(|source| {
            TransportError::BindFailed {
                addr: addr.to_string(),
                source,
            }
        })?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self { listener })
    }
}

impl Transport for TcpTransport {
    type Connection = TcpConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let _ = stream.set_nodelay(true);
        let id = next_connection_id();
        tracing::debug!(%id, %peer, "accepted TCP connection");

        Ok(TcpConnection { id, peer, stream })
    }

    fn local_addr(&self) -> Result<SocketAddr, Self::Error> {
        self.listener
            .local_addr()
            .map_err(TransportError::AcceptFailed)
    }
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// A single TCP connection, before it is split for use.
pub struct TcpConnection {
    id: ConnectionId,
    peer: SocketAddr,
    stream: TcpStream,
}

impl TcpConnection {
    /// Connects to a server (client side).
    pub async fn connect(addr: &str) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr).await.map_err(|source| {
            TransportError::ConnectFailed {
                addr: addr.to_string(),
                source,
            }
        })?;
        let peer = stream
            .peer_addr()
            .map_err(|source| TransportError::ConnectFailed {
                addr: addr.to_string(),
                source,
            })?;
        // Frames are small and latency matters more than batching.
        let _ = stream.set_nodelay(true);
        Ok(Self {
            id: next_connection_id(),
            peer,
            stream,
        })
    }

    /// Returns the unique identifier for this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The remote address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Splits the connection into independently owned halves.
    pub fn into_split(self) -> (ConnectionReader, ConnectionWriter) {
        let (read, write) = self.stream.into_split();
        (
            ConnectionReader {
                inner: BufReader::new(read),
            },
            ConnectionWriter { inner: write },
        )
    }
}

/// Outcome of waiting for inbound data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// At least one byte is buffered; a read will make progress.
    Ready,
    /// Nothing arrived within the wait. Not an error.
    Idle,
    /// The peer closed its side of the connection.
    Closed,
}

/// The read half of a connection.
///
/// Implements [`AsyncRead`], so protocol decoders can read from it
/// directly.
pub struct ConnectionReader {
    inner: BufReader<OwnedReadHalf>,
}

impl ConnectionReader {
    /// Waits up to `wait` for data to arrive without consuming any of it.
    ///
    /// Safe to time out: nothing buffered is lost, so a frame that is
    /// half-way through arriving is picked up intact on the next call.
    pub async fn wait_readable(&mut self, wait: Duration) -> Result<Readiness, TransportError> {
        match tokio::time::timeout(wait, self.inner.fill_buf()).await {
            Err(_) => Ok(Readiness::Idle),
            Ok(Ok(buf)) if buf.is_empty() => Ok(Readiness::Closed),
            Ok(Ok(_)) => Ok(Readiness::Ready),
            Ok(Err(e)) => Err(TransportError::ReceiveFailed(e)),
        }
    }
}

impl AsyncRead for ConnectionReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

/// The write half of a connection.
pub struct ConnectionWriter {
    inner: OwnedWriteHalf,
}

impl ConnectionWriter {
    /// Writes one complete frame.
    pub async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.inner
            .write_all(data)
            .await
            .map_err(TransportError::SendFailed)?;
        self.inner.flush().await.map_err(TransportError::SendFailed)
    }

    /// Like [`send`](Self::send), but gives up after `limit`.
    pub async fn send_within(
        &mut self,
        data: &[u8],
        limit: Duration,
    ) -> Result<(), TransportError> {
        tokio::time::timeout(limit, self.send(data))
            .await
            .map_err(|_| TransportError::SendTimedOut(limit))?
    }

    /// Shuts down the write direction. The peer sees end-of-stream.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        self.inner
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }
}
