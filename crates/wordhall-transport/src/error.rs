use std::time::Duration;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listening socket failed. Fatal at startup.
    #[error("bind to {addr} failed: {source}")]
    BindFailed {
        /// The address we tried to bind.
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Accepting an incoming connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// Connecting to a server failed.
    #[error("connect to {addr} failed: {source}")]
    ConnectFailed {
        /// The address we tried to reach.
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// A send did not complete within its deadline.
    #[error("send timed out after {0:?}")]
    SendTimedOut(Duration),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}
