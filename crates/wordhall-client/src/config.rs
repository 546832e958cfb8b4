//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timings for the client's read loop and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// How long the read loop waits for the next opcode before checking
    /// whether it should stop.
    pub poll_interval_ms: u64,
    /// Once an opcode starts arriving, how long the rest of the frame may
    /// take.
    pub frame_timeout_ms: u64,
    /// Upper bound on a single socket write.
    pub send_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 200,
            frame_timeout_ms: 5_000,
            send_timeout_ms: 5_000,
        }
    }
}

impl ClientConfig {
    /// [`poll_interval_ms`](Self::poll_interval_ms) as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// [`frame_timeout_ms`](Self::frame_timeout_ms) as a [`Duration`].
    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }

    /// [`send_timeout_ms`](Self::send_timeout_ms) as a [`Duration`].
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}
