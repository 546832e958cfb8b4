//! Session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Name shown for a session until its join handshake arrives.
pub const DEFAULT_PLACEHOLDER_NAME: &str = "N00B";

/// Configuration for per-session behavior.
///
/// Durations are stored as milliseconds so the config file stays
/// readable; use the accessor methods to get [`Duration`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long a read loop waits for the next opcode before taking a
    /// scheduling tick. Also bounds how quickly a shutdown request is seen.
    pub poll_interval_ms: u64,

    /// Once an opcode starts arriving, how long the rest of the frame may
    /// take.
    pub frame_timeout_ms: u64,

    /// Upper bound on a single socket write.
    pub send_timeout_ms: u64,

    /// Display name of a session that has not joined yet.
    pub placeholder_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 200,
            frame_timeout_ms: 5_000,
            send_timeout_ms: 5_000,
            placeholder_name: DEFAULT_PLACEHOLDER_NAME.to_string(),
        }
    }
}

impl SessionConfig {
    /// See [`poll_interval_ms`](Self::poll_interval_ms).
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// See [`frame_timeout_ms`](Self::frame_timeout_ms).
    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }

    /// See [`send_timeout_ms`](Self::send_timeout_ms).
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}
