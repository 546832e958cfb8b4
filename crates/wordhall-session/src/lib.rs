//! Session layer for Wordhall.
//!
//! A session is one connected player. This crate holds the parts of a
//! session that other tasks are allowed to touch:
//!
//! - [`SessionHandle`]: queue outbound messages, request shutdown, and
//!   read liveness. The socket itself stays with the session's own tasks.
//! - [`Liveness`]: last acknowledgment, outstanding ping, missed pongs.
//! - [`SessionRegistry`]: every live session with its display name, and
//!   the fan-out of game outcomes to them.
//!
//! # How it fits
//!
//! ```text
//! Listener ──insert──→ Registry ←──remove── Session (on teardown)
//!                         │
//!            deliver / broadcast / roster
//!                         ▼
//!              SessionHandle queues ──→ writer tasks ──→ sockets
//! ```

mod config;
mod error;
mod handle;
mod registry;

pub use config::{DEFAULT_PLACEHOLDER_NAME, SessionConfig};
pub use error::SessionError;
pub use handle::{Liveness, LivenessVerdict, OutboundReceiver, SessionHandle};
pub use registry::{SessionRegistry, SharedRegistry};
