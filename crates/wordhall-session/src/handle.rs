//! Session handles: the shareable side of one connected player.
//!
//! The session task owns the socket. Everyone else (the registry, the
//! round, the liveness monitor) holds a [`SessionHandle`] and can only:
//! - queue an outbound [`ServerMessage`],
//! - ask the session to shut down,
//! - read or update its liveness bookkeeping.
//!
//! # Lifecycle
//!
//! ```text
//!   running ──(request_shutdown)──→ stopping ──(begin_close)──→ closed
//!      │                                                          ↑
//!      └────────────────────(begin_close)─────────────────────────┘
//! ```
//!
//! `begin_close` is the close-once guard: exactly one caller gets `true`
//! and performs the teardown. The outbound queue is closed in the same
//! step, so nothing can be sent on a session once its teardown started.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use wordhall_protocol::{ServerMessage, SessionId};

use crate::SessionError;

/// Receiving end of a session's outbound queue, drained by its writer task.
pub type OutboundReceiver = mpsc::UnboundedReceiver<ServerMessage>;

// ---------------------------------------------------------------------------
// Liveness
// ---------------------------------------------------------------------------

/// What the liveness monitor should do with a session right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessVerdict {
    /// Acknowledged recently; nothing to do.
    Fresh,
    /// A ping is out and its interval hasn't elapsed yet.
    AwaitingPong,
    /// Send a `PING` now.
    Ping,
    /// Too many pings went unanswered; disconnect.
    Dead {
        /// Consecutive unanswered pings.
        missed: u32,
    },
}

/// Per-session liveness bookkeeping.
///
/// Sending a ping re-arms the timer, so a silent session is pinged at most
/// once per interval rather than on every sweep.
#[derive(Debug, Clone)]
pub struct Liveness {
    last_ack: Instant,
    last_ping: Option<Instant>,
    missed: u32,
}

impl Liveness {
    /// Fresh bookkeeping, as if acknowledged at `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            last_ack: now,
            last_ping: None,
            missed: 0,
        }
    }

    /// Records a `PONG` (or any proof of life) at `now`.
    pub fn acknowledge(&mut self, now: Instant) {
        self.last_ack = now;
        self.last_ping = None;
        self.missed = 0;
    }

    /// Decides what to do at `now`.
    ///
    /// `max_missed == 0` disables disconnects: the session is pinged
    /// forever.
    pub fn check(
        &mut self,
        now: Instant,
        ping_interval: Duration,
        max_missed: u32,
    ) -> LivenessVerdict {
        if now.saturating_duration_since(self.last_ack) < ping_interval {
            return LivenessVerdict::Fresh;
        }

        if let Some(pinged_at) = self.last_ping {
            if now.saturating_duration_since(pinged_at) < ping_interval {
                return LivenessVerdict::AwaitingPong;
            }
            self.missed += 1;
        }

        if max_missed > 0 && self.missed >= max_missed {
            return LivenessVerdict::Dead {
                missed: self.missed,
            };
        }

        self.last_ping = Some(now);
        LivenessVerdict::Ping
    }
}

// ---------------------------------------------------------------------------
// SessionHandle
// ---------------------------------------------------------------------------

struct Inner {
    id: SessionId,
    /// `None` once teardown has started.
    outbound: Mutex<Option<mpsc::UnboundedSender<ServerMessage>>>,
    running: AtomicBool,
    closed: AtomicBool,
    liveness: Mutex<Liveness>,
}

/// Cheap, clonable handle to one session.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Inner>,
}

impl SessionHandle {
    /// Creates a handle and the receiving end of its outbound queue.
    pub fn new(id: SessionId) -> (Self, OutboundReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let inner = Inner {
            id,
            outbound: Mutex::new(Some(tx)),
            running: AtomicBool::new(true),
            closed: AtomicBool::new(false),
            liveness: Mutex::new(Liveness::new(Instant::now())),
        };
        (
            Self {
                inner: Arc::new(inner),
            },
            rx,
        )
    }

    /// This session's id.
    pub fn id(&self) -> SessionId {
        self.inner.id
    }

    /// Queues a message for the session's writer.
    ///
    /// # Errors
    /// [`SessionError::Closed`] if teardown has started or the writer is
    /// gone (its socket failed).
    pub fn send(&self, msg: ServerMessage) -> Result<(), SessionError> {
        let outbound = lock(&self.inner.outbound);
        match outbound.as_ref() {
            Some(tx) => tx.send(msg).map_err(|_| SessionError::Closed(self.id())),
            None => Err(SessionError::Closed(self.id())),
        }
    }

    /// `false` once a shutdown was requested or teardown started.
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Asks the session to stop. Cooperative: the session notices at its
    /// next poll tick and tears itself down.
    pub fn request_shutdown(&self) {
        if self.inner.running.swap(false, Ordering::AcqRel) {
            tracing::debug!(session_id = %self.id(), "shutdown requested");
        }
    }

    /// The close-once guard. Returns `true` for exactly one caller, which
    /// then owns the rest of the teardown. Closes the outbound queue.
    pub fn begin_close(&self) -> bool {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.inner.running.store(false, Ordering::Release);
        lock(&self.inner.outbound).take();
        true
    }

    /// `true` once teardown has started.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Records a `PONG` received now.
    pub fn record_pong(&self) {
        lock(&self.inner.liveness).acknowledge(Instant::now());
    }

    /// Runs the liveness check at `now`. See [`Liveness::check`].
    pub fn check_liveness(
        &self,
        now: Instant,
        ping_interval: Duration,
        max_missed: u32,
    ) -> LivenessVerdict {
        lock(&self.inner.liveness).check(now, ping_interval, max_missed)
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id())
            .field("running", &self.is_running())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Session-local locks guard plain data; a panic elsewhere can't leave it
/// half-updated, so poisoning is ignored.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
