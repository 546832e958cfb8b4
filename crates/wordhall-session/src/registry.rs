//! The session registry: every live session and its display name.
//!
//! This is the fan-out point of the server. Game outcomes arrive as
//! `(Recipient, ServerMessage)` pairs and the registry routes each one to
//! the matching session queues.
//!
//! # Concurrency note
//!
//! `SessionRegistry` itself is a plain map. The server shares it as a
//! [`SharedRegistry`] (`Arc<tokio::sync::Mutex<_>>`); when both the round
//! and the registry are needed, the round lock is always taken first.
//!
//! # Failure isolation
//!
//! Delivering to a session never fails the fan-out. A session whose queue
//! is closed is skipped and asked to shut down; everyone else still gets
//! the message.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use wordhall_protocol::{Recipient, ServerMessage, SessionId};

use crate::{SessionError, SessionHandle};

/// The registry as shared between the listener, sessions, and the
/// liveness monitor.
pub type SharedRegistry = Arc<Mutex<SessionRegistry>>;

struct Entry {
    handle: SessionHandle,
    name: Option<String>,
}

/// Live sessions keyed by [`SessionId`].
///
/// Ids are handed out by a monotonic counter, so iterating the map in key
/// order is iterating in insertion order.
pub struct SessionRegistry {
    sessions: BTreeMap<SessionId, Entry>,
    placeholder: String,
}

impl SessionRegistry {
    /// Creates an empty registry. `placeholder` is the display name of a
    /// session that hasn't joined yet.
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            sessions: BTreeMap::new(),
            placeholder: placeholder.into(),
        }
    }

    /// Wraps a new, empty registry for sharing.
    pub fn shared(placeholder: impl Into<String>) -> SharedRegistry {
        Arc::new(Mutex::new(Self::new(placeholder)))
    }

    /// Adds a freshly accepted session, unnamed.
    ///
    /// # Errors
    /// [`SessionError::AlreadyRegistered`] if the id is already present.
    pub fn insert(&mut self, handle: SessionHandle) -> Result<(), SessionError> {
        let id = handle.id();
        if self.sessions.contains_key(&id) {
            return Err(SessionError::AlreadyRegistered(id));
        }
        self.sessions.insert(id, Entry { handle, name: None });
        tracing::debug!(session_id = %id, total = self.sessions.len(), "session registered");
        Ok(())
    }

    /// Removes a session. Idempotent: a second call returns `None`.
    pub fn remove(&mut self, id: SessionId) -> Option<SessionHandle> {
        let entry = self.sessions.remove(&id)?;
        tracing::debug!(session_id = %id, total = self.sessions.len(), "session unregistered");
        Some(entry.handle)
    }

    /// Binds (or rebinds) a session's display name.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if the session is not registered.
    pub fn rename(&mut self, id: SessionId, name: impl Into<String>) -> Result<(), SessionError> {
        let entry = self.sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        entry.name = Some(name.into());
        Ok(())
    }

    /// The display name of a session, or the placeholder if it hasn't
    /// joined. `None` if the session isn't registered.
    pub fn name_of(&self, id: SessionId) -> Option<&str> {
        self.sessions
            .get(&id)
            .map(|entry| entry.name.as_deref().unwrap_or(&self.placeholder))
    }

    /// Number of registered sessions, including ones mid-teardown.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// `true` if no session is registered.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// A point-in-time copy of every handle, in insertion order.
    pub fn handles(&self) -> Vec<SessionHandle> {
        self.sessions.values().map(|entry| entry.handle.clone()).collect()
    }

    /// Display names of every live session, in insertion order.
    ///
    /// Sessions whose teardown has started are left out even if they
    /// haven't been removed yet.
    pub fn roster_snapshot(&self) -> Vec<String> {
        self.sessions
            .values()
            .filter(|entry| !entry.handle.is_closed())
            .map(|entry| {
                entry
                    .name
                    .clone()
                    .unwrap_or_else(|| self.placeholder.clone())
            })
            .collect()
    }

    /// Routes one message. Returns how many sessions it was queued for.
    pub fn deliver(&self, recipient: &Recipient, msg: &ServerMessage) -> usize {
        let mut delivered = 0;
        for (id, entry) in &self.sessions {
            if !recipient.includes(*id) || entry.handle.is_closed() {
                continue;
            }
            match entry.handle.send(msg.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        session_id = %id,
                        error = %e,
                        "delivery failed, shutting session down"
                    );
                    entry.handle.request_shutdown();
                }
            }
        }
        delivered
    }

    /// Routes a batch of outcomes in order.
    pub fn deliver_all(&self, outcomes: Vec<(Recipient, ServerMessage)>) {
        for (recipient, msg) in outcomes {
            self.deliver(&recipient, &msg);
        }
    }

    /// Sends to every live session, optionally skipping one.
    pub fn broadcast(&self, msg: &ServerMessage, exclude: Option<SessionId>) -> usize {
        let recipient = match exclude {
            Some(id) => Recipient::AllExcept(id),
            None => Recipient::All,
        };
        self.deliver(&recipient, msg)
    }

    /// Sends the current roster to everyone.
    pub fn broadcast_roster(&self) -> usize {
        let roster = ServerMessage::Lobby(self.roster_snapshot());
        self.broadcast(&roster, None)
    }
}
