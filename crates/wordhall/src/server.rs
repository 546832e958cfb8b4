//! `WordhallServer` builder, accept loop, and the embedding handle.
//!
//! This ties the layers together: transport → protocol → session →
//! round, with the liveness monitor running alongside.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use wordhall_liveness::{LivenessConfig, LivenessMonitor};
use wordhall_round::{Round, RoundConfig, RoundState, WordSource};
use wordhall_session::{SessionConfig, SessionRegistry, SharedRegistry};
use wordhall_transport::{TcpTransport, Transport};

use crate::game::{self, Frame};
use crate::handler::handle_connection;
use crate::{ServerConfig, WordhallError};

/// Shared server state passed to each session task.
///
/// The registry and the round are the only shared mutable state. When
/// both are needed the round is locked first.
pub(crate) struct ServerState<W: WordSource> {
    pub(crate) registry: SharedRegistry,
    pub(crate) round: Mutex<Round>,
    pub(crate) words: W,
    pub(crate) frames: watch::Sender<Option<Frame>>,
    pub(crate) shutdown: watch::Sender<bool>,
    pub(crate) session_config: SessionConfig,
}

impl<W: WordSource> ServerState<W> {
    pub(crate) fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }
}

/// Builder for configuring and starting a Wordhall server.
///
/// # Example
///
/// ```rust,no_run
/// use wordhall::prelude::*;
///
/// # async fn demo() -> Result<(), WordhallError> {
/// let server = WordhallServerBuilder::new()
///     .bind("0.0.0.0:16324")
///     .build(WordListFile::new("WordList.txt"))
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct WordhallServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
    liveness_config: LivenessConfig,
    round_config: RoundConfig,
}

impl WordhallServerBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        let defaults = ServerConfig::default();
        Self {
            bind_addr: defaults.bind_addr(),
            session_config: defaults.session,
            liveness_config: defaults.liveness,
            round_config: defaults.round,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets per-session timeouts and the placeholder name.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets ping, disconnect, and roster rebroadcast timings.
    pub fn liveness_config(mut self, config: LivenessConfig) -> Self {
        self.liveness_config = config;
        self
    }

    /// Sets the round rules.
    pub fn round_config(mut self, config: RoundConfig) -> Self {
        self.round_config = config;
        self
    }

    /// Takes the address and every sub-config from a [`ServerConfig`].
    /// The word list path is not used here; pass a source to
    /// [`build`](Self::build).
    pub fn config(self, config: &ServerConfig) -> Self {
        self.bind(&config.bind_addr())
            .session_config(config.session.clone())
            .liveness_config(config.liveness.clone())
            .round_config(config.round.clone())
    }

    /// Binds the listener. Bind failure is the only fatal startup error.
    pub async fn build<W: WordSource>(self, words: W) -> Result<WordhallServer<W>, WordhallError> {
        let transport = TcpTransport::bind(&self.bind_addr).await?;
        let (frames, _) = watch::channel(None);
        let (shutdown, _) = watch::channel(false);

        let state = Arc::new(ServerState {
            registry: SessionRegistry::shared(self.session_config.placeholder_name.clone()),
            round: Mutex::new(Round::new(self.round_config)),
            words,
            frames,
            shutdown,
            session_config: self.session_config,
        });

        Ok(WordhallServer {
            transport,
            state,
            liveness_config: self.liveness_config,
        })
    }
}

impl Default for WordhallServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Wordhall server.
///
/// Call [`run()`](Self::run) to start accepting connections, and keep a
/// [`ServerHandle`] (from [`handle()`](Self::handle)) to observe or stop it.
pub struct WordhallServer<W: WordSource> {
    transport: TcpTransport,
    state: Arc<ServerState<W>>,
    liveness_config: LivenessConfig,
}

impl<W: WordSource> WordhallServer<W> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, WordhallError> {
        Ok(self.transport.local_addr()?)
    }

    /// A handle for embedding code and tests.
    pub fn handle(&self) -> ServerHandle<W> {
        ServerHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Runs the accept loop until [`ServerHandle::shutdown`] is called.
    ///
    /// Each accepted connection gets its own session task. Accept errors
    /// are logged and the loop keeps going.
    pub async fn run(mut self) -> Result<(), WordhallError> {
        let mut shutdown = self.state.shutdown.subscribe();
        let monitor = LivenessMonitor::new(
            self.liveness_config.clone(),
            Arc::clone(&self.state.registry),
        );
        let monitor_task = tokio::spawn(monitor.run(self.state.shutdown.subscribe()));

        tracing::info!(addr = ?self.transport.local_addr().ok(), "Wordhall server running");

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "session ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        tracing::info!("Wordhall server shutting down");
        let _ = monitor_task.await;
        Ok(())
    }
}

/// Cheap, clonable view into a running server.
pub struct ServerHandle<W: WordSource> {
    state: Arc<ServerState<W>>,
}

impl<W: WordSource> Clone for ServerHandle<W> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<W: WordSource> ServerHandle<W> {
    /// Display names of every live session.
    pub async fn roster(&self) -> Vec<String> {
        self.state.registry.lock().await.roster_snapshot()
    }

    /// Number of registered sessions, named or not.
    pub async fn session_count(&self) -> usize {
        self.state.registry.lock().await.len()
    }

    /// Whether a round is running.
    pub async fn round_state(&self) -> RoundState {
        self.state.round.lock().await.state()
    }

    /// Starts (or restarts) the round, as if a client sent `STRT`.
    pub async fn start_round(&self) -> Result<(), WordhallError> {
        Ok(game::start_round(&self.state).await?)
    }

    /// The most recent spectator frame.
    pub fn latest_frame(&self) -> Option<Frame> {
        self.state.frames.borrow().clone()
    }

    /// Notified whenever a new frame is stored.
    pub fn subscribe_frames(&self) -> watch::Receiver<Option<Frame>> {
        self.state.frames.subscribe()
    }

    /// Stops accepting connections and asks every session to wind down.
    /// Sessions notice within one poll interval.
    pub fn shutdown(&self) {
        self.state.shutdown.send_replace(true);
    }

    /// `true` once [`shutdown`](Self::shutdown) has been called.
    pub fn is_shutting_down(&self) -> bool {
        self.state.is_shutting_down()
    }
}
