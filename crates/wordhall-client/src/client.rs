//! The client-side session.
//!
//! A [`GameClient`] owns one connection to the server. After
//! [`start`](GameClient::start) it runs a background read loop that:
//! - answers every `PING` with `PONG`,
//! - appends `CHAT` lines to the chat log,
//! - replaces the lobby roster on `LOBY`,
//! - replaces the word mask on `WORD`.
//!
//! The UI reads the resulting view through [`chat_log`](GameClient::chat_log),
//! [`lobby_roster`](GameClient::lobby_roster) and
//! [`current_word_mask`](GameClient::current_word_mask), and acts through
//! the `send_*` / `request_*` methods.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use wordhall_protocol::{ClientMessage, ServerMessage, validate_name};
use wordhall_transport::{ConnectionReader, ConnectionWriter, Readiness, TcpConnection};

use crate::{ClientConfig, ClientError};

/// First line of every chat log.
pub const WELCOME_MESSAGE: &str = "Welcome to the game! Have fun!";

/// Word mask shown before the server has sent one.
pub const LOADING_MASK: &str = "loading...";

type SharedWriter = Arc<AsyncMutex<ConnectionWriter>>;

/// What the UI renders.
#[derive(Debug)]
struct View {
    chat: Vec<String>,
    lobby: Vec<String>,
    word: Option<String>,
}

struct Shared {
    view: Mutex<View>,
    running: AtomicBool,
    operable: AtomicBool,
}

impl Shared {
    fn view(&self) -> MutexGuard<'_, View> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.operable.store(false, Ordering::Release);
    }
}

/// One player's connection to a Wordhall server.
pub struct GameClient {
    name: String,
    config: ClientConfig,
    shared: Arc<Shared>,
    writer: SharedWriter,
    reader: Option<ConnectionReader>,
    task: Option<JoinHandle<()>>,
}

impl GameClient {
    /// Connects to `addr` with default timings. Nothing is sent until
    /// [`start`](Self::start).
    pub async fn connect(addr: &str, name: impl Into<String>) -> Result<Self, ClientError> {
        Self::connect_with(addr, name, ClientConfig::default()).await
    }

    /// Connects to `addr` with the given timings.
    pub async fn connect_with(
        addr: &str,
        name: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let connection = TcpConnection::connect(addr).await?;
        debug!(id = %connection.id(), addr, "client connected");
        let (reader, writer) = connection.into_split();

        Ok(Self {
            name: name.into(),
            config,
            shared: Arc::new(Shared {
                view: Mutex::new(View {
                    chat: vec![WELCOME_MESSAGE.to_string()],
                    lobby: Vec::new(),
                    word: None,
                }),
                running: AtomicBool::new(false),
                operable: AtomicBool::new(false),
            }),
            writer: Arc::new(AsyncMutex::new(writer)),
            reader: Some(reader),
            task: None,
        })
    }

    /// Validates the name, sends the join handshake, and starts the read
    /// loop.
    ///
    /// # Errors
    /// - [`ClientError::InvalidName`]: nothing was sent.
    /// - [`ClientError::AlreadyStarted`]: on a second call.
    /// - transport errors if the handshake couldn't be written.
    pub async fn start(&mut self) -> Result<(), ClientError> {
        if validate_name(&self.name).is_err() {
            return Err(ClientError::InvalidName(self.name.clone()));
        }
        let Some(reader) = self.reader.take() else {
            return Err(ClientError::AlreadyStarted);
        };

        let join = ClientMessage::Join(self.name.clone()).encode()?;
        self.writer
            .lock()
            .await
            .send_within(&join, self.config.send_timeout())
            .await?;

        self.shared.running.store(true, Ordering::Release);
        self.shared.operable.store(true, Ordering::Release);
        info!(name = %self.name, "joined");

        self.task = Some(tokio::spawn(read_loop(
            reader,
            self.writer.clone(),
            self.shared.clone(),
            self.config.clone(),
        )));
        Ok(())
    }

    /// Submits a guess.
    pub async fn send_guess(&self, text: &str) -> Result<(), ClientError> {
        self.send(ClientMessage::Guess(text.to_string())).await
    }

    /// Asks the server for a new secret word.
    pub async fn request_skip(&self) -> Result<(), ClientError> {
        self.send(ClientMessage::Skip).await
    }

    /// Asks the server to start a round.
    pub async fn request_start(&self) -> Result<(), ClientError> {
        self.send(ClientMessage::Start).await
    }

    /// Submits a spectator frame.
    pub async fn send_frame(&self, data: impl Into<Bytes>) -> Result<(), ClientError> {
        self.send(ClientMessage::Frame(data.into())).await
    }

    /// Every chat line so far, starting with the welcome line.
    pub fn chat_log(&self) -> Vec<String> {
        self.shared.view().chat.clone()
    }

    /// The last roster the server sent.
    pub fn lobby_roster(&self) -> Vec<String> {
        self.shared.view().lobby.clone()
    }

    /// The current word mask, or `"loading..."` before the first one.
    pub fn current_word_mask(&self) -> String {
        self.shared
            .view()
            .word
            .clone()
            .unwrap_or_else(|| LOADING_MASK.to_string())
    }

    /// `true` between a successful `start` and the end of the connection.
    pub fn is_operable(&self) -> bool {
        self.shared.operable.load(Ordering::Acquire)
    }

    /// The display name this client joins with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stops the read loop and shuts the connection.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        self.shared.stop();
        let closed = self.writer.lock().await.close().await;
        if let Some(task) = self.task.take() {
            // The loop sees the flag within one poll interval.
            let _ = task.await;
        }
        info!(name = %self.name, "client closed");
        closed.map_err(ClientError::from)
    }

    async fn send(&self, msg: ClientMessage) -> Result<(), ClientError> {
        if !self.is_operable() {
            return Err(ClientError::NotOperable);
        }
        let frame = msg.encode()?;
        let result = self
            .writer
            .lock()
            .await
            .send_within(&frame, self.config.send_timeout())
            .await;
        if result.is_err() {
            self.shared.stop();
        }
        result.map_err(ClientError::from)
    }
}

impl Drop for GameClient {
    fn drop(&mut self) {
        self.shared.stop();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn read_loop(
    mut reader: ConnectionReader,
    writer: SharedWriter,
    shared: Arc<Shared>,
    config: ClientConfig,
) {
    while shared.running.load(Ordering::Acquire) {
        match reader.wait_readable(config.poll_interval()).await {
            Ok(Readiness::Idle) => continue,
            Ok(Readiness::Ready) => {}
            Ok(Readiness::Closed) => {
                info!("server closed the connection");
                break;
            }
            Err(e) => {
                warn!(error = %e, "connection failed");
                break;
            }
        }

        let frame = ServerMessage::read_from(&mut reader);
        let read = tokio::time::timeout(config.frame_timeout(), frame).await;
        let msg = match read {
            Err(_) => {
                warn!("frame did not arrive in time");
                break;
            }
            Ok(Ok(msg)) => msg,
            Ok(Err(e)) if !e.is_fatal() => {
                warn!(error = %e, "ignoring message");
                continue;
            }
            Ok(Err(e)) => {
                info!(error = %e, "connection ended");
                break;
            }
        };

        match msg {
            ServerMessage::Ping => {
                let pong = match ClientMessage::Pong.encode() {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(error = %e, "failed to encode pong");
                        continue;
                    }
                };
                let sent = writer
                    .lock()
                    .await
                    .send_within(&pong, config.send_timeout())
                    .await;
                if let Err(e) = sent {
                    warn!(error = %e, "failed to answer ping");
                    break;
                }
            }
            ServerMessage::Chat(line) => {
                debug!(%line, "chat");
                shared.view().chat.push(line.trim().to_string());
            }
            ServerMessage::Lobby(names) => {
                debug!(count = names.len(), "roster");
                shared.view().lobby = names;
            }
            ServerMessage::Word(mask) => {
                debug!(%mask, "word mask");
                shared.view().word = Some(mask);
            }
        }
    }

    shared.stop();
}
