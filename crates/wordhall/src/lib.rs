//! # Wordhall
//!
//! Multiplayer word-guessing session server.
//!
//! Players connect over TCP, join with a display name, and guess a secret
//! word. The server relays guesses as chat, announces the winner, keeps
//! every client's lobby roster current, and drops connections that stop
//! answering pings.
//!
//! ## Layers
//!
//! | Crate | Role |
//! |---|---|
//! | `wordhall-transport` | TCP listener and split connection halves |
//! | `wordhall-protocol` | opcode framing, typed messages |
//! | `wordhall-session` | session handles, registry, fan-out |
//! | `wordhall-round` | round state machine, word sources |
//! | `wordhall-liveness` | ping sweeps, roster rebroadcast |
//! | `wordhall-client` | the player side of the protocol |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wordhall::prelude::*;
//!
//! # async fn demo() -> Result<(), WordhallError> {
//! let config = ServerConfig::load("wordhall.json")?;
//! let server = WordhallServerBuilder::new()
//!     .config(&config)
//!     .build(WordListFile::new(&config.word_list))
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod game;
mod handler;
mod server;

pub use config::{ConfigError, DEFAULT_PORT, ServerConfig};
pub use error::WordhallError;
pub use game::Frame;
pub use server::{ServerHandle, WordhallServer, WordhallServerBuilder};

/// Everything needed to embed a server or write a client.
pub mod prelude {
    pub use crate::{
        ConfigError, DEFAULT_PORT, Frame, ServerConfig, ServerHandle, WordhallError,
        WordhallServer, WordhallServerBuilder,
    };
    pub use wordhall_client::{ClientConfig, ClientError, GameClient};
    pub use wordhall_liveness::LivenessConfig;
    pub use wordhall_protocol::{ClientMessage, ProtocolError, ServerMessage, SessionId};
    pub use wordhall_round::{
        RoundConfig, RoundError, RoundState, WordList, WordListFile, WordSource,
    };
    pub use wordhall_session::{SessionConfig, SessionError};
    pub use wordhall_transport::TransportError;
}
