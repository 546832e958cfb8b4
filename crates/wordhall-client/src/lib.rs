//! Client library for Wordhall.
//!
//! [`GameClient`] speaks the protocol for a player: it joins with a display
//! name, keeps the connection alive by answering pings, and maintains the
//! view a UI draws from (chat log, lobby roster, word mask).
//!
//! ```no_run
//! # async fn demo() -> Result<(), wordhall_client::ClientError> {
//! use wordhall_client::GameClient;
//!
//! let mut client = GameClient::connect("127.0.0.1:16324", "Alice").await?;
//! client.start().await?;
//! client.send_guess("cat").await?;
//! println!("{}", client.current_word_mask());
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;

pub use client::{GameClient, LOADING_MASK, WELCOME_MESSAGE};
pub use config::ClientConfig;
pub use error::ClientError;
