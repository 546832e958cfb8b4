//! Round layer for Wordhall.
//!
//! - [`Round`]: the single shared game state: idle or running with a
//!   secret word. Its operations return `(Recipient, ServerMessage)`
//!   outcomes for the caller to deliver.
//! - [`WordSource`]: where secret words come from ([`WordListFile`],
//!   [`WordList`]).
//!
//! This crate does no I/O on sessions. It is plain state plus rules, which
//! keeps every game rule testable without sockets.

mod error;
mod round;
mod words;

pub use error::RoundError;
pub use round::{
    NOT_RUNNING_NOTICE, Outcomes, Round, RoundConfig, RoundState, SKIP_NOT_RUNNING_NOTICE,
    mask_word,
};
pub use words::{WordList, WordListFile, WordSource, parse_words};
