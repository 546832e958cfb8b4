//! Error types for the round layer.

use std::io;
use std::path::PathBuf;

/// Errors that can occur while driving a round or picking words.
#[derive(Debug, thiserror::Error)]
pub enum RoundError {
    /// The operation needs a running round.
    #[error("the round is not running")]
    NotRunning,

    /// A round can't run with an empty secret word.
    #[error("secret word must not be empty")]
    EmptyWord,

    /// The word source had nothing to pick from.
    #[error("word list {0} has no words")]
    EmptyWordList(String),

    /// The word list file couldn't be read.
    #[error("failed to read word list {path}: {source}")]
    WordList {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
