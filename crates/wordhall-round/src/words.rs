//! Where secret words come from.
//!
//! The server asks its [`WordSource`] for a word on every start and skip.
//! Two sources ship with the crate:
//!
//! - [`WordListFile`]: a newline-delimited file, re-read on every request
//!   so edits take effect without a restart.
//! - [`WordList`]: a fixed in-memory list, handy for tests and embedding.

use std::path::PathBuf;

use rand::seq::IndexedRandom;

use crate::RoundError;

/// Supplies secret words.
///
/// The returned future must be `Send` because it is awaited inside
/// per-session tasks.
pub trait WordSource: Send + Sync + 'static {
    /// Picks the next secret word.
    ///
    /// # Errors
    /// [`RoundError::EmptyWordList`] when there is nothing to pick from,
    /// or a source-specific error (e.g. [`RoundError::WordList`]).
    fn next_word(&self) -> impl std::future::Future<Output = Result<String, RoundError>> + Send;
}

/// Splits word list text into words: one per line, trimmed, blank lines
/// dropped.
pub fn parse_words(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Uniform pick. Kept synchronous so the thread-local RNG never lives
/// across an `.await`.
fn pick(words: &[String], label: &str) -> Result<String, RoundError> {
    words
        .choose(&mut rand::rng())
        .cloned()
        .ok_or_else(|| RoundError::EmptyWordList(label.to_string()))
}

// ---------------------------------------------------------------------------
// WordList
// ---------------------------------------------------------------------------

/// A fixed list of words held in memory.
#[derive(Debug, Clone)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    /// Builds a list from `words` as given. Nothing is trimmed or
    /// filtered; see [`parse`](Self::parse) for that.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds a list from word list text. See [`parse_words`].
    pub fn parse(text: &str) -> Self {
        Self {
            words: parse_words(text),
        }
    }

    /// Number of candidate words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// `true` if every pick will fail with [`RoundError::EmptyWordList`].
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl WordSource for WordList {
    async fn next_word(&self) -> Result<String, RoundError> {
        pick(&self.words, "<memory>")
    }
}

// ---------------------------------------------------------------------------
// WordListFile
// ---------------------------------------------------------------------------

/// A newline-delimited word list on disk.
#[derive(Debug, Clone)]
pub struct WordListFile {
    path: PathBuf,
}

impl WordListFile {
    /// A source reading `path`. The file isn't touched until a word is
    /// requested, so it may be created later.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads and parses the file as it is right now.
    pub async fn load(&self) -> Result<Vec<String>, RoundError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| RoundError::WordList {
                path: self.path.clone(),
                source,
            })?;
        Ok(parse_words(&text))
    }
}

impl WordSource for WordListFile {
    async fn next_word(&self) -> Result<String, RoundError> {
        let words = self.load().await?;
        let word = pick(&words, &self.path.display().to_string())?;
        tracing::debug!(path = %self.path.display(), candidates = words.len(), "picked word");
        Ok(word)
    }
}
