//! The round state machine.
//!
//! There is exactly one round per server. It is either idle or running
//! with a secret word:
//!
//! ```text
//!          start(word)              skip(word)
//!   Idle ──────────────→ Running ──────────────┐
//!    ↑                      │  ↑               │
//!    │   correct guess      │  └───────────────┘
//!    └──(end_on_win)────────┘
//! ```
//!
//! When a correct guess ends the round, every client gets a `WORD`
//! carrying the answer in place of the mask.
//!
//! Every operation returns `(Recipient, ServerMessage)` pairs instead of
//! sending anything itself. The caller delivers them while still holding
//! the round lock, so every session observes a win in the same order.

use std::fmt;

use serde::{Deserialize, Serialize};
use wordhall_protocol::{Recipient, ServerMessage, SessionId};

use crate::RoundError;

/// Chat line sent to a player who guesses while no round is running.
pub const NOT_RUNNING_NOTICE: &str = "You cant guess yet! The game isn't running!";

/// Chat line sent to a player who asks to skip while no round is running.
pub const SKIP_NOT_RUNNING_NOTICE: &str = "There is no word to skip! The game isn't running!";

/// Outcomes of a round operation, in delivery order.
pub type Outcomes = Vec<(Recipient, ServerMessage)>;

// ---------------------------------------------------------------------------
// RoundConfig
// ---------------------------------------------------------------------------

/// Round rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    /// Whether a correct guess returns the round to idle. When `false` the
    /// round keeps running with the same word until someone skips.
    pub end_on_win: bool,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self { end_on_win: true }
    }
}

// ---------------------------------------------------------------------------
// RoundState
// ---------------------------------------------------------------------------

/// Lifecycle state of the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundState {
    /// No secret word; guesses are refused.
    Idle,
    /// A secret word is set and guesses are checked against it.
    Running,
}

impl fmt::Display for RoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
        }
    }
}

// ---------------------------------------------------------------------------
// Round
// ---------------------------------------------------------------------------

/// The shared game state.
#[derive(Debug)]
pub struct Round {
    state: RoundState,
    secret: String,
    config: RoundConfig,
}

impl Round {
    /// A new, idle round.
    pub fn new(config: RoundConfig) -> Self {
        Self {
            state: RoundState::Idle,
            secret: String::new(),
            config,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RoundState {
        self.state
    }

    /// Whether a secret word is set and guesses are being checked.
    pub fn is_running(&self) -> bool {
        self.state == RoundState::Running
    }

    /// The secret word; empty while idle.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// The masked secret as clients see it, or `None` while idle.
    pub fn mask(&self) -> Option<String> {
        self.is_running().then(|| mask_word(&self.secret))
    }

    /// Starts (or restarts) the round with `word`.
    ///
    /// Calling it while already running just replaces the word.
    ///
    /// # Errors
    /// [`RoundError::EmptyWord`] if `word` is empty; the round is unchanged.
    pub fn start(&mut self, word: impl Into<String>) -> Result<Outcomes, RoundError> {
        let was = self.state;
        let outcomes = self.set_word(word.into())?;
        self.state = RoundState::Running;
        tracing::info!(from = %was, "round started");
        Ok(outcomes)
    }

    /// Swaps the secret word of a running round.
    ///
    /// # Errors
    /// [`RoundError::NotRunning`] while idle, [`RoundError::EmptyWord`] if
    /// `word` is empty. Either way the round is unchanged.
    pub fn skip(&mut self, word: impl Into<String>) -> Result<Outcomes, RoundError> {
        if !self.is_running() {
            return Err(RoundError::NotRunning);
        }
        let outcomes = self.set_word(word.into())?;
        tracing::info!("word skipped");
        Ok(outcomes)
    }

    /// Checks a guess from `submitter`, known to the others as `name`.
    ///
    /// Comparison is exact and case-sensitive.
    pub fn check_guess(&mut self, submitter: SessionId, name: &str, guess: &str) -> Outcomes {
        if !self.is_running() {
            return vec![(
                Recipient::Session(submitter),
                ServerMessage::Chat(NOT_RUNNING_NOTICE.to_string()),
            )];
        }

        if guess != self.secret {
            return vec![(Recipient::All, ServerMessage::Chat(format!("{name}: {guess}")))];
        }

        tracing::info!(session_id = %submitter, name, "word guessed");
        let mut outcomes = vec![
            (
                Recipient::Session(submitter),
                ServerMessage::Chat(format!("_WON {name}: {guess}")),
            ),
            (
                Recipient::AllExcept(submitter),
                ServerMessage::Chat(format!("_LOST {name}: {guess}")),
            ),
        ];

        // A finished round shows the answer in place of the mask.
        if self.config.end_on_win {
            self.state = RoundState::Idle;
            let answer = std::mem::take(&mut self.secret);
            outcomes.push((Recipient::All, ServerMessage::Word(answer)));
        }
        outcomes
    }

    /// Shared by `start` and `skip`: both refresh every client's mask.
    fn set_word(&mut self, word: String) -> Result<Outcomes, RoundError> {
        if word.is_empty() {
            return Err(RoundError::EmptyWord);
        }
        tracing::debug!(len = word.len(), "new secret word");
        let refresh = ServerMessage::Word(mask_word(&word));
        self.secret = word;
        Ok(vec![(Recipient::All, refresh)])
    }
}

impl Default for Round {
    fn default() -> Self {
        Self::new(RoundConfig::default())
    }
}

/// Replaces every non-whitespace character with `_`.
pub fn mask_word(word: &str) -> String {
    word.chars()
        .map(|c| if c.is_whitespace() { c } else { '_' })
        .collect()
}
