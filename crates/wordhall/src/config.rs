//! Server configuration.
//!
//! Everything has a default, so a config file only needs the keys it
//! changes:
//!
//! ```json
//! {
//!   "port": 4000,
//!   "word_list": "words/animals.txt",
//!   "liveness": { "max_missed_pongs": 5 }
//! }
//! ```

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use wordhall_liveness::LivenessConfig;
use wordhall_round::RoundConfig;
use wordhall_session::SessionConfig;

/// Port the server listens on by default.
pub const DEFAULT_PORT: u16 = 16324;

/// Errors loading a [`ServerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Complete server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind, e.g. `"0.0.0.0"`.
    pub bind_address: String,
    pub port: u16,
    /// Newline-delimited word list, re-read on every start and skip.
    pub word_list: PathBuf,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub session: SessionConfig,
    pub liveness: LivenessConfig,
    pub round: RoundConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            word_list: PathBuf::from("WordList.txt"),
            log_level: "info".to_string(),
            session: SessionConfig::default(),
            liveness: LivenessConfig::default(),
            round: RoundConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads a JSON config. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses a config from JSON text; absent fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// `bind_address:port`, ready for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
