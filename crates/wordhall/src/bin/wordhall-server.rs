//! Wordhall server entry point.
//!
//! Loads the configuration, applies command-line overrides, sets up
//! logging, and serves until Ctrl-C.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use wordhall::prelude::*;

/// Multiplayer word-guessing server.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON config file; missing means defaults
    #[arg(short, long, default_value = "wordhall.json")]
    config: PathBuf,
    /// Interface to bind to
    #[arg(short, long)]
    bind: Option<String>,
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,
    /// Newline-delimited word list
    #[arg(short, long)]
    words: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), WordhallError> {
    let args = Args::parse();

    let mut config = ServerConfig::load(&args.config)?;
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(words) = args.words {
        config.word_list = words;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        words = %config.word_list.display(),
        "Wordhall server starting"
    );

    let server = WordhallServerBuilder::new()
        .config(&config)
        .build(WordListFile::new(&config.word_list))
        .await?;

    let handle = server.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received");
            handle.shutdown();
        }
    });

    server.run().await
}
