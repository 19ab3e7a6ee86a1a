//! Holo-Control CLI: run the gesture stream server or replay recordings.
//!
//! Usage:
//!   holo serve [OPTIONS]       Stream gestures to WebSocket clients
//!   holo replay <FILE>         Process a landmark recording offline
//!   holo config                Show or write the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "holo",
    about = "Hand-gesture control stream for holographic renderers",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the stream server
    Serve {
        /// Configuration file (defaults to the standard location)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Landmark recording (JSONL) to use as the hand source
        #[arg(short, long)]
        landmarks: Option<PathBuf>,

        /// Restart the recording when it ends
        #[arg(long = "loop")]
        looping: bool,

        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Bind port
        #[arg(short, long)]
        port: Option<u16>,

        /// Gesture profile: balanced|precise|reactive
        #[arg(long)]
        profile: Option<String>,
    },

    /// Run the processor over a recording and print one wire message per frame
    Replay {
        /// Landmark recording (JSONL)
        file: PathBuf,

        /// Configuration file (defaults to the standard location)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Simulated time between frames (milliseconds)
        #[arg(long, default_value = "33")]
        interval_ms: u64,
    },

    /// Print the effective configuration
    Config {
        /// Configuration file (defaults to the standard location)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the configuration to this path instead of printing it
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    holo_common::logging::init_logging(&holo_common::config::LoggingConfig {
        level: log_level.to_string(),
        json: false,
    });

    match cli.command {
        Commands::Serve {
            config,
            landmarks,
            looping,
            host,
            port,
            profile,
        } => {
            commands::serve::run(config, landmarks, looping, host, port, profile).await?;
        }
        Commands::Replay {
            file,
            config,
            interval_ms,
        } => {
            commands::replay::run(file, config, interval_ms)?;
        }
        Commands::Config { config, write } => {
            commands::config::run(config, write)?;
        }
    }

    Ok(())
}
