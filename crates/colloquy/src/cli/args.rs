use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Drive a live multimodal session from a script and inspect the result.
#[derive(Parser)]
#[command(version, about, long_about = None, author)]
pub struct Cli {
    /// Settings file (TOML). Defaults to the user config directory.
    #[arg(long, env = "COLLOQUY_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Replay a JSON-lines session script against an in-process client
    Replay {
        /// Path to the script
        script: PathBuf,
    },
    /// Print the tool catalog declared to the model
    Tools,
    /// Show the resolved settings
    Settings,
}
