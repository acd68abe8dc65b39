use clap::Parser;
use eyre::Result;

use colloquy::cli::{Cli, Commands};
use colloquy::commands::{
    Command, replay::ReplayCommand, settings::SettingsCommand, tools::ToolsCommand,
};
use colloquy_core::config::Settings;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // RUST_LOG overrides the level chosen here
    let level = if cli.debug { "debug" } else { "info" };
    colloquy_core::utils::tracing::init_tracing(level)?;

    let settings = Settings::load(cli.settings.as_deref())?;
    debug!(model = %settings.model, ack_delay_ms = settings.ack_delay_ms, "Settings loaded");

    match cli.command {
        Commands::Replay { script } => ReplayCommand { script, settings }.execute().await,
        Commands::Tools => ToolsCommand.execute().await,
        Commands::Settings => {
            SettingsCommand {
                path: cli.settings,
                settings,
            }
            .execute()
            .await
        }
    }
}
