//! Whalesync binary.
//!
//! Loads the settings document, connects to the Discord gateway, and
//! runs the reconciliation scheduler until the process is stopped.

use clap::Parser;
use whalesync_core::SettingsStore;
use whalesync_discord::WhalesyncBot;

#[derive(Parser)]
#[command(
    name = "whalesync",
    about = "Keeps a Discord supporter role in sync with Twitch subscribers and Patreon backers"
)]
struct Cli {
    /// Path to the settings document
    #[arg(long, default_value = "settings.json")]
    settings: std::path::PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let store = SettingsStore::load(&cli.settings)?;
    let mut bot = WhalesyncBot::new(store).await?;
    bot.start().await?;

    Ok(())
}
