//! tunefetch - Download Spotify playlists through yt-dlp

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod catalog;
mod cli;
mod config;
mod download;
mod media;
mod utils;

use cli::{Cli, Commands, ConfigAction};
use utils::ConditionalStderrLayer;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "tunefetch=debug,reqwest=debug"
    } else {
        "tunefetch=info"
    };

    // Stderr logging pauses while a progress bar is on screen
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter.into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(ConditionalStderrLayer::new(
            tracing_subscriber::fmt::layer().with_target(false),
        ))
        .init();

    match cli.command {
        Commands::Download {
            url,
            workers,
            output,
        } => {
            cli::commands::download(cli.config, url, workers, output, cli.verbose).await?;
        }
        Commands::Auth {
            client_id,
            client_secret,
            force,
        } => {
            cli::commands::auth(cli.config, client_id, client_secret, force).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::commands::config_show(cli.config)?,
            ConfigAction::Set {
                workers,
                download_root,
                client_id,
                client_secret,
            } => {
                cli::commands::config_set(
                    cli.config,
                    workers,
                    download_root,
                    client_id,
                    client_secret,
                )?;
            }
        },
        Commands::Check => {
            cli::commands::check(cli.config).await?;
        }
        Commands::Completion { shell } => {
            cli::commands::completion(shell);
        }
    }

    Ok(())
}
