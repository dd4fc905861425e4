//! CLI module for tunefetch

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod auth;
pub mod commands;
mod render;

pub use auth::AuthManager;

#[derive(Parser, Debug)]
#[command(name = "tunefetch", about = "Download Spotify playlists through yt-dlp")]
#[command(version, author)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging (also shows per-track detail lines)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file to use instead of ~/.config/tunefetch/config.json
    #[arg(long, global = true, env = "TUNEFETCH_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download every track of a playlist
    Download {
        /// Spotify playlist URL or URI
        #[arg(value_name = "URL")]
        url: String,

        /// Number of parallel downloads (1-10, defaults to the configured value)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Download root for this run; the playlist gets a subfolder
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Configure Spotify app credentials
    Auth {
        /// Spotify app client ID
        #[arg(long, env = "SPOTIFY_CLIENT_ID")]
        client_id: Option<String>,

        /// Spotify app client secret
        #[arg(long, env = "SPOTIFY_CLIENT_SECRET")]
        client_secret: Option<String>,

        /// Force re-authentication (ignore stored credentials)
        #[arg(long)]
        force: bool,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Test the Spotify connection and the yt-dlp installation
    Check,

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the current settings
    Show,

    /// Change settings and write them back
    Set {
        /// Default number of parallel downloads (1-10)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Default download root
        #[arg(long, value_name = "DIR")]
        download_root: Option<PathBuf>,

        /// Spotify app client ID (stored in the settings file)
        #[arg(long, requires = "client_secret")]
        client_id: Option<String>,

        /// Spotify app client secret (stored in the settings file)
        #[arg(long, requires = "client_id")]
        client_secret: Option<String>,
    },
}
