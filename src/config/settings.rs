//! Settings persistence
//!
//! Stored in ~/.config/tunefetch/config.json. Every key is optional on disk;
//! missing keys take their defaults when the file is loaded.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::catalog::ClientCredentials;
use crate::download::{DEFAULT_SEARCH_RESULTS, MAX_WORKERS};
use crate::media::SearchSite;

/// Workers used when nothing is configured
pub const DEFAULT_WORKERS: usize = 3;

/// Everything tunefetch persists between runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub spotify: SpotifySettings,
    #[serde(rename = "settings")]
    pub download: DownloadSettings,
}

/// Spotify app credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifySettings {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Root folder; each playlist gets a subfolder
    pub download_folder: PathBuf,
    pub max_workers: usize,
    /// yt-dlp executable, looked up on PATH unless absolute
    pub ytdlp_path: String,
    /// Sites searched in order until one returns results
    pub search_platforms: Vec<SearchSite>,
    pub search_results: usize,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            download_folder: default_download_folder(),
            max_workers: DEFAULT_WORKERS,
            ytdlp_path: "yt-dlp".to_string(),
            search_platforms: vec![SearchSite::Youtube],
            search_results: DEFAULT_SEARCH_RESULTS,
        }
    }
}

fn default_download_folder() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("spotify_downloads")
}

impl Settings {
    /// Default settings file location
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("tunefetch").join("config.json"))
    }

    /// Resolve the settings path, preferring an explicit override
    pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(path) => Ok(path.to_path_buf()),
            None => Self::default_path(),
        }
    }

    /// Load settings from `path`, or the default location
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(&Self::resolve_path(path)?)
    }

    /// Load settings from a file, falling back to defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        let mut settings: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {:?}", path))?;

        settings.normalize();
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Write settings to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write settings to {:?}", path))?;

        debug!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Pull hand-edited values back into range
    fn normalize(&mut self) {
        let download = &mut self.download;
        if !(1..=MAX_WORKERS).contains(&download.max_workers) {
            let clamped = download.max_workers.clamp(1, MAX_WORKERS);
            warn!(
                "max_workers {} out of range 1-{}, using {}",
                download.max_workers, MAX_WORKERS, clamped
            );
            download.max_workers = clamped;
        }
        if download.search_results == 0 {
            download.search_results = 1;
        }
        if download.search_platforms.is_empty() {
            warn!("No search platforms configured, using YouTube");
            download.search_platforms = vec![SearchSite::Youtube];
        }
    }

    /// Change the default worker count, rejecting values outside 1..=10
    pub fn set_max_workers(&mut self, workers: usize) -> Result<()> {
        if !(1..=MAX_WORKERS).contains(&workers) {
            bail!("Workers must be between 1 and {}, got {}", MAX_WORKERS, workers);
        }
        self.download.max_workers = workers;
        Ok(())
    }

    pub fn set_download_folder(&mut self, folder: PathBuf) {
        self.download.download_folder = folder;
    }

    /// Store a credential pair, both halves required
    pub fn set_credentials(&mut self, client_id: &str, client_secret: &str) -> Result<()> {
        let Some(credentials) = ClientCredentials::new(client_id, client_secret) else {
            bail!("Client ID and client secret must both be non-empty");
        };
        self.spotify.client_id = credentials.client_id;
        self.spotify.client_secret = credentials.client_secret;
        Ok(())
    }

    /// Credentials from the settings file, if both are present
    pub fn credentials(&self) -> Option<ClientCredentials> {
        ClientCredentials::new(&self.spotify.client_id, &self.spotify.client_secret)
    }
}
