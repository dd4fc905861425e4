//! Playlist catalog module (Spotify Web API)

use async_trait::async_trait;
use thiserror::Error;

pub mod auth;
pub mod client;
pub mod models;
mod playlist_ref;

pub use auth::ClientCredentials;
pub use client::SpotifyClient;
pub use models::{PlaylistInfo, TrackInfo, TrackPage};
pub use playlist_ref::PlaylistRef;

/// Failures talking to the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no catalog connection: client id and secret are not configured")]
    NotConnected,

    #[error("catalog rejected the credentials: {0}")]
    Unauthorized(String),

    #[error("playlist not found: {0}")]
    NotFound(String),

    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected catalog response: {0}")]
    Parse(String),
}

/// Read access to playlist metadata
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Fetch playlist metadata
    async fn resolve_playlist(&self, playlist: &PlaylistRef) -> Result<PlaylistInfo, CatalogError>;

    /// Fetch one page of playlist entries starting at `offset`
    async fn list_tracks(
        &self,
        playlist: &PlaylistRef,
        offset: usize,
        limit: usize,
    ) -> Result<TrackPage, CatalogError>;
}
