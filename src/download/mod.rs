//! Playlist download engine
//!
//! Resolves a playlist through a [`CatalogBackend`](crate::catalog::CatalogBackend),
//! then downloads each track from a [`MediaBackend`](crate::media::MediaBackend)
//! on a bounded worker pool that can be paused and stopped.

use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::CatalogError;

mod control;
mod engine;
mod events;
mod matcher;
mod stats;
mod strategy;
mod track;

#[cfg(test)]
pub(crate) mod testing;

pub use control::{RunController, RunState};
pub use engine::{PlaylistDownloader, MAX_WORKERS};
pub use events::{DownloadEvent, EventSink, LogEvent, LogLevel};
pub use track::{TrackDownloader, DEFAULT_SEARCH_RESULTS};

/// Reasons a run never got to dispatch its tracks
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("not a playlist URL: {0}")]
    InvalidPlaylistUrl(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("playlist '{0}' has no downloadable tracks")]
    EmptyPlaylist(String),

    #[error("a download is already running")]
    AlreadyRunning,

    #[error("failed to create {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
