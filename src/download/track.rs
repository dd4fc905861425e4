//! Track download unit: search, match and retrieve one playlist entry

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::events::EventSink;
use super::matcher::best_match;
use super::strategy::RetrievalChain;
use crate::catalog::TrackInfo;
use crate::media::{MediaBackend, SearchCandidate};
use crate::utils::sanitize_filename;

/// Default number of search results requested per platform
pub const DEFAULT_SEARCH_RESULTS: usize = 5;

/// How a single track ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackOutcome {
    Downloaded(PathBuf),
    /// No platform returned a candidate
    NotFound,
    /// Every retrieval strategy failed
    RetrievalFailed,
}

impl TrackOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TrackOutcome::Downloaded(_))
    }
}

/// Downloads individual tracks into `<download_root>/<playlist folder>/`
pub struct TrackDownloader {
    /// Search platforms in priority order
    backends: Vec<Arc<dyn MediaBackend>>,
    chain: RetrievalChain,
    download_root: PathBuf,
    search_results: usize,
}

impl TrackDownloader {
    pub fn new(backends: Vec<Arc<dyn MediaBackend>>, download_root: PathBuf) -> Self {
        Self {
            backends,
            chain: RetrievalChain::default(),
            download_root,
            search_results: DEFAULT_SEARCH_RESULTS,
        }
    }

    pub fn with_search_results(mut self, limit: usize) -> Self {
        self.search_results = limit.max(1);
        self
    }

    /// Search platform labels, in priority order
    pub fn platforms(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.platform()).collect()
    }

    pub fn download_root(&self) -> &Path {
        &self.download_root
    }

    /// `"<name> <artists> <album>"`
    pub fn search_query(track: &TrackInfo) -> String {
        format!("{} {} {}", track.name, track.artist_list(), track.album)
    }

    /// Sanitized `"<name> - <artists>"`
    pub fn file_stem(track: &TrackInfo) -> String {
        sanitize_filename(&track.display_name())
    }

    /// Search platforms in order; the first one with any candidate wins
    async fn search(
        &self,
        query: &str,
        events: &EventSink,
    ) -> Option<(Arc<dyn MediaBackend>, SearchCandidate)> {
        for backend in &self.backends {
            events
                .info(format!("Searching {}: {}", backend.platform(), query))
                .await;

            let candidates = match backend.search(query, self.search_results).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    events
                        .warning(format!("{} search failed: {}", backend.platform(), e))
                        .await;
                    continue;
                }
            };

            if candidates.is_empty() {
                continue;
            }

            return best_match(query, &candidates).map(|c| (backend.clone(), c.clone()));
        }
        None
    }

    /// Download one track into `playlist_folder`
    ///
    /// Not-found and retrieval failures are outcomes, not errors; `Err` means
    /// something unexpected (e.g. the folder could not be created).
    pub async fn download(
        &self,
        track: &TrackInfo,
        playlist_folder: &str,
        events: &EventSink,
    ) -> Result<TrackOutcome> {
        let label = track.display_name();
        let query = Self::search_query(track);

        let Some((backend, candidate)) = self.search(&query, events).await else {
            events.error(format!("Not found: {}", label)).await;
            return Ok(TrackOutcome::NotFound);
        };

        let folder = self.download_root.join(playlist_folder);
        tokio::fs::create_dir_all(&folder)
            .await
            .with_context(|| format!("Failed to create {}", folder.display()))?;
        let stem = folder.join(Self::file_stem(track));

        events
            .info(format!(
                "Downloading: {} ({}: {})",
                label, candidate.platform, candidate.title
            ))
            .await;

        let outcome = self
            .chain
            .retrieve(backend.as_ref(), &candidate.url, &stem)
            .await;

        match outcome.path {
            Some(path) => {
                events.success(format!("Done: {}", label)).await;
                Ok(TrackOutcome::Downloaded(path))
            }
            None => {
                events.error(format!("Failed: {}", label)).await;
                Ok(TrackOutcome::RetrievalFailed)
            }
        }
    }
}
