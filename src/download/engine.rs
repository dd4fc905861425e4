//! Playlist download orchestrator
//!
//! Resolves a playlist, pages through its tracks, then fans the tracks out to
//! a bounded pool of [`TrackDownloader`] workers:
//! - Dispatch follows playlist order, completion order is arbitrary
//! - Before each submission the loop passes the [`RunController`] gate
//! - Errors and panics inside a worker count as a failed track

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::control::RunController;
use super::events::{EventSink, RunSummary};
use super::stats::RunStats;
use super::track::TrackDownloader;
use super::DownloadError;
use crate::catalog::{CatalogBackend, CatalogError, PlaylistInfo, PlaylistRef, TrackInfo};
use crate::utils::sanitize_filename;

/// Entries requested per catalog page
pub const PAGE_SIZE: usize = 100;

/// Upper bound of the worker pool
pub const MAX_WORKERS: usize = 10;

pub struct PlaylistDownloader {
    catalog: Arc<dyn CatalogBackend>,
    tracks: Arc<TrackDownloader>,
    controller: Arc<RunController>,
}

impl PlaylistDownloader {
    pub fn new(catalog: Arc<dyn CatalogBackend>, tracks: TrackDownloader) -> Self {
        Self {
            catalog,
            tracks: Arc::new(tracks),
            controller: Arc::new(RunController::new()),
        }
    }

    /// Handle for pausing, resuming and stopping runs
    pub fn controller(&self) -> Arc<RunController> {
        self.controller.clone()
    }

    /// Download every track of the playlist at `url`
    ///
    /// Fails before anything is dispatched if the URL is not a playlist, the
    /// catalog lookup fails or the playlist has no tracks. Once dispatch has
    /// started the run always ends with a summary.
    pub async fn run(
        &self,
        url: &str,
        workers: usize,
        events: EventSink,
    ) -> Result<RunSummary, DownloadError> {
        if !self.controller.start() {
            return Err(DownloadError::AlreadyRunning);
        }

        let result = self.execute(url, workers, &events).await;
        self.controller.complete();
        result
    }

    async fn execute(
        &self,
        url: &str,
        workers: usize,
        events: &EventSink,
    ) -> Result<RunSummary, DownloadError> {
        let playlist_ref = PlaylistRef::parse(url)
            .ok_or_else(|| DownloadError::InvalidPlaylistUrl(url.to_string()))?;

        events
            .info(format!("Fetching playlist {}", playlist_ref.id()))
            .await;
        let playlist = self.catalog.resolve_playlist(&playlist_ref).await?;
        events
            .info(format!(
                "Playlist: {} by {} ({} tracks)",
                playlist.name, playlist.owner, playlist.tracks_count
            ))
            .await;
        if !playlist.description.is_empty() {
            events.info(playlist.description.clone()).await;
        }

        let tracks = collect_tracks(self.catalog.as_ref(), &playlist_ref).await?;
        if tracks.is_empty() {
            return Err(DownloadError::EmptyPlaylist(playlist.name));
        }

        let folder_name: Arc<str> = playlist_folder_name(&playlist).into();
        let folder = self.tracks.download_root().join(&*folder_name);
        tokio::fs::create_dir_all(&folder)
            .await
            .map_err(|source| DownloadError::Io {
                path: folder.clone(),
                source,
            })?;

        let total = tracks.len();
        let workers = workers.clamp(1, MAX_WORKERS);
        events
            .info(format!(
                "Downloading {} tracks to {} with {} workers",
                total,
                folder.display(),
                workers
            ))
            .await;
        events.started(playlist, total, folder.clone()).await;

        let stats = Arc::new(RunStats::new(total));
        let pool = Arc::new(Semaphore::new(workers));
        let mut running = JoinSet::new();
        let mut stopped = false;

        for (index, track) in tracks.into_iter().enumerate() {
            // Take the slot first so a pause issued while waiting still holds this track back
            let Ok(permit) = pool.clone().acquire_owned().await else {
                break;
            };
            if !self.controller.wait_for_dispatch().await {
                stopped = true;
                events
                    .warning(format!(
                        "Stopped, {} of {} tracks not started",
                        total - index,
                        total
                    ))
                    .await;
                break;
            }

            debug!("Dispatching track {}/{}: {}", index + 1, total, track.name);
            let unit = self.tracks.clone();
            let stats = stats.clone();
            let events = events.clone();
            let folder_name = folder_name.clone();

            running.spawn(async move {
                let _permit = permit;
                let label = track.display_name();

                let outcome = AssertUnwindSafe(unit.download(&track, &folder_name, &events))
                    .catch_unwind()
                    .await;
                let success = match outcome {
                    Ok(Ok(outcome)) => outcome.is_success(),
                    Ok(Err(e)) => {
                        events.error(format!("Error on {}: {:#}", label, e)).await;
                        false
                    }
                    Err(_) => {
                        events.error(format!("Worker crashed on {}", label)).await;
                        false
                    }
                };

                let snapshot = stats.record(success);
                events.progress(snapshot.completed(), snapshot.total).await;
            });
        }

        // In-flight tracks always finish, even after a stop
        while let Some(joined) = running.join_next().await {
            if let Err(e) = joined {
                warn!("Worker task ended abnormally: {}", e);
            }
        }

        let snapshot = stats.snapshot();
        let summary = RunSummary {
            successful: snapshot.successful,
            failed: snapshot.failed,
            total: snapshot.total,
            folder,
            stopped,
        };
        events
            .info(format!(
                "Finished: {} successful, {} failed, {} total",
                summary.successful, summary.failed, summary.total
            ))
            .await;
        events.finished(summary.clone()).await;

        Ok(summary)
    }
}

/// Page through the playlist until a short page comes back
///
/// Entries without a playable track are skipped but still count towards the
/// page size.
pub(crate) async fn collect_tracks(
    catalog: &dyn CatalogBackend,
    playlist: &PlaylistRef,
) -> Result<Vec<TrackInfo>, CatalogError> {
    let mut tracks = Vec::new();
    let mut offset = 0;

    loop {
        let page = catalog.list_tracks(playlist, offset, PAGE_SIZE).await?;
        let fetched = page.items.len();
        tracks.extend(page.items.into_iter().flatten());
        debug!("Fetched {} entries at offset {}", fetched, offset);

        if fetched < PAGE_SIZE {
            break;
        }
        offset += fetched;
    }

    Ok(tracks)
}

/// Sanitized playlist name, or the playlist id if nothing usable survives
///
/// Names made only of dots would resolve to the download root or its parent.
fn playlist_folder_name(playlist: &PlaylistInfo) -> String {
    let name = sanitize_filename(&playlist.name);
    if name.chars().all(|c| c == '.') {
        playlist.id.clone()
    } else {
        name
    }
}
