//! In-memory catalog and media backends for engine tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use crate::catalog::{CatalogBackend, CatalogError, PlaylistInfo, PlaylistRef, TrackInfo, TrackPage};
use crate::media::{FetchRequest, MediaBackend, MediaError, SearchCandidate};

pub fn track(name: &str) -> TrackInfo {
    TrackInfo {
        name: name.to_string(),
        artists: vec!["Artist".to_string()],
        album: "Album".to_string(),
        duration_ms: 180_000,
        external_url: None,
        id: Some(format!("id-{}", name.replace(' ', "-"))),
    }
}

pub fn playlist(name: &str, tracks_count: u32) -> PlaylistInfo {
    PlaylistInfo {
        id: "fakeplaylist".to_string(),
        name: name.to_string(),
        description: String::new(),
        tracks_count,
        owner: "tester".to_string(),
    }
}

/// Upcast fakes into the backend list a `TrackDownloader` takes
pub fn backends(media: &[Arc<FakeMedia>]) -> Vec<Arc<dyn MediaBackend>> {
    media
        .iter()
        .map(|m| m.clone() as Arc<dyn MediaBackend>)
        .collect()
}

/// Catalog serving a fixed list of entries
pub struct FakeCatalog {
    playlist: Option<PlaylistInfo>,
    entries: Vec<Option<TrackInfo>>,
    connected: bool,
    fail_from_page: Option<usize>,
    resolves: AtomicUsize,
    page_requests: AtomicUsize,
}

impl FakeCatalog {
    pub fn new(playlist: PlaylistInfo, entries: Vec<Option<TrackInfo>>) -> Self {
        Self {
            playlist: Some(playlist),
            entries,
            connected: true,
            fail_from_page: None,
            resolves: AtomicUsize::new(0),
            page_requests: AtomicUsize::new(0),
        }
    }

    /// Playlist with the given track names, all playable
    pub fn with_tracks(name: &str, tracks: &[&str]) -> Self {
        let entries = tracks.iter().map(|t| Some(track(t))).collect();
        Self::new(playlist(name, tracks.len() as u32), entries)
    }

    /// Every lookup reports `NotFound`
    pub fn missing() -> Self {
        Self {
            playlist: None,
            entries: Vec::new(),
            connected: true,
            fail_from_page: None,
            resolves: AtomicUsize::new(0),
            page_requests: AtomicUsize::new(0),
        }
    }

    /// Every call reports `NotConnected`
    pub fn disconnected(mut self) -> Self {
        self.connected = false;
        self
    }

    /// Page requests from the n-th one (0-based) on fail with a server error
    pub fn failing_from_page(mut self, page: usize) -> Self {
        self.fail_from_page = Some(page);
        self
    }

    pub fn resolves(&self) -> usize {
        self.resolves.load(Ordering::SeqCst)
    }

    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogBackend for FakeCatalog {
    async fn resolve_playlist(&self, playlist: &PlaylistRef) -> Result<PlaylistInfo, CatalogError> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        if !self.connected {
            return Err(CatalogError::NotConnected);
        }
        self.playlist
            .clone()
            .ok_or_else(|| CatalogError::NotFound(playlist.id().to_string()))
    }

    async fn list_tracks(
        &self,
        playlist: &PlaylistRef,
        offset: usize,
        limit: usize,
    ) -> Result<TrackPage, CatalogError> {
        let page = self.page_requests.fetch_add(1, Ordering::SeqCst);
        if !self.connected {
            return Err(CatalogError::NotConnected);
        }
        if self.fail_from_page.is_some_and(|first| page >= first) {
            return Err(CatalogError::Api {
                status: 500,
                message: "server error".to_string(),
            });
        }
        if self.playlist.is_none() {
            return Err(CatalogError::NotFound(playlist.id().to_string()));
        }
        let start = offset.min(self.entries.len());
        let end = (offset + limit).min(self.entries.len());
        Ok(TrackPage {
            items: self.entries[start..end].to_vec(),
        })
    }
}

/// Media backend that writes empty files instead of downloading
///
/// By default every search echoes one candidate titled after the query with
/// locator `fake://<query>`, and the first fetch of a locator succeeds.
pub struct FakeMedia {
    label: String,
    candidates: Option<Vec<SearchCandidate>>,
    search_fails: bool,
    failing: Vec<String>,
    panicking: Vec<String>,
    succeed_from: usize,
    native_ext: String,
    hold: Option<Arc<Semaphore>>,
    searches: Mutex<Vec<String>>,
    fetches: Mutex<Vec<(String, String)>>,
}

impl Default for FakeMedia {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeMedia {
    pub fn new() -> Self {
        Self {
            label: "FakeTube".to_string(),
            candidates: None,
            search_fails: false,
            failing: Vec::new(),
            panicking: Vec::new(),
            succeed_from: 0,
            native_ext: "m4a".to_string(),
            hold: None,
            searches: Mutex::new(Vec::new()),
            fetches: Mutex::new(Vec::new()),
        }
    }

    pub fn labelled(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    /// Return exactly these candidates for every query
    pub fn with_candidates(mut self, candidates: Vec<SearchCandidate>) -> Self {
        self.candidates = Some(candidates);
        self
    }

    /// Every search returns an error
    pub fn search_fails(mut self) -> Self {
        self.search_fails = true;
        self
    }

    /// Locators containing `pattern` never produce a file
    pub fn failing(mut self, pattern: &str) -> Self {
        self.failing.push(pattern.to_string());
        self
    }

    /// Searches for queries containing `pattern` panic
    pub fn panicking(mut self, pattern: &str) -> Self {
        self.panicking.push(pattern.to_string());
        self
    }

    /// The n-th fetch of a locator (0-based) is the first to write a file
    pub fn succeed_from_attempt(mut self, attempt: usize) -> Self {
        self.succeed_from = attempt;
        self
    }

    /// Extension substituted for `%(ext)s` in templates
    pub fn native_extension(mut self, ext: &str) -> Self {
        self.native_ext = ext.to_string();
        self
    }

    /// Each search waits for one permit of `gate`
    pub fn held_by(mut self, gate: Arc<Semaphore>) -> Self {
        self.hold = Some(gate);
        self
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    /// Formats requested for one locator, in order
    pub fn fetched_formats(&self, locator: &str) -> Vec<String> {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| l == locator)
            .map(|(_, f)| f.clone())
            .collect()
    }

    /// Number of fetch attempts whose locator contains `pattern`
    pub fn fetch_count(&self, pattern: &str) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| l.contains(pattern))
            .count()
    }
}

#[async_trait]
impl MediaBackend for FakeMedia {
    fn platform(&self) -> &str {
        &self.label
    }

    async fn search(&self, query: &str, _limit: usize) -> Result<Vec<SearchCandidate>, MediaError> {
        self.searches.lock().unwrap().push(query.to_string());

        if let Some(gate) = &self.hold {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if self.panicking.iter().any(|p| query.contains(p.as_str())) {
            panic!("search blew up for {}", query);
        }
        if self.search_fails {
            return Err(MediaError::Failed {
                program: self.label.clone(),
                status: "exit status: 1".to_string(),
                message: "search unavailable".to_string(),
            });
        }

        Ok(self.candidates.clone().unwrap_or_else(|| {
            vec![SearchCandidate {
                id: query.to_string(),
                title: query.to_string(),
                duration: None,
                url: format!("fake://{}", query),
                platform: self.label.clone(),
            }]
        }))
    }

    async fn fetch(&self, request: FetchRequest<'_>) -> Result<(), MediaError> {
        let attempt = {
            let mut fetches = self.fetches.lock().unwrap();
            let attempt = fetches.iter().filter(|(l, _)| l == request.locator).count();
            fetches.push((request.locator.to_string(), request.format.to_string()));
            attempt
        };

        let broken = self.failing.iter().any(|p| request.locator.contains(p.as_str()));
        if broken || attempt < self.succeed_from {
            return Err(MediaError::Failed {
                program: self.label.clone(),
                status: "exit status: 1".to_string(),
                message: format!("no usable format '{}'", request.format),
            });
        }

        let path = render_template(request.output_template, &self.native_ext);
        tokio::fs::write(&path, b"audio")
            .await
            .map_err(|e| MediaError::Parse(e.to_string()))
    }
}

/// Expand an output template the way yt-dlp does for the fields used here:
/// `%%` is a literal `%`, `%(ext)s` is the extension and any other field
/// renders as `NA`
fn render_template(template: &str, ext: &str) -> String {
    let mut out = String::new();
    let mut rest = template;
    while let Some(at) = rest.find('%') {
        out.push_str(&rest[..at]);
        rest = &rest[at..];
        if let Some(tail) = rest.strip_prefix("%%") {
            out.push('%');
            rest = tail;
        } else if let Some(field_end) = rest.strip_prefix("%(").and_then(|t| t.find(")s")) {
            let field = &rest[2..2 + field_end];
            out.push_str(if field == "ext" { ext } else { "NA" });
            rest = &rest[2 + field_end + 2..];
        } else {
            out.push('%');
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    out
}
