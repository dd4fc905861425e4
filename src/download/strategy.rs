//! Retrieval strategy chain: try format selectors until a file lands on disk
//!
//! Each strategy is an independent fetch. Backend errors are logged and the
//! chain moves on; the only success criterion is the expected file existing
//! afterwards.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::media::{FetchRequest, MediaBackend};

/// One entry of the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatStrategy {
    pub label: &'static str,
    /// Backend format selector
    pub format: &'static str,
    pub retries: u8,
}

/// Ordered strategies, each written straight to `<stem>.mp3`
pub const FORMAT_STRATEGIES: &[FormatStrategy] = &[
    FormatStrategy {
        label: "preferred audio container",
        format: "bestaudio[ext=m4a]/bestaudio[ext=webm]/bestaudio",
        retries: 3,
    },
    FormatStrategy {
        label: "best audio",
        format: "bestaudio/best",
        retries: 3,
    },
    FormatStrategy {
        label: "worst audio",
        format: "worstaudio/worst",
        retries: 3,
    },
    FormatStrategy {
        label: "video up to 720p",
        format: "best[height<=720]/best",
        retries: 3,
    },
];

/// Generic stream, written with whatever extension the backend picks
pub const LAST_RESORT: FormatStrategy = FormatStrategy {
    label: "last resort",
    format: "best",
    retries: 5,
};

/// Extension of the file every regular strategy must produce
pub const PRIMARY_EXTENSION: &str = "mp3";

/// Extensions accepted from the last-resort strategy, in lookup order
pub const FALLBACK_EXTENSIONS: &[&str] = &["mp4", "webm", "m4a", "mp3"];

/// Result of running the chain for one track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalOutcome {
    pub path: Option<PathBuf>,
}

/// Data-driven fallback chain over a media backend
#[derive(Debug, Clone)]
pub struct RetrievalChain {
    strategies: Vec<FormatStrategy>,
    last_resort: Option<FormatStrategy>,
}

impl Default for RetrievalChain {
    fn default() -> Self {
        Self::new(FORMAT_STRATEGIES.to_vec(), Some(LAST_RESORT))
    }
}

impl RetrievalChain {
    pub fn new(strategies: Vec<FormatStrategy>, last_resort: Option<FormatStrategy>) -> Self {
        Self {
            strategies,
            last_resort,
        }
    }

    /// Fetch `locator` to `<stem>.mp3`, or `<stem>.<ext>` via the last resort
    pub async fn retrieve(
        &self,
        backend: &dyn MediaBackend,
        locator: &str,
        stem: &Path,
    ) -> RetrievalOutcome {
        let primary = with_extension(stem, PRIMARY_EXTENSION);
        let primary_template = format!("{}.{}", template_stem(stem), PRIMARY_EXTENSION);

        for (i, strategy) in self.strategies.iter().enumerate() {
            debug!(
                "Strategy {}/{} ({}) for {}",
                i + 1,
                self.strategies.len(),
                strategy.label,
                locator
            );

            if let Err(e) = backend
                .fetch(FetchRequest {
                    locator,
                    format: strategy.format,
                    output_template: &primary_template,
                    retries: strategy.retries,
                })
                .await
            {
                warn!("Strategy '{}' failed for {}: {}", strategy.label, locator, e);
            }

            if file_exists(&primary).await {
                info!("Saved {}", primary.display());
                return RetrievalOutcome {
                    path: Some(primary),
                };
            }
            debug!("No file after '{}', trying next strategy", strategy.label);
        }

        let Some(last_resort) = self.last_resort else {
            return RetrievalOutcome { path: None };
        };

        warn!("All format strategies failed for {}, trying last resort", locator);
        let template = format!("{}.%(ext)s", template_stem(stem));
        if let Err(e) = backend
            .fetch(FetchRequest {
                locator,
                format: last_resort.format,
                output_template: &template,
                retries: last_resort.retries,
            })
            .await
        {
            warn!("Last resort failed for {}: {}", locator, e);
        }

        for ext in FALLBACK_EXTENSIONS {
            let candidate = with_extension(stem, ext);
            if file_exists(&candidate).await {
                info!("Saved {} via last resort", candidate.display());
                return RetrievalOutcome {
                    path: Some(candidate),
                };
            }
        }

        RetrievalOutcome { path: None }
    }
}

/// `<stem>.<ext>` without touching dots already in the stem
fn with_extension(stem: &Path, ext: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Stem as literal output-template text, with `%` escaped as `%%`
fn template_stem(stem: &Path) -> String {
    stem.to_string_lossy().replace('%', "%%")
}

async fn file_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::testing::FakeMedia;

    #[test]
    fn test_with_extension_keeps_dots() {
        let path = with_extension(Path::new("/music/Mr. Brightside - The Killers"), "mp3");
        assert_eq!(path, PathBuf::from("/music/Mr. Brightside - The Killers.mp3"));
    }

    #[test]
    fn test_template_stem_escapes_percent() {
        assert_eq!(
            template_stem(Path::new("/music/100% (%(title)s) - DJ")),
            "/music/100%% (%%(title)s) - DJ"
        );
    }

    #[tokio::test]
    async fn test_percent_in_stem_lands_at_literal_path() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("100% Pure %(title)s - Artist");

        let media = FakeMedia::new();
        let outcome = RetrievalChain::default()
            .retrieve(&media, "fake://pure", &stem)
            .await;
        assert_eq!(
            outcome.path,
            Some(dir.path().join("100% Pure %(title)s - Artist.mp3"))
        );

        // Last resort, in a fresh folder so the mp3 above does not count
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("100% Pure %(title)s - Artist");
        let media = FakeMedia::new()
            .succeed_from_attempt(FORMAT_STRATEGIES.len())
            .native_extension("webm");
        let outcome = RetrievalChain::default()
            .retrieve(&media, "fake://pure", &stem)
            .await;
        assert_eq!(
            outcome.path,
            Some(dir.path().join("100% Pure %(title)s - Artist.webm"))
        );
    }

    #[tokio::test]
    async fn test_first_success_halts_chain() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("Song - Artist");
        let media = FakeMedia::new().succeed_from_attempt(1);

        let outcome = RetrievalChain::default()
            .retrieve(&media, "fake://song", &stem)
            .await;

        assert_eq!(outcome.path, Some(dir.path().join("Song - Artist.mp3")));
        let formats = media.fetched_formats("fake://song");
        assert_eq!(
            formats,
            vec![FORMAT_STRATEGIES[0].format, FORMAT_STRATEGIES[1].format]
        );
    }

    #[tokio::test]
    async fn test_last_resort_after_all_strategies() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("Clip");
        let media = FakeMedia::new()
            .succeed_from_attempt(FORMAT_STRATEGIES.len())
            .native_extension("webm");

        let outcome = RetrievalChain::default()
            .retrieve(&media, "fake://clip", &stem)
            .await;

        assert_eq!(outcome.path, Some(dir.path().join("Clip.webm")));
        assert_eq!(media.fetched_formats("fake://clip").len(), FORMAT_STRATEGIES.len() + 1);
        assert_eq!(
            media.fetched_formats("fake://clip").last().map(String::as_str),
            Some(LAST_RESORT.format)
        );
    }

    #[tokio::test]
    async fn test_exhausted_chain_fails() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("Gone");
        let media = FakeMedia::new().failing("fake://gone");

        let outcome = RetrievalChain::default()
            .retrieve(&media, "fake://gone", &stem)
            .await;

        assert_eq!(outcome.path, None);
        assert_eq!(media.fetched_formats("fake://gone").len(), FORMAT_STRATEGIES.len() + 1);
    }

    #[tokio::test]
    async fn test_chain_without_last_resort() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("Gone");
        let media = FakeMedia::new().failing("fake://gone");
        let chain = RetrievalChain::new(vec![FORMAT_STRATEGIES[1]], None);

        let outcome = chain.retrieve(&media, "fake://gone", &stem).await;

        assert_eq!(outcome.path, None);
        assert_eq!(media.fetched_formats("fake://gone"), vec!["bestaudio/best"]);
    }
}
