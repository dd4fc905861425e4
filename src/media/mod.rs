//! Media retrieval backends: search a video/audio platform, fetch a chosen entry

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub mod ytdlp;

pub use ytdlp::{SearchSite, YtDlp};

/// One search result, consumed immediately by the matcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    /// Backend-internal id
    pub id: String,
    pub title: String,
    pub duration: Option<Duration>,
    /// Playable URL handed to `fetch`
    pub url: String,
    /// Source platform label, e.g. "YouTube"
    pub platform: String,
}

/// Everything one fetch attempt asks of the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest<'a> {
    pub locator: &'a str,
    /// Backend format selector, e.g. `bestaudio/best`
    pub format: &'a str,
    /// Output path template; may contain `%(ext)s`
    pub output_template: &'a str,
    pub retries: u8,
}

/// Failures reported by a media backend
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {message}")]
    Failed {
        program: String,
        status: String,
        message: String,
    },

    #[error("unreadable backend output: {0}")]
    Parse(String),
}

/// A searchable, fetchable media platform
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Platform label used in logs and candidates
    fn platform(&self) -> &str;

    /// Search and return candidates in the backend's relevance order
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchCandidate>, MediaError>;

    /// Fetch one entry to disk; success says nothing about which file appeared
    async fn fetch(&self, request: FetchRequest<'_>) -> Result<(), MediaError>;
}
