//! yt-dlp backed search and retrieval

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{FetchRequest, MediaBackend, MediaError, SearchCandidate};

/// Platforms yt-dlp can search by keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSite {
    Youtube,
    Soundcloud,
}

impl SearchSite {
    pub fn label(self) -> &'static str {
        match self {
            SearchSite::Youtube => "YouTube",
            SearchSite::Soundcloud => "SoundCloud",
        }
    }

    /// yt-dlp search prefix, used as `<key><limit>:<query>`
    fn search_key(self) -> &'static str {
        match self {
            SearchSite::Youtube => "ytsearch",
            SearchSite::Soundcloud => "scsearch",
        }
    }

    /// Playable URL for a flat search entry
    fn locator(self, entry: &FlatEntry) -> Option<String> {
        match self {
            SearchSite::Youtube => Some(format!("https://www.youtube.com/watch?v={}", entry.id)),
            SearchSite::Soundcloud => entry
                .webpage_url
                .clone()
                .or_else(|| entry.url.clone())
                .filter(|u| u.starts_with("http")),
        }
    }
}

/// One line of `--dump-json --flat-playlist` output
#[derive(Debug, Clone, Deserialize)]
struct FlatEntry {
    id: String,
    title: Option<String>,
    duration: Option<f64>,
    url: Option<String>,
    webpage_url: Option<String>,
}

/// yt-dlp command-line wrapper for one search site
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
    site: SearchSite,
}

impl YtDlp {
    pub fn new(program: impl Into<String>, site: SearchSite) -> Self {
        Self {
            program: program.into(),
            site,
        }
    }

    /// Report the installed yt-dlp version
    pub async fn version(&self) -> Result<String, MediaError> {
        let output = self.run(&["--version".to_string()]).await?;
        Ok(output.trim().to_string())
    }

    /// Run yt-dlp to completion and return stdout
    async fn run(&self, args: &[String]) -> Result<String, MediaError> {
        let output = self.output(args).await?;
        if !output.status.success() {
            return Err(self.failure(&output));
        }

        String::from_utf8(output.stdout).map_err(|e| MediaError::Parse(e.to_string()))
    }

    /// Run yt-dlp to completion, whatever its exit status
    async fn output(&self, args: &[String]) -> Result<Output, MediaError> {
        debug!("Running {} {}", self.program, args.join(" "));

        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| MediaError::Spawn {
                program: self.program.clone(),
                source,
            })
    }

    /// Error for a non-zero exit, carrying the last line of stderr
    fn failure(&self, output: &Output) -> MediaError {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("no error output")
            .to_string();
        MediaError::Failed {
            program: self.program.clone(),
            status: output.status.to_string(),
            message,
        }
    }

    /// Turn `--dump-json` output into candidates, skipping unreadable lines
    fn parse_search_output(&self, stdout: &str) -> Vec<SearchCandidate> {
        stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<FlatEntry>(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable search entry: {}", e);
                    None
                }
            })
            .filter_map(|entry| {
                let title = entry.title.clone()?;
                let url = self.site.locator(&entry)?;
                Some(SearchCandidate {
                    id: entry.id,
                    title,
                    duration: entry
                        .duration
                        .filter(|d| d.is_finite() && *d >= 0.0)
                        .map(Duration::from_secs_f64),
                    url,
                    platform: self.site.label().to_string(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl MediaBackend for YtDlp {
    fn platform(&self) -> &str {
        self.site.label()
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchCandidate>, MediaError> {
        let args = vec![
            "--dump-json".to_string(),
            "--flat-playlist".to_string(),
            "--no-warnings".to_string(),
            "--ignore-errors".to_string(),
            format!("{}{}:{}", self.site.search_key(), limit, query),
        ];

        // With --ignore-errors yt-dlp exits non-zero when any single entry
        // fails, after printing the entries it could read
        let output = self.output(&args).await?;
        let candidates = self.parse_search_output(&String::from_utf8_lossy(&output.stdout));
        if !output.status.success() {
            if candidates.is_empty() {
                return Err(self.failure(&output));
            }
            warn!(
                "{} search for '{}' exited with {}, keeping {} candidates",
                self.site.label(),
                query,
                output.status,
                candidates.len()
            );
        }
        debug!(
            "{} returned {} candidates for '{}'",
            self.site.label(),
            candidates.len(),
            query
        );
        Ok(candidates)
    }

    async fn fetch(&self, request: FetchRequest<'_>) -> Result<(), MediaError> {
        let retries = request.retries.to_string();
        let args = vec![
            "-f".to_string(),
            request.format.to_string(),
            "-o".to_string(),
            request.output_template.to_string(),
            "--no-playlist".to_string(),
            "--no-progress".to_string(),
            "--no-warnings".to_string(),
            "--retries".to_string(),
            retries.clone(),
            "--fragment-retries".to_string(),
            retries.clone(),
            "--extractor-retries".to_string(),
            retries,
            "--skip-unavailable-fragments".to_string(),
            request.locator.to_string(),
        ];

        self.run(&args).await.map(|_| ())
    }
}
