//! Events streamed to whoever drives a run

use chrono::{DateTime, Local};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::catalog::PlaylistInfo;

/// Severity of a log event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A timestamped log line for the caller
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

/// Final counters of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub successful: usize,
    pub failed: usize,
    pub total: usize,
    /// Folder the tracks were written to
    pub folder: PathBuf,
    /// Whether a stop request cut the run short
    pub stopped: bool,
}

/// Progress updates sent during a run
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    /// Track list fetched, folder created, dispatch about to start
    Started {
        playlist: PlaylistInfo,
        total: usize,
        folder: PathBuf,
    },
    /// A track finished, successfully or not (completion order, not playlist order)
    Progress { completed: usize, total: usize },
    Log(LogEvent),
    Finished(RunSummary),
}

/// Cloneable handle workers use to report events
///
/// Every log event is mirrored into `tracing`. A sink without a channel only
/// logs.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<DownloadEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<DownloadEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sink that only writes to `tracing`
    #[cfg(test)]
    pub fn silent() -> Self {
        Self { tx: None }
    }

    async fn send(&self, event: DownloadEvent) {
        if let Some(tx) = &self.tx {
            // Receiver gone means nobody is watching; the run carries on
            let _ = tx.send(event).await;
        }
    }

    pub async fn log(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Info | LogLevel::Success => info!("{}", message),
            LogLevel::Warning => warn!("{}", message),
            LogLevel::Error => error!("{}", message),
        }

        self.send(DownloadEvent::Log(LogEvent {
            level,
            message,
            timestamp: Local::now(),
        }))
        .await;
    }

    pub async fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message).await;
    }

    pub async fn success(&self, message: impl Into<String>) {
        self.log(LogLevel::Success, message).await;
    }

    pub async fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message).await;
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message).await;
    }

    pub async fn started(&self, playlist: PlaylistInfo, total: usize, folder: PathBuf) {
        self.send(DownloadEvent::Started {
            playlist,
            total,
            folder,
        })
        .await;
    }

    pub async fn progress(&self, completed: usize, total: usize) {
        self.send(DownloadEvent::Progress { completed, total }).await;
    }

    pub async fn finished(&self, summary: RunSummary) {
        self.send(DownloadEvent::Finished(summary)).await;
    }
}
