//! Terminal rendering of download events

use anyhow::Result;
use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::download::{DownloadEvent, LogEvent, LogLevel};

/// Progress bar shown while tracks download
pub fn progress_bar() -> Result<ProgressBar> {
    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    progress.set_message("Fetching playlist...");
    Ok(progress)
}

/// Drain run events into the progress bar until the run drops its sink
pub async fn render_events(
    mut rx: mpsc::Receiver<DownloadEvent>,
    progress: ProgressBar,
    verbose: bool,
) {
    while let Some(event) = rx.recv().await {
        match event {
            DownloadEvent::Started {
                playlist,
                total,
                folder,
            } => {
                progress.println(format!(
                    "{} {} by {} ({} tracks)",
                    "Playlist:".bold(),
                    playlist.name.cyan(),
                    playlist.owner,
                    total
                ));
                if !playlist.description.is_empty() {
                    progress.println(format!("  {}", playlist.description.dimmed()));
                }
                progress.println(format!("Saving to {}", folder.display()));
                progress.set_length(total as u64);
                progress.set_message("downloading");
            }
            DownloadEvent::Progress { completed, total } => {
                progress.set_length(total as u64);
                // Completions race each other; never move the bar backwards
                progress.set_position(progress.position().max(completed as u64));
            }
            DownloadEvent::Log(event) => {
                if let Some(line) = format_log(&event, verbose) {
                    progress.println(line);
                }
            }
            DownloadEvent::Finished(summary) => {
                if summary.stopped {
                    progress.abandon_with_message("stopped");
                } else {
                    progress.finish_with_message("done");
                }
            }
        }
    }
}

/// One log line, or `None` for detail lines hidden in compact mode
pub fn format_log(event: &LogEvent, verbose: bool) -> Option<String> {
    let message: ColoredString = match event.level {
        LogLevel::Info if !verbose => return None,
        LogLevel::Info => event.message.normal(),
        LogLevel::Success => event.message.green(),
        LogLevel::Warning => event.message.yellow(),
        LogLevel::Error => event.message.red(),
    };
    Some(format!(
        "{} {}",
        event.timestamp.format("[%H:%M:%S]").to_string().dimmed(),
        message
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn event(level: LogLevel, message: &str) -> LogEvent {
        LogEvent {
            level,
            message: message.to_string(),
            timestamp: Local::now(),
        }
    }

    #[test]
    fn test_compact_mode_hides_detail_lines() {
        colored::control::set_override(false);

        assert!(format_log(&event(LogLevel::Info, "Searching"), false).is_none());

        let line = format_log(&event(LogLevel::Info, "Searching"), true).unwrap();
        assert!(line.ends_with(" Searching"));

        let line = format_log(&event(LogLevel::Error, "Failed: Song"), false).unwrap();
        assert!(line.starts_with('['));
        assert!(line.ends_with("Failed: Song"));
    }

    #[tokio::test]
    async fn test_progress_never_goes_backwards() {
        let (tx, rx) = mpsc::channel(8);
        let progress = ProgressBar::hidden();

        tx.send(DownloadEvent::Progress { completed: 2, total: 3 }).await.unwrap();
        tx.send(DownloadEvent::Progress { completed: 1, total: 3 }).await.unwrap();
        drop(tx);
        render_events(rx, progress.clone(), false).await;

        assert_eq!(progress.position(), 2);
        assert_eq!(progress.length(), Some(3));
    }
}
