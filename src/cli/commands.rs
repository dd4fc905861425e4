//! CLI command handlers

use anyhow::{bail, Result};
use clap::CommandFactory;
use clap_complete::generate;
use colored::Colorize;
use indicatif::ProgressBar;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use super::render::{progress_bar, render_events};
use super::AuthManager;
use crate::catalog::SpotifyClient;
use crate::config::Settings;
use crate::download::{
    EventSink, PlaylistDownloader, RunController, RunState, TrackDownloader, MAX_WORKERS,
};
use crate::media::{MediaBackend, SearchSite, YtDlp};
use crate::utils::set_progress_mode;

/// Handle the `download` command
pub async fn download(
    config: Option<PathBuf>,
    url: String,
    workers: Option<usize>,
    output: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let settings = Settings::load(config.as_deref())?;

    let workers = match workers {
        Some(w) if !(1..=MAX_WORKERS).contains(&w) => {
            bail!("Workers must be between 1 and {}, got {}", MAX_WORKERS, w)
        }
        Some(w) => w,
        None => settings.download.max_workers,
    };
    let download_root = output.unwrap_or_else(|| settings.download.download_folder.clone());

    let credentials = AuthManager::resolve(&settings).ok_or_else(|| {
        anyhow::anyhow!("No Spotify credentials found. Run 'tunefetch auth' first to configure.")
    })?;
    let catalog = SpotifyClient::new(Some(credentials))?;
    let tracks = track_downloader(&settings, download_root);
    println!("Searching on {}", tracks.platforms().join(", ").cyan());
    let engine = PlaylistDownloader::new(Arc::new(catalog), tracks);
    let controller = engine.controller();

    println!(
        "Type {} to pause, {} to resume, {} to stop (then Enter). Ctrl+C also stops.",
        "p".cyan(),
        "r".cyan(),
        "s".cyan()
    );

    let progress = progress_bar()?;
    let (tx, rx) = mpsc::channel(256);
    let printer = tokio::spawn(render_events(rx, progress.clone(), verbose));
    let status = tokio::spawn(show_run_state(controller.subscribe(), progress.clone()));
    spawn_control_input(controller.clone(), progress.clone());
    let interrupt = tokio::spawn(stop_on_interrupt(controller, progress.clone()));

    set_progress_mode(true);
    let result = engine.run(&url, workers, EventSink::new(tx)).await;
    // The engine dropped the last sender, so the printer drains and exits
    let _ = printer.await;
    set_progress_mode(false);
    interrupt.abort();
    status.abort();

    if !progress.is_finished() {
        progress.finish_and_clear();
    }

    let summary = result?;

    println!();
    if summary.stopped {
        println!("{}", "Download stopped".yellow().bold());
    } else {
        println!("{}", "Download complete!".green().bold());
    }
    println!("  Successful: {}", summary.successful.to_string().green());
    println!("  Failed: {}", summary.failed.to_string().red());
    println!("  Total: {}", summary.total);
    println!("  Folder: {}", summary.folder.display());

    Ok(())
}

/// Search backends for the configured platforms, in priority order
fn track_downloader(settings: &Settings, download_root: PathBuf) -> TrackDownloader {
    let backends = settings
        .download
        .search_platforms
        .iter()
        .map(|site| {
            Arc::new(YtDlp::new(settings.download.ytdlp_path.clone(), *site))
                as Arc<dyn MediaBackend>
        })
        .collect();

    TrackDownloader::new(backends, download_root)
        .with_search_results(settings.download.search_results)
}

/// Read pause/resume/stop commands from stdin
///
/// Runs on its own thread; a blocked stdin read must not hold up runtime
/// shutdown.
fn spawn_control_input(controller: Arc<RunController>, progress: ProgressBar) {
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };

            match line.trim().to_lowercase().as_str() {
                "p" | "pause" => {
                    if controller.pause() {
                        let notice = "Paused, in-flight tracks will finish".yellow();
                        progress.println(notice.to_string());
                    }
                }
                "r" | "resume" => {
                    if controller.resume() {
                        progress.println("Resumed".green().to_string());
                    }
                }
                "s" | "stop" => {
                    if controller.stop() {
                        progress.println(format!(
                            "{}",
                            "Stopping after in-flight tracks finish".yellow()
                        ));
                    }
                    break;
                }
                "" => {}
                other => progress.println(format!(
                    "Unknown command '{}' (run is {})",
                    other,
                    controller.state()
                )),
            }
        }
    });
}

/// Mirror pause, resume and stop into the progress bar message
async fn show_run_state(mut states: watch::Receiver<RunState>, progress: ProgressBar) {
    let mut previous = *states.borrow_and_update();
    while states.changed().await.is_ok() {
        let state = *states.borrow_and_update();
        if let Some(message) = state_message(previous, state) {
            progress.set_message(message);
        }
        previous = state;
    }
}

/// Bar message for a state change; starting and finishing are left to the
/// event renderer
fn state_message(previous: RunState, state: RunState) -> Option<&'static str> {
    match (previous, state) {
        (_, RunState::Paused) => Some("paused"),
        (RunState::Paused, RunState::Running) => Some("downloading"),
        (_, RunState::Stopping) => Some("stopping"),
        _ => None,
    }
}

/// First Ctrl+C stops the run gracefully, a second one exits immediately
async fn stop_on_interrupt(controller: Arc<RunController>, progress: ProgressBar) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    if controller.stop() {
        progress.println(format!(
            "{}",
            "Stopping after in-flight tracks finish (Ctrl+C again to quit)".yellow()
        ));
    }

    if tokio::signal::ctrl_c().await.is_ok() {
        set_progress_mode(false);
        progress.abandon();
        std::process::exit(130);
    }
}

/// Handle the `auth` command
pub async fn auth(
    config: Option<PathBuf>,
    client_id: Option<String>,
    client_secret: Option<String>,
    force: bool,
) -> Result<()> {
    println!("{}", "Configuring Spotify credentials...".cyan());

    let creds = AuthManager::authenticate(client_id, client_secret, force).await?;

    println!();
    println!("{}", "Authentication successful!".green().bold());
    println!("  Client ID: {}", creds.client_id);
    println!();
    println!("Credentials stored securely in system keyring.");

    let settings = Settings::load(config.as_deref())?;
    if settings
        .credentials()
        .is_some_and(|stored| stored != creds)
    {
        println!(
            "{}",
            "Note: the settings file has its own credentials, which take precedence.".yellow()
        );
    }

    Ok(())
}

/// Handle the `config show` command
pub fn config_show(config: Option<PathBuf>) -> Result<()> {
    let path = Settings::resolve_path(config.as_deref())?;
    let settings = Settings::load_from(&path)?;
    let download = &settings.download;

    println!("{} {}", "Settings file:".bold(), path.display());
    if !path.exists() {
        println!("  {}", "(not created yet, showing defaults)".dimmed());
    }
    println!();
    println!("{}", "Downloads".green().bold());
    println!("  Folder: {}", download.download_folder.display());
    println!("  Workers: {}", download.max_workers);
    println!("  yt-dlp: {}", download.ytdlp_path);
    let platforms: Vec<&str> = download.search_platforms.iter().map(|s| s.label()).collect();
    println!("  Platforms: {}", platforms.join(", "));
    println!("  Search results: {}", download.search_results);
    println!();
    println!("{}", "Spotify".green().bold());
    match settings.credentials() {
        Some(creds) => {
            println!("  Client ID: {}", creds.client_id);
            println!("  Client secret: {}", mask(&creds.client_secret));
        }
        None => println!("  Client ID: {}", "(not set)".dimmed()),
    }
    let keyring = if AuthManager::exists() {
        "stored".green()
    } else {
        "none".dimmed()
    };
    println!("  Keyring credentials: {}", keyring);

    Ok(())
}

/// Handle the `config set` command
pub fn config_set(
    config: Option<PathBuf>,
    workers: Option<usize>,
    download_root: Option<PathBuf>,
    client_id: Option<String>,
    client_secret: Option<String>,
) -> Result<()> {
    if workers.is_none() && download_root.is_none() && client_id.is_none() {
        bail!("Nothing to change. See 'tunefetch config set --help'.");
    }

    let path = Settings::resolve_path(config.as_deref())?;
    let mut settings = Settings::load_from(&path)?;

    if let Some(workers) = workers {
        settings.set_max_workers(workers)?;
        println!("  Workers: {}", workers);
    }
    if let Some(root) = download_root {
        println!("  Folder: {}", root.display());
        settings.set_download_folder(root);
    }
    if let (Some(id), Some(secret)) = (client_id, client_secret) {
        settings.set_credentials(&id, &secret)?;
        println!("  Client ID: {}", id.trim());
    }

    settings.save_to(&path)?;
    println!("{} {}", "Settings saved to".green(), path.display());

    Ok(())
}

/// Handle the `check` command
pub async fn check(config: Option<PathBuf>) -> Result<()> {
    let settings = Settings::load(config.as_deref())?;
    let mut healthy = true;

    print!("Spotify: ");
    match AuthManager::resolve(&settings) {
        None => {
            healthy = false;
            println!("{}", "no credentials (run 'tunefetch auth')".yellow());
        }
        Some(creds) => match SpotifyClient::new(Some(creds))?.verify().await {
            Ok(()) => println!("{}", "connected".green()),
            Err(e) => {
                healthy = false;
                println!("{}", e.to_string().red());
            }
        },
    }

    print!("yt-dlp: ");
    match check_ytdlp(&settings.download.ytdlp_path).await {
        Ok(version) => println!("{}", version.green()),
        Err(e) => {
            healthy = false;
            println!("{}", e.to_string().red());
        }
    }

    if !healthy {
        bail!("Connection check failed");
    }
    Ok(())
}

async fn check_ytdlp(program: &str) -> Result<String> {
    Ok(YtDlp::new(program, SearchSite::Youtube).version().await?)
}

/// Handle the `completion` command
pub fn completion(shell: clap_complete::Shell) {
    let mut cmd = super::Cli::command();
    generate(shell, &mut cmd, "tunefetch", &mut io::stdout());
}

/// Keep the last four characters of a secret
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask() {
        assert_eq!(mask(""), "");
        assert_eq!(mask("abc"), "***");
        assert_eq!(mask("0123456789"), "******6789");
    }

    #[test]
    fn test_state_message() {
        assert_eq!(state_message(RunState::Idle, RunState::Running), None);
        assert_eq!(state_message(RunState::Running, RunState::Paused), Some("paused"));
        assert_eq!(state_message(RunState::Paused, RunState::Running), Some("downloading"));
        assert_eq!(state_message(RunState::Paused, RunState::Stopping), Some("stopping"));
        assert_eq!(state_message(RunState::Stopping, RunState::Completed), None);
    }

    #[tokio::test]
    async fn test_run_state_drives_bar_message() {
        let controller = RunController::new();
        let progress = ProgressBar::hidden();
        progress.set_message("Fetching playlist...");
        let status = tokio::spawn(show_run_state(controller.subscribe(), progress.clone()));

        async fn wait_for(progress: &ProgressBar, expected: &str) {
            for _ in 0..200 {
                if progress.message() == expected {
                    return;
                }
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
            panic!("bar message stayed '{}'", progress.message());
        }

        controller.start();
        controller.pause();
        wait_for(&progress, "paused").await;
        controller.resume();
        wait_for(&progress, "downloading").await;
        controller.stop();
        wait_for(&progress, "stopping").await;

        status.abort();
    }

    #[test]
    fn test_track_downloader_follows_platform_order() {
        let mut settings = Settings::default();
        settings.download.search_platforms = vec![SearchSite::Soundcloud, SearchSite::Youtube];
        let dir = tempfile::tempdir().unwrap();

        let unit = track_downloader(&settings, dir.path().to_path_buf());
        assert_eq!(unit.download_root(), dir.path());
        assert_eq!(unit.platforms(), vec!["SoundCloud", "YouTube"]);
    }

    #[test]
    fn test_config_set_writes_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        config_set(Some(path.clone()), Some(6), Some(PathBuf::from("/srv/music")), None, None)
            .unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.download.max_workers, 6);
        assert_eq!(settings.download.download_folder, PathBuf::from("/srv/music"));

        assert!(config_set(Some(path.clone()), Some(11), None, None, None).is_err());
        assert!(config_set(Some(path.clone()), None, None, None, None).is_err());
        assert_eq!(Settings::load_from(&path).unwrap().download.max_workers, 6);
    }
}
