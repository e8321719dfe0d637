//! services/api/src/bin/lookup.rs
//!
//! Terminal client for the lookup tool. Shares the state file, dataset
//! sources and pipeline settings with the `api` server.

use api_lib::{
    adapters::{FileStore, HttpDatasetAdapter, SystemClipboard},
    config::Config,
    error::ApiError,
    web::state::AppState,
};
use clap::{Parser, Subcommand};
use lookup_core::pipeline::{Outcome, PipelineState, STAGE_LABELS};
use lookup_core::{ClipboardService, Credentials, PlatformId, PortError, SubmitError};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lookup", about = "Username lookup from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in with the built-in credentials
    Login { username: String, password: String },
    /// Log out and forget the selected platform
    Logout,
    /// Select the platform to search, or clear the selection
    Platform {
        platform: Option<PlatformId>,
        #[arg(long, conflicts_with = "platform")]
        clear: bool,
    },
    /// Toggle the dark mode flag
    DarkMode,
    /// Run a staged search
    Search {
        /// Username to look up; read from the clipboard when omitted
        username: Option<String>,
        /// Overrides the selected platform for this search
        #[arg(long)]
        platform: Option<PlatformId>,
        /// Copy the result to the clipboard
        #[arg(long)]
        copy: bool,
    },
    /// Show past searches, newest first
    History {
        #[arg(long)]
        clear: bool,
        /// Copy the result of the given entry (0 is the newest)
        #[arg(long, value_name = "INDEX")]
        copy: Option<usize>,
    },
}

/// Copies text, degrading any clipboard failure to a notice.
fn copy_to_clipboard(text: &str) {
    let copied = SystemClipboard::new().and_then(|mut clipboard| clipboard.write_text(text));
    match copied {
        Ok(()) => println!("نتیجه کپی شد!"),
        Err(e) => {
            warn!("{}", e);
            println!("کپی ناموفق بود.");
        }
    }
}

async fn run_search(
    app_state: &AppState,
    username: String,
    platform: PlatformId,
    copy: bool,
) -> Result<(), ApiError> {
    let pipeline = app_state.new_pipeline(platform);
    let mut states = pipeline.subscribe();

    let handle = match pipeline.submit(&username) {
        Ok(handle) => handle,
        Err(SubmitError::Invalid(e)) => {
            println!("{}", e);
            return Ok(());
        }
        Err(SubmitError::Busy) => return Err(ApiError::Internal("search already running".to_string())),
    };

    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                match state {
                    PipelineState::Staging { stage } => {
                        let percent = state.progress().unwrap_or_default() * 100.0;
                        println!("[{:>3.0}%] {}", percent, STAGE_LABELS[stage]);
                    }
                    PipelineState::Executing => println!("[...] {}", platform.info().name),
                    PipelineState::Settled(_) | PipelineState::Idle => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                pipeline.reset();
                println!("Search abandoned.");
                return Ok(());
            }
        }
    }

    let outcome = handle
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    match outcome {
        Some(Outcome::Errored(e)) => println!("{}", e),
        Some(outcome) => {
            let result = outcome.result();
            println!("{}", result.copy_text());
            if copy {
                copy_to_clipboard(&result.copy_text());
            }
        }
        None => println!("Search abandoned."),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let cli = Cli::parse();

    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let store = Arc::new(FileStore::open(&config.state_path).await?);
    let source = Arc::new(HttpDatasetAdapter::new(
        reqwest::Client::builder().build()?,
        config.dataset_urls.clone(),
    ));
    let app_state = AppState::new(config, source, store);
    let prefs = &app_state.preferences;

    match cli.command {
        Command::Login { username, password } => {
            match prefs.login(&Credentials { username, password }).await {
                Ok(()) => println!("Logged in."),
                Err(PortError::Unauthorized) => println!("نام کاربری یا رمز عبور اشتباه است"),
                Err(e) => return Err(e.into()),
            }
        }
        Command::Logout => prefs.logout().await?,
        Command::Platform { clear: true, .. } => prefs.clear_platform().await?,
        Command::Platform { platform: Some(platform), .. } => {
            match prefs.select_platform(platform).await {
                Err(PortError::Unauthorized) => println!("Log in first."),
                other => other?,
            }
        }
        Command::Platform { platform: None, .. } => {
            let snapshot = prefs.snapshot().await?;
            match snapshot.selected_platform {
                Some(p) => println!("{} ({})", p, p.info().name),
                None => println!("No platform selected."),
            }
        }
        Command::DarkMode => {
            let dark = prefs.toggle_dark_mode().await?;
            println!("dark mode: {}", if dark { "on" } else { "off" });
        }
        Command::Search { username, platform, copy } => {
            let snapshot = prefs.snapshot().await?;
            if !snapshot.is_logged_in {
                println!("Log in first.");
                return Ok(());
            }
            let Some(platform) = platform.or(snapshot.selected_platform) else {
                println!("Select a platform first.");
                return Ok(());
            };
            let username = match username {
                Some(username) => username,
                None => match SystemClipboard::new().and_then(|mut c| c.read_text()) {
                    Ok(text) => text.trim().to_string(),
                    Err(e) => {
                        warn!("{}", e);
                        println!("Paste failed.");
                        return Ok(());
                    }
                },
            };
            run_search(&app_state, username, platform, copy).await?;
        }
        Command::History { clear: true, .. } => app_state.history.clear().await?,
        Command::History { copy: Some(index), .. } => {
            let entries = app_state.history.all().await?;
            match entries.get(index) {
                Some(entry) => copy_to_clipboard(&entry.result.copy_text()),
                None => println!("No history entry {}.", index),
            }
        }
        Command::History { .. } => {
            for entry in app_state.history.all().await? {
                println!(
                    "{}  {:<10} {:<24} {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.platform,
                    entry.username,
                    entry.result.copy_text()
                );
            }
        }
    }

    Ok(())
}
