mod app;
mod collection;
mod command;
mod message;
mod navigation;
mod state;
mod theme;
mod ticker;
mod ui;
mod widgets;

use std::io;

use clap::Parser;
use ratatui::crossterm::{
    execute,
    terminal::{disable_raw_mode, LeaveAlternateScreen},
};
use sptui_proto::config::Config;
use sptui_proto::platform;
use sptui_proto::session::CredentialStore;

use crate::command::LoginContext;

/// Browse your Spotify library and control playback from the terminal.
#[derive(Parser, Debug)]
#[command(name = "sptui", version, about)]
struct Args {
    /// Forget the stored session and sign in again
    #[arg(long)]
    logout: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_path = platform::log_file();
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // HTTP client internals are noisy at debug.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("sptui log: {}", log_path.display());
    tracing::info!("sptui starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("config load failed, using defaults: {}", e);
        Config::default()
    });

    if args.logout {
        let store = CredentialStore::new(&config.paths.token_file);
        store.clear()?;
        tracing::info!("cleared session at {}", store.path().display());
    }

    // Restore the terminal before the panic message is printed.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        default_hook(info);
    }));

    // ── Run TUI ──────────────────────────────────────────────────────────────
    app::App::new(LoginContext::new(config)).run().await?;

    Ok(())
}
