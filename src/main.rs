//! # Telemetry Poller
//!
//! Poll a tracking backend for live runner telemetry and show it on a
//! terminal dashboard.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Parse command line, load configuration (or defaults)
//!    - Set up logging with tracing subscriber (plus optional log file)
//!    - Resolve the session id once
//!    - Load session total and history
//!
//! 2. **Main Loop**
//!    - Every tick (1 s by default) spawn a refresh: collect, fetch latest,
//!      update the dashboard
//!    - Stop once the backend reports the session as expired
//!    - Handle Ctrl+C for graceful shutdown
//!
//! # Examples
//!
//! ```bash
//! cargo run --release -- --config config/poller.toml --session-id 3f2a
//! ```
//!
//! Expected output:
//! ```text
//! INFO telemetry_poller: Telemetry Poller v0.1.0 starting...
//! INFO telemetry_poller: Polling http://127.0.0.1:8000/api every 1000ms
//! INFO telemetry_poller::dashboard::terminal: [live] Telemetry stream active
//! INFO telemetry_poller::dashboard::terminal: 45.76322, 4.83287 | 21.4 °C | -- | 1013 hPa | batt 87 % | 152.0 m | 14:02:11
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use telemetry_poller::backend::http::HttpBackend;
use telemetry_poller::config::{Config, LoggingConfig};
use telemetry_poller::dashboard::terminal::TerminalSurface;
use telemetry_poller::poller::{Poller, PollerSettings};
use telemetry_poller::session::SessionContext;
use telemetry_poller::telemetry::recorder::SampleRecorder;

/// Number of ticks between status log messages
const LOG_INTERVAL_TICKS: u64 = 60;

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "telemetry-poller", version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Session id to follow (overrides state file and config)
    #[arg(short, long)]
    session_id: Option<String>,

    /// Backend base URL, e.g. http://127.0.0.1:8000/api
    #[arg(short, long)]
    base_url: Option<String>,
}

/// Whether tick number `tick_count` (1-based) gets a status log line
fn is_status_tick(tick_count: u64) -> bool {
    tick_count > 0 && tick_count % LOG_INTERVAL_TICKS == 0
}

/// Scheme and authority of a URL, used to show where to log in.
fn origin_of(url: &str) -> &str {
    let Some(scheme_end) = url.find("://") else {
        return url;
    };
    let rest = &url[scheme_end + 3..];
    match rest.find('/') {
        Some(path_start) => &url[..scheme_end + 3 + path_start],
        None => url,
    }
}

/// Install the tracing subscriber.
///
/// The returned guard must live until exit so buffered file logs flush.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let level = config.level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let Some(file) = config.file.as_deref() else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return None;
    };

    let path = Path::new(file);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "telemetry-poller.log".to_string());

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, name));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
        .init();

    Some(guard)
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(base_url) = &cli.base_url {
        config.backend.base_url = base_url.clone();
        config.validate().context("Invalid --base-url")?;
    }

    Ok(config)
}

/// Main entry point
///
/// # Errors
///
/// Returns error if:
/// - The configuration file cannot be read or is invalid
/// - The HTTP client or the sample recorder cannot be set up
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let _log_guard = init_logging(&config.logging);

    info!("Telemetry Poller v{} starting...", env!("CARGO_PKG_VERSION"));

    let session = SessionContext::resolve(cli.session_id.as_deref(), &config.session);
    match (session.id(), session.source()) {
        (Some(id), Some(source)) => info!("Following session {} (from {:?})", id, source),
        _ => info!("No session configured; history and totals disabled"),
    }

    let backend = HttpBackend::new(&config.backend).context("Failed to create HTTP backend")?;
    let surface = TerminalSurface::new(origin_of(backend.base_url()));
    info!("Polling {} every {}ms", backend.base_url(), config.poller.interval_ms);

    let mut poller = Poller::new(
        PollerSettings::from_config(&config),
        Arc::new(backend),
        Box::new(surface),
        session,
    );
    if config.recorder.enabled {
        let recorder = SampleRecorder::new(&config.recorder).context("Failed to set up sample recorder")?;
        poller = poller.with_recorder(recorder);
    }
    let poller = Arc::new(poller);

    poller.start().await;

    let mut ticker = interval(Duration::from_millis(config.poller.interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Press Ctrl+C to exit");

    let mut tick_count: u64 = 0;

    // Main polling loop
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if poller.login_required() {
                    warn!("Session is no longer valid, stopping");
                    break;
                }

                let tick_poller = poller.clone();
                tokio::spawn(async move {
                    tick_poller.refresh().await;
                });

                tick_count += 1;
                if is_status_tick(tick_count) {
                    debug!("{} ticks, status: {}", tick_count, poller.presentation().message());
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    info!("Total ticks: {}", tick_count);
    Ok(())
}
