//! segfuzz - path-segment URL fuzzer
//!
//! Injects every wordlist entry at every path position of a target URL,
//! probes the candidates concurrently, and reports responses that differ
//! from a baseline fetch of the unmodified target.

mod app;
mod error;
mod fuzzer;
mod http;
mod reporting;

pub use error::*;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app::{App, Config, RunConfig};
use crate::fuzzer::Fuzzer;

/// Path-segment URL fuzzer
#[derive(Parser, Debug)]
#[command(name = "segfuzz")]
#[command(author, version, about = "Path-segment URL fuzzer", long_about = None)]
struct Cli {
    /// Path to the wordlist file
    #[arg(short, long, required_unless_present = "generate_config")]
    wordlist: Option<PathBuf>,

    /// Target URL to fuzz
    #[arg(short, long, required_unless_present = "generate_config")]
    url: Option<String>,

    /// Output file for results
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Comma-separated list of status codes to include in results
    /// (the single-dash `-mc` spelling is written `--mc`)
    #[arg(long = "status-codes", visible_alias = "mc", default_value = "200")]
    status_codes: String,

    /// Maximum concurrent requests (0 for no limit)
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Stop launching requests after this many seconds
    #[arg(long)]
    max_time: Option<u64>,

    /// User agent string
    #[arg(long)]
    user_agent: Option<String>,

    /// Do not follow redirects
    #[arg(long)]
    no_redirects: bool,

    /// Accept invalid TLS certificates
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Sort results by URL instead of completion order
    #[arg(long)]
    sort: bool,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Generate default configuration and exit
    #[arg(long)]
    generate_config: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Log file path (enables file logging)
    #[arg(long)]
    log_file: Option<String>,

    /// Enable JSON structured logging
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.generate_config {
        return generate_default_config();
    }

    init_logging(&cli)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting segfuzz");

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "Run failed");
        eprintln!("Error: {}", e.user_message());
        std::process::exit(1);
    }

    Ok(())
}

/// Initialize the logging system
///
/// Logs go to stderr or a file; stdout carries only the report.
fn init_logging(cli: &Cli) -> Result<()> {
    let env_filter = EnvFilter::try_new(&cli.log_level)
        .with_context(|| format!("Invalid log level: {}", cli.log_level))?;

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if let Some(log_path) = &cli.log_file {
        let path = std::path::Path::new(log_path);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(std::path::Path::new("."));
        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("segfuzz.log");
        let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, filename);

        if cli.log_json {
            let file_layer = fmt::layer()
                .json()
                .with_writer(file_appender)
                .with_ansi(false);

            subscriber.with(file_layer).init();
        } else {
            let file_layer = fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false);

            subscriber.with(file_layer).init();
        }
    } else if cli.log_json {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

/// Load configuration with CLI overrides
fn load_config(cli: &Cli) -> Result<RunConfig, ConfigError> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(concurrency) = cli.concurrency {
        config.fuzzer.concurrency = concurrency;
    }
    if let Some(timeout) = cli.timeout {
        config.fuzzer.timeout_secs = timeout;
    }
    if let Some(max_time) = cli.max_time {
        config.fuzzer.max_time_secs = max_time;
    }
    if let Some(user_agent) = &cli.user_agent {
        config.fuzzer.user_agent = user_agent.clone();
    }
    if cli.no_redirects {
        config.fuzzer.follow_redirects = false;
    }
    if cli.insecure {
        config.fuzzer.insecure = true;
    }
    if cli.sort {
        config.output.sort = true;
    }

    let url = cli.url.as_deref().ok_or_else(|| ConfigError::ValidationError {
        field: "url".into(),
        reason: "a target URL is required".into(),
    })?;
    let wordlist = cli.wordlist.clone().ok_or_else(|| ConfigError::ValidationError {
        field: "wordlist".into(),
        reason: "a wordlist path is required".into(),
    })?;

    RunConfig::assemble(&config, url, wordlist, cli.output.clone(), &cli.status_codes)
}

/// Generate default configuration file
fn generate_default_config() -> Result<()> {
    let toml = Config::default()
        .to_toml()
        .context("Failed to serialize configuration")?;

    println!("{}", toml);
    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigint, mut sigterm) =
            match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
                (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::warn!(error = %e, "Failed to register signal handlers");
                    return std::future::pending().await;
                }
            };

        tokio::select! {
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT, stopping");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, stopping");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to register Ctrl+C handler");
            return std::future::pending().await;
        }
        tracing::info!("Received Ctrl+C, stopping");
    }
}

/// Exit status after a forced shutdown (128 + SIGINT)
const FORCED_EXIT_CODE: i32 = 130;

/// First signal stops the fuzzer gracefully; a second one returns the
/// exit code for an immediate exit
async fn handle_signals<F, Fut>(fuzzer: Arc<Fuzzer>, mut next_signal: F) -> i32
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    next_signal().await;
    fuzzer.stop();
    tracing::warn!("Stopping: waiting for in-flight requests, signal again to exit now");

    next_signal().await;
    tracing::warn!("Second signal received, exiting immediately");
    FORCED_EXIT_CODE
}

/// Run the fuzzer, stopping early on a shutdown signal
async fn run(cli: Cli) -> Result<(), FuzzError> {
    let run_config = load_config(&cli)?;
    let app = App::new(run_config)?;

    let fuzzer = app.fuzzer();
    let signals = tokio::spawn(async move {
        let code = handle_signals(fuzzer, wait_for_shutdown).await;
        std::process::exit(code);
    });

    let result = app.run().await;
    signals.abort();

    let report = result?;
    if report.is_empty() {
        tracing::info!("No results matched the accepted status codes");
    }
    tracing::info!(results = report.len(), "Done");

    Ok(())
}
