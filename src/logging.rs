//! Tracing subscriber setup
//!
//! CLI commands log to stderr so stdout stays clean for JSON output.
//! The TUI owns the terminal, so it logs to a daily-rotated file instead.

use anyhow::Result;
use std::io;
use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, time::ChronoUtc, MakeWriter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Default TUI log file (~/.local/share/moviestream/moviestream.log)
pub fn default_log_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("moviestream").join("moviestream.log"))
}

/// Filter directive for the verbosity flags.
/// 0 = `base`, 1 = debug (quiet HTTP internals), 2+ = trace, quiet = errors only.
pub fn filter_directive(verbose: u8, quiet: bool, base: &'static str) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => base,
        1 => "debug,hyper=warn,hyper_util=warn,reqwest=info",
        _ => "trace",
    }
}

fn build_filter(verbose: u8, quiet: bool, base: &'static str) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbose, quiet, base)))
}

fn json_requested() -> bool {
    std::env::var("RUST_LOG_JSON")
        .map(|v| v == "true")
        .unwrap_or(false)
}

/// Subscriber writing formatted events to `writer`
pub fn subscriber<W>(
    verbose: u8,
    quiet: bool,
    base: &'static str,
    writer: W,
    ansi: bool,
) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let registry = Registry::default().with(build_filter(verbose, quiet, base));

    if json_requested() {
        let layer = fmt::layer()
            .json()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(writer);
        Box::new(registry.with(layer))
    } else {
        let layer = fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(ansi)
            .with_writer(writer);
        Box::new(registry.with(layer))
    }
}

/// Log to stderr (CLI mode)
pub fn init_stderr(verbose: u8, quiet: bool) -> Result<()> {
    subscriber(verbose, quiet, "warn", io::stderr, true).try_init()?;
    Ok(())
}

/// Log to a daily-rotated file (TUI mode)
pub fn init_file(verbose: u8, quiet: bool, log_path: &Path) -> Result<()> {
    let log_dir = log_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Log file path has no parent directory"))?;
    std::fs::create_dir_all(log_dir)?;

    let log_filename = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid log filename"))?;
    // "moviestream.log" rotates as "moviestream.<date>"
    let log_prefix = log_filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(log_filename);

    let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, log_prefix);
    subscriber(verbose, quiet, "info", appender, false).try_init()?;
    Ok(())
}
