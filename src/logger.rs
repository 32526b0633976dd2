//! Structured logging: a daily rolling file under `<data_dir>/logs` plus a
//! compact console copy on stderr. Stdout belongs to IPC events.

use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const FILE_PREFIX: &str = "optimus";
const KEEP_FILES: usize = 5;

/// Used when `RUST_LOG` is unset. HTTP internals are chatty at debug and
/// symphonia warns on every skipped mp3 frame.
const DEFAULT_DIRECTIVES: &str = "info,reqwest=warn,hyper=warn,mio=warn,symphonia=warn";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

fn rolling_file(log_dir: &Path) -> anyhow::Result<RollingFileAppender> {
    std::fs::create_dir_all(log_dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(KEEP_FILES)
        .build(log_dir)
        .map_err(|e| anyhow::anyhow!("Cannot open log file in {}: {}", log_dir.display(), e))
}

/// Install the global subscriber. Fails if the log directory is unusable or
/// a subscriber is already set.
pub fn init(log_dir: &Path) -> anyhow::Result<()> {
    let file = fmt::layer()
        .with_writer(rolling_file(log_dir)?)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true);
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(filter())
        .with(file)
        .with(console)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Logger already initialized: {}", e))?;

    tracing::info!(log_dir = %log_dir.display(), "Logger initialized");
    Ok(())
}
