//! Structured logging setup, adapted from the teacher's
//! `mapmap::logging_setup` - a console layer plus an optional non-blocking
//! file layer, both filtered by `RUST_LOG` (falling back to a default
//! directive), registered once via `tracing_subscriber::registry()`.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Keeps the background log-writer thread alive for the process lifetime.
/// Dropping this stops flushing buffered file log lines.
pub struct LogGuard {
    _guard: Option<WorkerGuard>,
}

/// Where, if anywhere, file logs are written.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Log to stderr.
    pub console: bool,
    /// Log to this file path, if set.
    pub file: Option<PathBuf>,
}

impl LogConfig {
    /// Console-only logging, the engine's default.
    pub fn console_only() -> Self {
        Self { console: true, file: None }
    }
}

/// Installs the global `tracing` subscriber. Safe to call once per process;
/// a second call is a no-op (the underlying `set_global_default` failure is
/// swallowed, matching every other non-fatal failure path in this crate).
pub fn init(config: &LogConfig) -> LogGuard {
    let filter = EnvFilter::builder().with_default_directive(tracing::Level::INFO.into()).from_env_lossy();

    let console_layer = config.console.then(|| fmt::layer().with_writer(std::io::stderr).with_ansi(true).with_target(false));

    let (file_layer, guard) = match &config.file {
        Some(path) => match std::fs::File::create(path) {
            Ok(file) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                (Some(fmt::layer().with_writer(non_blocking).with_ansi(false)), Some(guard))
            }
            Err(err) => {
                eprintln!("failed to open log file {}: {err}", path.display());
                (None, None)
            }
        },
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(console_layer.map(|l| l.with_filter(filter.clone())))
        .with(file_layer.map(|l| l.with_filter(filter)))
        .try_init();

    LogGuard { _guard: guard }
}
