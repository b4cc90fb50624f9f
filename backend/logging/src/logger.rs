//! Structured Logger
//!
//! Wraps `tracing` with either human-readable or JSON console output, an
//! optional daily-rolling NDJSON file, and environment-based level control.
//! Console output goes to stderr so command output on stdout stays clean.

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "studybuddy.log";

#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Level or filter directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    /// JSON lines on the console instead of the human format.
    pub json: bool,
    /// Also write NDJSON to `dir/studybuddy.log.YYYY-MM-DD`.
    pub dir: Option<PathBuf>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            dir: None,
        }
    }
}

/// `RUST_LOG` if it parses, else `level`, else `info`.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global logger. Later calls are no-ops.
pub fn init_logger(options: &LogOptions) {
    let console_layer = if options.json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed()
    };

    let file_layer = options.dir.as_ref().map(|dir| {
        let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
        fmt::layer()
            .json()
            .with_writer(appender)
            .with_ansi(false)
    });

    let _ = tracing_subscriber::registry()
        .with(build_filter(&options.level))
        .with(console_layer)
        .with(file_layer)
        .try_init();
}
