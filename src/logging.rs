//! Tracing setup: optional stderr layer and optional daily-rotated file layer.
//!
//! `RUST_LOG` takes precedence over the configured level when set.

use crate::config::{LogLevel, LoggingConfig};
use std::fs;
use std::io;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "navigator";
const LOG_FILE_SUFFIX: &str = "log";

/// Filter directives for `level`, keeping dependency chatter down
pub fn filter_directives(level: LogLevel) -> String {
    let mut directives = vec![format!("navigator={}", level), "warn".to_string()];
    for (target, lvl) in [("sqlx", "warn"), ("hyper", "warn"), ("reqwest", "warn")] {
        directives.push(format!("{}={}", target, lvl));
    }
    directives.join(",")
}

fn build_env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directives(level)))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the program. `None` means no file layer was installed.
pub fn init(config: &LoggingConfig) -> io::Result<Option<WorkerGuard>> {
    let console_layer = if config.console_output {
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .compact()
                .with_filter(build_env_filter(config.level)),
        )
    } else {
        None
    };

    let (file_layer, guard) = if config.file_output {
        fs::create_dir_all(&config.log_dir)?;
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .filename_suffix(LOG_FILE_SUFFIX)
            .max_log_files(config.max_files.max(1))
            .build(&config.log_dir)
            .map_err(io::Error::other)?;
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer)
            .with_target(true)
            .with_filter(build_env_filter(config.level));
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    // A second init (e.g. from tests) keeps the first subscriber.
    if let Err(e) = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("Logging already initialized: {e}");
    }

    Ok(guard)
}
