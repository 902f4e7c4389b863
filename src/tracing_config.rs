use std::{env, io};

use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ConfigPaths, LogLevel};

fn env_filter(default_level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.to_string()))
}

fn log_format() -> String {
    env::var("WAYSHELL_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string())
}

/// Initialize tracing for one-shot CLI commands
///
/// Logs go to stderr in compact form so that command output on stdout stays
/// machine readable. `RUST_LOG` overrides `default_level`.
///
/// # Errors
/// Returns error if tracing subscriber initialization fails
pub fn init_cli_mode(default_level: LogLevel) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .try_init()?;

    Ok(())
}

/// Initialize tracing with file output for the long-running shell
///
/// Writes to stdout and to a daily rotated file in the log directory.
/// Supports pretty or JSON console output based on `WAYSHELL_LOG_FORMAT`.
/// The returned guard must be kept alive to flush the file writer.
///
/// # Errors
/// Returns error if file creation or tracing subscriber initialization fails
pub fn init_with_file(default_level: LogLevel) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    const DAYS_TO_KEEP: usize = 7;

    let log_dir = ConfigPaths::log_dir()?;
    let file_appender = rolling::Builder::new()
        .rotation(rolling::Rotation::DAILY)
        .max_log_files(DAYS_TO_KEEP)
        .filename_prefix("wayshell")
        .filename_suffix("log")
        .build(&log_dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let registry = tracing_subscriber::registry().with(env_filter(default_level));

    match log_format().as_str() {
        "json" => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(io::stdout),
                )
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
                .try_init()?;
        }
        _ => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_level(true)
                        .with_thread_names(true)
                        .with_writer(io::stdout),
                )
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
                .try_init()?;
        }
    }

    Ok(guard)
}
