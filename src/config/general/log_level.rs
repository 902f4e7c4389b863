use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logging level for the application.
///
/// Used as the tracing filter when `RUST_LOG` is not set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only show errors, such as failed stylesheet compiles.
    Error,

    /// Show warnings and errors.
    Warn,

    /// Show compile and apply notices, warnings, and errors (default level).
    #[default]
    Info,

    /// Show watcher batches and skipped cycles.
    Debug,

    /// Show everything, including raw filesystem events.
    Trace,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}
