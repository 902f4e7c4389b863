use std::{
    fmt, io,
    path::{Path, PathBuf},
    result,
};

use thiserror::Error;

use crate::{style::StyleError, windows::WindowError};

/// Error types for the shell.
///
/// Covers configuration loading as well as the startup failures of the
/// style pipeline and the window registry.
#[derive(Error, Debug)]
pub enum ShellError {
    /// I/O operation error
    #[error("I/O error on '{path}': {details}")]
    IoError {
        /// Path where I/O error occurred
        path: PathBuf,
        /// I/O error details
        details: String,
    },

    /// Standard I/O operation error (for compatibility)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing error with location context
    #[error("failed to parse TOML at '{location}': {details}")]
    TomlParseError {
        /// Location of TOML being parsed (file path or "string")
        location: String,
        /// Parse error details
        details: String,
    },

    /// Watching, compiling or applying stylesheets failed
    #[error(transparent)]
    Style(#[from] StyleError),

    /// A window could not be constructed
    #[error(transparent)]
    Window(#[from] WindowError),
}

/// A specialized `Result` type for shell operations.
pub type Result<T> = result::Result<T, ShellError>;

impl ShellError {
    /// Creates a TOML parsing error with optional file path context.
    ///
    /// # Arguments
    ///
    /// * `error` - The underlying parsing error
    /// * `path` - Optional path to the file that failed to parse
    pub fn toml_parse(error: impl fmt::Display, path: Option<&Path>) -> Self {
        let location = match path {
            Some(p) => {
                let clean_path = p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
                clean_path.to_string_lossy().to_string()
            }
            None => "string".to_string(),
        };

        ShellError::TomlParseError {
            location,
            details: error.to_string(),
        }
    }

    /// Creates an I/O error with file path context.
    pub fn io(error: impl fmt::Display, path: &Path) -> Self {
        ShellError::IoError {
            path: path.to_path_buf(),
            details: error.to_string(),
        }
    }
}
