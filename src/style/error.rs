use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the stylesheet pipeline.
#[derive(Error, Debug)]
pub enum StyleError {
    /// The source tree could not be watched
    #[error("cannot watch '{path}': {details}")]
    Watch {
        /// Directory that was to be watched
        path: PathBuf,
        /// Watcher error details
        details: String,
    },

    /// The external compiler failed or could not be started
    #[error("failed to compile '{entry}': {details}")]
    Compile {
        /// Entry file handed to the compiler
        entry: PathBuf,
        /// Compiler diagnostics or spawn error
        details: String,
    },

    /// The compiled stylesheet could not be installed
    #[error("failed to apply stylesheet '{path}': {details}")]
    Apply {
        /// Stylesheet that was to be applied
        path: PathBuf,
        /// Read error details
        details: String,
    },
}
