//! Reactive stylesheet pipeline.
//!
//! Watches the SCSS source tree, recompiles it with an external compiler and
//! swaps the shell's active stylesheet. The pieces are wired together by
//! [`crate::shell::Shell::initialize`]:
//!
//! ```text
//! DirectoryWatcher --changed--> StylePipeline --compile--> StyleCompiler
//!                                             --reset/apply--> StyleApplier
//! ```

mod applier;
mod compiler;
mod error;
mod pipeline;
mod watcher;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

pub use applier::{CssApplier, StyleApplier, Stylesheet};
pub use compiler::{SasscCompiler, StyleCompiler};
pub use error::StyleError;
pub use pipeline::{CycleOutcome, PipelineState, StylePipeline};
pub use watcher::{ChangeBatch, DirectoryWatcher, Subscription, WatchTarget, WatcherOptions};

/// Where a stylesheet is compiled from and to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSource {
    /// Root of the source tree.
    pub source_dir: PathBuf,
    /// Entry file passed to the compiler, normally inside `source_dir`.
    pub entry: PathBuf,
    /// Destination of the compiled stylesheet.
    pub output_path: PathBuf,
}

/// Outcome of a single compile: `Ok` once the output has been written.
pub type CompileResult = Result<(), StyleError>;
