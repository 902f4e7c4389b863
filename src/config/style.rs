use std::{path::Path, time::Duration};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::style::StyleSource;

/// Stylesheet pipeline configuration.
///
/// Relative paths are resolved against the configuration directory, except
/// `entry` which is resolved against `source_dir`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct StyleConfig {
    /// Directory holding the SCSS source tree. Watched recursively.
    pub source_dir: String,

    /// Entry file handed to the compiler.
    pub entry: String,

    /// Compiled stylesheet installed into the shell.
    pub output: String,

    /// Stylesheet compiler executable.
    pub compiler: String,

    /// Extra arguments placed before the input and output paths.
    pub compiler_args: Vec<String>,

    /// Quiet period in milliseconds before a burst of changes triggers a recompile.
    pub debounce_ms: u64,

    /// Recompile whenever the source tree changes.
    pub watch: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            source_dir: "scss".to_string(),
            entry: "main.scss".to_string(),
            output: "style.css".to_string(),
            compiler: "sassc".to_string(),
            compiler_args: Vec::new(),
            debounce_ms: 150,
            watch: true,
        }
    }
}

impl StyleConfig {
    /// Resolves the configured paths into a [`StyleSource`] rooted at `config_dir`.
    pub fn style_source(&self, config_dir: &Path) -> StyleSource {
        let source_dir = config_dir.join(&self.source_dir);

        StyleSource {
            entry: source_dir.join(&self.entry),
            source_dir,
            output_path: config_dir.join(&self.output),
        }
    }

    /// Debounce window for the source tree watcher.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
