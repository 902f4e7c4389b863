//! Configuration schema definitions and loading.
//!
//! Defines the complete configuration structure for the shell: general
//! settings, the stylesheet pipeline and the window set. All configurations
//! are serializable to/from TOML format.

mod general;
mod loading;
mod paths;
mod style;
mod windows;


pub use general::{GeneralConfig, LogLevel};
pub use paths::ConfigPaths;
pub use style::StyleConfig;
pub use windows::{WindowKind, WindowsConfig};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Main configuration structure for the shell.
///
/// Represents the complete configuration schema that can be loaded
/// from TOML files. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct Config {
    /// General application settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Stylesheet compilation and hot-reload settings.
    #[serde(default)]
    pub style: StyleConfig,

    /// Windows to construct and their close delays.
    #[serde(default)]
    pub windows: WindowsConfig,
}
