use std::{fs, io::ErrorKind, path::Path};

use tracing::{debug, instrument};

use super::Config;
use crate::{Result, ShellError};

impl Config {
    /// Loads the configuration from a TOML file.
    ///
    /// A missing file is not an error: the shell runs with the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or does not
    /// contain a valid configuration.
    #[instrument]
    pub fn load(path: &Path) -> Result<Config> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Ok(Config::default());
            }
            Err(e) => return Err(ShellError::io(e, path)),
        };

        Self::from_toml(&content, Some(path))
    }

    /// Parses a configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns `ShellError::TomlParseError` if the content is invalid.
    pub fn from_toml(content: &str, path: Option<&Path>) -> Result<Config> {
        toml::from_str(content).map_err(|e| ShellError::toml_parse(e, path))
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns `ShellError::TomlParseError` if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ShellError::toml_parse(e, None))
    }
}
