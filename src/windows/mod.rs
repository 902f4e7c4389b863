//! Window registry.
//!
//! Collects the shell's windows from their factories and assembles the
//! descriptor handed to the shell runtime: the stylesheet path, the ordered
//! window list and the per-window close delays.

use std::{
    collections::{BTreeMap, HashSet},
    path::PathBuf,
};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{Result, config::WindowKind};


/// Errors raised while constructing windows.
#[derive(Error, Debug)]
pub enum WindowError {
    /// A window factory failed
    #[error("failed to create window '{name}': {details}")]
    Factory {
        /// Name of the window
        name: String,
        /// Failure details
        details: String,
    },

    /// The same window name was registered twice
    #[error("window '{0}' is registered more than once")]
    Duplicate(String),
}

type Factory<H> = Box<dyn FnOnce() -> std::result::Result<H, WindowError>>;

/// One constructed window together with its resolved close delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowEntry<H> {
    /// Window name as known to the runtime.
    pub name: String,
    /// The constructed window.
    pub handle: H,
    /// Close delay override in milliseconds, `None` for the runtime default.
    pub close_delay_ms: Option<u32>,
}

/// The configuration descriptor consumed by the shell runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowConfig<H> {
    /// Stylesheet the runtime loads at startup.
    pub style: PathBuf,
    /// Windows in declaration order. The runtime stacks them in this order.
    pub windows: Vec<H>,
    /// Close delays in milliseconds for windows that override the default.
    pub close_window_delay: BTreeMap<String, u32>,
}

/// Builds the shell's window list from factories.
///
/// Factories run in the order they were registered, exactly once, when
/// [`build`](Self::build) is called.
pub struct WindowRegistry<H> {
    factories: Vec<(String, Factory<H>)>,
    close_delays: BTreeMap<String, u32>,
}

impl<H> WindowRegistry<H> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
            close_delays: BTreeMap::new(),
        }
    }

    /// Declares a window. Declaration order is the final window order.
    pub fn register<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: FnOnce() -> std::result::Result<H, WindowError> + 'static,
    {
        self.factories.push((name.into(), Box::new(factory)));
        self
    }

    /// Overrides the close delay of `name`.
    pub fn close_delay(mut self, name: impl Into<String>, millis: u32) -> Self {
        self.close_delays.insert(name.into(), millis);
        self
    }

    /// Adds every close delay from `delays`, replacing existing overrides.
    pub fn with_close_delays(mut self, delays: BTreeMap<String, u32>) -> Self {
        self.close_delays.extend(delays);
        self
    }

    /// Names of the declared windows, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.iter().map(|(name, _)| name.as_str())
    }

    /// Runs every factory and returns the constructed windows with their
    /// resolved close delays.
    ///
    /// # Errors
    /// Returns the first factory error, or `WindowError::Duplicate` if a
    /// name was declared twice. No factory runs when names collide.
    pub fn entries(self) -> Result<(Vec<WindowEntry<H>>, BTreeMap<String, u32>)> {
        let mut seen = HashSet::new();
        if let Some(name) = self.names().find(|name| !seen.insert(*name)) {
            return Err(WindowError::Duplicate(name.to_string()).into());
        }

        let mut entries = Vec::with_capacity(self.factories.len());
        for (name, factory) in self.factories {
            let handle = factory()?;
            let close_delay_ms = self.close_delays.get(&name).copied();
            debug!(window = %name, ?close_delay_ms, "Window created");

            entries.push(WindowEntry {
                name,
                handle,
                close_delay_ms,
            });
        }

        Ok((entries, self.close_delays))
    }

    /// Runs every factory and assembles the runtime descriptor.
    ///
    /// # Errors
    /// Propagates factory failures; startup is expected to abort on them.
    #[instrument(skip(self), fields(windows = self.factories.len()))]
    pub fn build(self, style: PathBuf) -> Result<WindowConfig<H>> {
        let (entries, close_window_delay) = self.entries()?;

        Ok(WindowConfig {
            style,
            windows: entries.into_iter().map(|entry| entry.handle).collect(),
            close_window_delay,
        })
    }
}

impl<H> Default for WindowRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Window handle produced by the built-in factories.
///
/// The runtime maps each descriptor to its widget tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowDescriptor {
    /// Window name.
    pub name: String,
    /// Which built-in window this is.
    pub kind: WindowKind,
}

impl WindowDescriptor {
    /// Factory for a built-in window.
    pub fn factory(kind: WindowKind) -> impl FnOnce() -> std::result::Result<Self, WindowError> {
        move || {
            Ok(Self {
                name: kind.name().to_string(),
                kind,
            })
        }
    }
}

/// Registry for the given built-in windows, in order, with `close_delays`.
pub fn builtin_registry(
    kinds: &[WindowKind],
    close_delays: &BTreeMap<String, u32>,
) -> WindowRegistry<WindowDescriptor> {
    kinds
        .iter()
        .fold(WindowRegistry::new(), |registry, &kind| {
            registry.register(kind.name(), WindowDescriptor::factory(kind))
        })
        .with_close_delays(close_delays.clone())
}
