use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::sync::watch;
use tracing::instrument;

use super::StyleError;

/// Installs compiled stylesheets into the shell runtime.
///
/// Callers must `reset` before every `apply`, otherwise the runtime may
/// briefly cascade the old and new rules together.
pub trait StyleApplier: Send + Sync {
    /// Removes the active stylesheet.
    fn reset(&self);

    /// Installs the stylesheet at `path` as the active one.
    ///
    /// # Errors
    /// Returns `StyleError::Apply` if `path` cannot be read. The runtime is
    /// then left without an active stylesheet.
    fn apply(&self, path: &Path) -> Result<(), StyleError>;
}

/// A stylesheet installed in the shell runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet {
    /// File the stylesheet was loaded from.
    pub path: PathBuf,
    /// The CSS text.
    pub css: String,
}

/// Publishes the active stylesheet to the renderer over a watch channel.
///
/// The renderer subscribes once and swaps its CSS provider whenever the
/// value changes. `None` means no stylesheet is active.
#[derive(Clone)]
pub struct CssApplier {
    active: Arc<watch::Sender<Option<Arc<Stylesheet>>>>,
}

impl CssApplier {
    /// Creates an applier with no active stylesheet.
    pub fn new() -> Self {
        let (active, _) = watch::channel(None);
        Self {
            active: Arc::new(active),
        }
    }

    /// Subscribes to stylesheet swaps.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Stylesheet>>> {
        self.active.subscribe()
    }

    /// The currently active stylesheet, if any.
    pub fn current(&self) -> Option<Arc<Stylesheet>> {
        self.active.borrow().clone()
    }
}

impl Default for CssApplier {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleApplier for CssApplier {
    fn reset(&self) {
        self.active.send_replace(None);
    }

    #[instrument(skip(self))]
    fn apply(&self, path: &Path) -> Result<(), StyleError> {
        let css = fs::read_to_string(path).map_err(|e| StyleError::Apply {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;

        self.active.send_replace(Some(Arc::new(Stylesheet {
            path: path.to_path_buf(),
            css,
        })));

        Ok(())
    }
}
