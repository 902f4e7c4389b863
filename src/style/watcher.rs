use std::{
    collections::BTreeSet,
    mem,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError, Weak,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher, recommended_watcher};
use tokio::{
    sync::mpsc::{self, UnboundedReceiver},
    task::{self, JoinHandle},
    time::{self, Instant},
};
use tracing::{debug, error, trace, warn};

use super::StyleError;

/// A directory being watched recursively.
///
/// The path is canonicalized when the target is created, so symlinked
/// config directories report events under their real location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    path: PathBuf,
}

impl WatchTarget {
    /// Validates that `path` is an existing directory.
    ///
    /// # Errors
    /// Returns `StyleError::Watch` if the path is missing, inaccessible or
    /// not a directory.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StyleError> {
        let path = path.as_ref();
        let watch_error = |details: String| StyleError::Watch {
            path: path.to_path_buf(),
            details,
        };

        let canonical = path.canonicalize().map_err(|e| watch_error(e.to_string()))?;
        if !canonical.is_dir() {
            return Err(watch_error("not a directory".to_string()));
        }

        Ok(Self { path: canonical })
    }

    /// The canonical directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Tuning for [`DirectoryWatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherOptions {
    /// Quiet period that must pass after the last event before handlers run.
    /// Every new event restarts the timer. Zero dispatches immediately.
    pub debounce: Duration,
}

impl Default for WatcherOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(150),
        }
    }
}

/// One coalesced "changed" notification.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeBatch {
    /// Distinct paths touched during the batch, sorted.
    pub paths: Vec<PathBuf>,
    /// Number of raw filesystem events merged into the batch.
    pub event_count: usize,
}

type Handler = Arc<dyn Fn(&ChangeBatch) + Send + Sync>;

#[derive(Default)]
struct HandlerList {
    next_id: AtomicUsize,
    entries: Mutex<Vec<(usize, Handler)>>,
}

impl HandlerList {
    fn insert(&self, handler: Handler) -> usize {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push((id, handler));
        id
    }

    fn remove(&self, id: usize) {
        self.lock().retain(|(entry_id, _)| *entry_id != id);
    }

    fn snapshot(&self) -> Vec<Handler> {
        self.lock().iter().map(|(_, handler)| handler.clone()).collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(usize, Handler)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle for a change handler registered with [`DirectoryWatcher::on_changed`].
///
/// The handler is removed when this handle is dropped.
#[must_use = "dropping the subscription unregisters the handler"]
pub struct Subscription {
    id: usize,
    handlers: Weak<HandlerList>,
}

impl Subscription {
    /// Unregisters the handler now.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(handlers) = self.handlers.upgrade() {
            handlers.remove(self.id);
        }
    }
}

/// Recursive directory watcher with debounced change notifications.
///
/// Wraps the platform watcher from the notify crate. Raw create, modify and
/// remove events are coalesced according to [`WatcherOptions::debounce`] and
/// every registered handler runs once per batch on the blocking thread pool.
/// Events that arrive while handlers are running are dropped: the handlers
/// already observe the tree as it is when they finish.
///
/// The OS watch lives as long as this value. Must be created inside a Tokio
/// runtime.
pub struct DirectoryWatcher {
    target: WatchTarget,
    handlers: Arc<HandlerList>,
    _watcher: RecommendedWatcher,
    dispatcher: JoinHandle<()>,
}

impl DirectoryWatcher {
    /// Arms recursive monitoring of `path`.
    ///
    /// # Errors
    /// Returns `StyleError::Watch` if the path is not an accessible directory
    /// or the OS watcher cannot be set up.
    pub fn watch(path: impl AsRef<Path>, options: WatcherOptions) -> Result<Self, StyleError> {
        let target = WatchTarget::new(path)?;
        let watch_error = |e: notify::Error| StyleError::Watch {
            path: target.path().to_path_buf(),
            details: e.to_string(),
        };

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let mut watcher = recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    warn!("Filesystem watcher error: {e}");
                    return;
                }
            };

            if !matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                return;
            }

            trace!(kind = ?event.kind, paths = ?event.paths, "Filesystem event");
            for path in event.paths {
                let _ = event_tx.send(path);
            }
        })
        .map_err(watch_error)?;

        watcher
            .watch(target.path(), RecursiveMode::Recursive)
            .map_err(watch_error)?;

        let handlers = Arc::new(HandlerList::default());
        let dispatcher = tokio::spawn(dispatch_loop(event_rx, handlers.clone(), options.debounce));

        debug!("Watching {}", target.path().display());

        Ok(Self {
            target,
            handlers,
            _watcher: watcher,
            dispatcher,
        })
    }

    /// The watched directory.
    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    /// Registers `handler` to run once per coalesced change batch.
    pub fn on_changed<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ChangeBatch) + Send + Sync + 'static,
    {
        let id = self.handlers.insert(Arc::new(handler));

        Subscription {
            id,
            handlers: Arc::downgrade(&self.handlers),
        }
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}

async fn dispatch_loop(
    mut event_rx: UnboundedReceiver<PathBuf>,
    handlers: Arc<HandlerList>,
    debounce: Duration,
) {
    let mut pending = BTreeSet::new();
    let mut event_count = 0;

    let debounce_sleep = time::sleep(debounce);
    tokio::pin!(debounce_sleep);

    loop {
        tokio::select! {
            event = event_rx.recv() => {
                let Some(path) = event else {
                    break;
                };

                pending.insert(path);
                event_count += 1;
                debounce_sleep.as_mut().reset(Instant::now() + debounce);
            }

            _ = &mut debounce_sleep, if !pending.is_empty() => {
                let batch = ChangeBatch {
                    paths: mem::take(&mut pending).into_iter().collect(),
                    event_count: mem::take(&mut event_count),
                };

                dispatch(&handlers, batch).await;

                let mut dropped = 0;
                while event_rx.try_recv().is_ok() {
                    dropped += 1;
                }
                if dropped > 0 {
                    debug!(dropped, "Dropped changes that arrived while handlers ran");
                }
            }
        }
    }
}

async fn dispatch(handlers: &HandlerList, batch: ChangeBatch) {
    let handlers = handlers.snapshot();
    if handlers.is_empty() {
        return;
    }

    debug!(
        paths = batch.paths.len(),
        events = batch.event_count,
        "Source tree changed"
    );

    let result = task::spawn_blocking(move || {
        for handler in handlers {
            handler(&batch);
        }
    })
    .await;

    if let Err(e) = result {
        error!("Change handler panicked: {e}");
    }
}
