//! Shell bootstrap.
//!
//! [`Shell::initialize`] is the single startup entry point: it runs the
//! style pipeline once, arms the source tree watcher and builds the window
//! descriptor. Nothing happens at load time.

use std::{path::Path, sync::Arc};

use tracing::{info, instrument, warn};

use crate::{
    Result,
    config::Config,
    style::{
        CycleOutcome, DirectoryWatcher, StyleApplier, StyleCompiler, StylePipeline, Subscription,
        WatcherOptions,
    },
    windows::{WindowConfig, WindowRegistry},
};

/// A running shell: the live style pipeline and the window descriptor.
///
/// Dropping it stops watching the source tree.
pub struct Shell<H> {
    pipeline: Arc<StylePipeline>,
    watch: Option<(DirectoryWatcher, Subscription)>,
    window_config: WindowConfig<H>,
}

impl<H> Shell<H> {
    /// Starts the shell.
    ///
    /// Compiles and applies the stylesheet once, then (when `style.watch` is
    /// set) recompiles on every change below the source directory. A failed
    /// startup compile is logged and the previous stylesheet on disk stays in
    /// use. Must be called inside a Tokio runtime.
    ///
    /// The startup compile runs on the calling thread and blocks it until
    /// the compiler exits. Async callers should wrap this call in
    /// `tokio::task::block_in_place` or `spawn_blocking`.
    ///
    /// # Errors
    /// Fails if the source directory cannot be watched or a window factory
    /// fails. Both abort startup.
    #[instrument(skip_all, fields(config_dir = %config_dir.display()))]
    pub fn initialize(
        config: &Config,
        config_dir: &Path,
        compiler: Arc<dyn StyleCompiler>,
        applier: Arc<dyn StyleApplier>,
        windows: WindowRegistry<H>,
    ) -> Result<Self> {
        let source = config.style.style_source(config_dir);
        let pipeline = Arc::new(StylePipeline::new(source, compiler, applier));

        if pipeline.run_once() != CycleOutcome::Applied {
            warn!("Initial stylesheet cycle did not complete, continuing startup");
        }

        let watch = if config.style.watch {
            let options = WatcherOptions {
                debounce: config.style.debounce(),
            };
            let watcher = DirectoryWatcher::watch(&pipeline.source().source_dir, options)?;

            let handler_pipeline = pipeline.clone();
            let subscription = watcher.on_changed(move |_batch| {
                handler_pipeline.run_once();
            });

            info!(
                "Watching {} for stylesheet changes",
                watcher.target().path().display()
            );
            Some((watcher, subscription))
        } else {
            None
        };

        let window_config = windows.build(pipeline.source().output_path.clone())?;
        info!(windows = window_config.windows.len(), "Shell initialized");

        Ok(Self {
            pipeline,
            watch,
            window_config,
        })
    }

    /// Runs a compile cycle now, outside of the watcher.
    pub fn reload(&self) -> CycleOutcome {
        self.pipeline.run_once()
    }

    /// The style pipeline.
    pub fn pipeline(&self) -> &StylePipeline {
        &self.pipeline
    }

    /// Whether the source tree is being watched.
    pub fn is_watching(&self) -> bool {
        self.watch.is_some()
    }

    /// The descriptor handed to the shell runtime.
    pub fn window_config(&self) -> &WindowConfig<H> {
        &self.window_config
    }
}
