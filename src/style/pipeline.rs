use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, instrument};

use super::{StyleApplier, StyleCompiler, StyleSource};

/// Whether a compile cycle is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    /// Ready to start a cycle.
    #[default]
    Idle,
    /// A compile+apply cycle is in flight.
    Compiling,
}

/// What a call to [`StylePipeline::run_once`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The stylesheet was compiled and installed.
    Applied,
    /// The compiler failed; the active stylesheet was left untouched.
    CompileFailed,
    /// Compiled, but the output could not be installed after the reset.
    ApplyFailed,
    /// Another cycle was already running, nothing was done.
    Skipped,
}

/// Compiles the source tree and installs the result, one cycle at a time.
///
/// Overlapping calls to [`run_once`](Self::run_once) are dropped rather than
/// queued. There is no retry: a failed cycle is only repeated on the next
/// change or restart.
pub struct StylePipeline {
    source: StyleSource,
    compiler: Arc<dyn StyleCompiler>,
    applier: Arc<dyn StyleApplier>,
    state: Mutex<PipelineState>,
}

impl StylePipeline {
    /// Creates an idle pipeline.
    pub fn new(
        source: StyleSource,
        compiler: Arc<dyn StyleCompiler>,
        applier: Arc<dyn StyleApplier>,
    ) -> Self {
        Self {
            source,
            compiler,
            applier,
            state: Mutex::new(PipelineState::Idle),
        }
    }

    /// The source tree and output this pipeline compiles.
    pub fn source(&self) -> &StyleSource {
        &self.source
    }

    /// The current pipeline state.
    pub fn state(&self) -> PipelineState {
        *self.lock_state()
    }

    /// Runs one compile+apply cycle unless one is already in flight.
    ///
    /// Failures are logged and reported through the outcome; they never
    /// propagate, so a bad edit cannot take the shell down.
    #[instrument(skip(self), fields(entry = %self.source.entry.display()))]
    pub fn run_once(&self) -> CycleOutcome {
        let Some(_cycle) = self.begin_cycle() else {
            debug!("Compile already in flight, dropping trigger");
            return CycleOutcome::Skipped;
        };

        if let Err(e) = self.compiler.compile(&self.source) {
            error!("Scss compile failed, keeping previous stylesheet: {e}");
            return CycleOutcome::CompileFailed;
        }
        info!("Scss compiled");

        self.applier.reset();
        if let Err(e) = self.applier.apply(&self.source.output_path) {
            error!("Failed to apply compiled css: {e}");
            return CycleOutcome::ApplyFailed;
        }
        info!("Compiled css applied");

        CycleOutcome::Applied
    }

    fn begin_cycle(&self) -> Option<CycleGuard<'_>> {
        let mut state = self.lock_state();
        if *state == PipelineState::Compiling {
            return None;
        }
        *state = PipelineState::Compiling;

        Some(CycleGuard { pipeline: self })
    }

    fn lock_state(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the pipeline to `Idle` when a cycle ends, including on unwind.
struct CycleGuard<'a> {
    pipeline: &'a StylePipeline,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        *self.pipeline.lock_state() = PipelineState::Idle;
    }
}
