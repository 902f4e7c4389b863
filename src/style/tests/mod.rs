//! Unit tests for the style pipeline.
//!
//! Pipeline tests use recording fakes for the compiler and applier; watcher
//! tests run against a temporary directory.

#![allow(clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]


use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, mpsc as std_mpsc},
    thread,
    time::Duration,
};

use tempfile::TempDir;
use tokio::{sync::mpsc, time::timeout};

use super::{
    ChangeBatch, CompileResult, CycleOutcome, DirectoryWatcher, PipelineState, StyleApplier,
    StyleCompiler, StyleError, StylePipeline, StyleSource, WatchTarget, WatcherOptions,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Compile(PathBuf, PathBuf),
    Reset,
    Apply(PathBuf),
}

type CallLog = Arc<Mutex<Vec<Call>>>;

struct FakeCompiler {
    calls: CallLog,
    fail: bool,
}

impl StyleCompiler for FakeCompiler {
    fn compile(&self, source: &StyleSource) -> CompileResult {
        self.calls.lock().unwrap().push(Call::Compile(
            source.entry.clone(),
            source.output_path.clone(),
        ));

        if self.fail {
            return Err(StyleError::Compile {
                entry: source.entry.clone(),
                details: "Error: Invalid CSS after \"a {\"".to_string(),
            });
        }
        Ok(())
    }
}

/// Blocks inside `compile` until released, to hold the pipeline in `Compiling`.
struct GatedCompiler {
    entered: Mutex<std_mpsc::Sender<()>>,
    release: Mutex<std_mpsc::Receiver<()>>,
    compiles: Mutex<usize>,
}

impl StyleCompiler for GatedCompiler {
    fn compile(&self, _source: &StyleSource) -> CompileResult {
        *self.compiles.lock().unwrap() += 1;
        self.entered.lock().unwrap().send(()).unwrap();
        self.release.lock().unwrap().recv().unwrap();
        Ok(())
    }
}

struct FakeApplier {
    calls: CallLog,
    fail: bool,
}

impl StyleApplier for FakeApplier {
    fn reset(&self) {
        self.calls.lock().unwrap().push(Call::Reset);
    }

    fn apply(&self, path: &Path) -> Result<(), StyleError> {
        self.calls.lock().unwrap().push(Call::Apply(path.to_path_buf()));

        if self.fail {
            return Err(StyleError::Apply {
                path: path.to_path_buf(),
                details: "No such file or directory".to_string(),
            });
        }
        Ok(())
    }
}

fn source() -> StyleSource {
    StyleSource {
        source_dir: PathBuf::from("./scss"),
        entry: PathBuf::from("./scss/main.scss"),
        output_path: PathBuf::from("./style.css"),
    }
}

fn pipeline(compile_fails: bool, apply_fails: bool) -> (StylePipeline, CallLog) {
    let calls = CallLog::default();
    let compiler = FakeCompiler {
        calls: calls.clone(),
        fail: compile_fails,
    };
    let applier = FakeApplier {
        calls: calls.clone(),
        fail: apply_fails,
    };

    (
        StylePipeline::new(source(), Arc::new(compiler), Arc::new(applier)),
        calls,
    )
}

fn successful_cycle() -> Vec<Call> {
    vec![
        Call::Compile(
            PathBuf::from("./scss/main.scss"),
            PathBuf::from("./style.css"),
        ),
        Call::Reset,
        Call::Apply(PathBuf::from("./style.css")),
    ]
}

#[test]
fn cycle_compiles_then_resets_then_applies() {
    let (pipeline, calls) = pipeline(false, false);

    let outcome = pipeline.run_once();

    assert_eq!(outcome, CycleOutcome::Applied);
    assert_eq!(*calls.lock().unwrap(), successful_cycle());
    assert_eq!(pipeline.state(), PipelineState::Idle);
}

#[test]
fn sequential_triggers_each_run_a_full_cycle() {
    let (pipeline, calls) = pipeline(false, false);

    for _ in 0..3 {
        assert_eq!(pipeline.run_once(), CycleOutcome::Applied);
    }

    let expected: Vec<Call> = (0..3).flat_map(|_| successful_cycle()).collect();
    assert_eq!(*calls.lock().unwrap(), expected);
}

#[test]
fn compile_failure_skips_reset_and_apply() {
    let (pipeline, calls) = pipeline(true, false);

    let outcome = pipeline.run_once();

    assert_eq!(outcome, CycleOutcome::CompileFailed);
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(matches!(calls[0], Call::Compile(..)));
    assert_eq!(pipeline.state(), PipelineState::Idle);
}

#[test]
fn apply_failure_is_reported_after_reset() {
    let (pipeline, calls) = pipeline(false, true);

    let outcome = pipeline.run_once();

    assert_eq!(outcome, CycleOutcome::ApplyFailed);
    assert_eq!(*calls.lock().unwrap(), successful_cycle());
    assert_eq!(pipeline.state(), PipelineState::Idle);
}

#[test]
fn failed_cycle_is_not_retried() {
    let (pipeline, calls) = pipeline(true, false);

    pipeline.run_once();
    pipeline.run_once();

    assert_eq!(calls.lock().unwrap().len(), 2);
}

#[test]
fn trigger_during_compile_is_dropped() {
    let (entered_tx, entered_rx) = std_mpsc::channel();
    let (release_tx, release_rx) = std_mpsc::channel();
    let compiler = Arc::new(GatedCompiler {
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
        compiles: Mutex::new(0),
    });
    let applier = FakeApplier {
        calls: CallLog::default(),
        fail: false,
    };
    let pipeline = Arc::new(StylePipeline::new(
        source(),
        compiler.clone(),
        Arc::new(applier),
    ));

    let running = {
        let pipeline = pipeline.clone();
        thread::spawn(move || pipeline.run_once())
    };
    entered_rx.recv().unwrap();

    assert_eq!(pipeline.state(), PipelineState::Compiling);
    assert_eq!(pipeline.run_once(), CycleOutcome::Skipped);
    assert_eq!(pipeline.run_once(), CycleOutcome::Skipped);

    release_tx.send(()).unwrap();
    assert_eq!(running.join().unwrap(), CycleOutcome::Applied);
    assert_eq!(*compiler.compiles.lock().unwrap(), 1);
    assert_eq!(pipeline.state(), PipelineState::Idle);
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn logs_compiled_before_applied() {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let (pipeline, _calls) = pipeline(false, false);

    tracing::subscriber::with_default(subscriber, || pipeline.run_once());

    let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    let compiled = output.find("Scss compiled").unwrap();
    let applied = output.find("Compiled css applied").unwrap();
    assert!(compiled < applied);
}

#[test]
fn compile_failure_is_logged() {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let (pipeline, _calls) = pipeline(true, false);

    tracing::subscriber::with_default(subscriber, || pipeline.run_once());

    let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("Scss compile failed"));
    assert!(!output.contains("Compiled css applied"));
}

#[test]
fn watch_target_rejects_missing_directory() {
    let temp = TempDir::new().unwrap();

    let result = WatchTarget::new(temp.path().join("scss"));

    assert!(matches!(result, Err(StyleError::Watch { .. })));
}

#[test]
fn watch_target_rejects_plain_file() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("main.scss");
    fs::write(&file, "").unwrap();

    let result = WatchTarget::new(&file);

    assert!(matches!(result, Err(StyleError::Watch { .. })));
}

#[tokio::test]
async fn watcher_fails_on_missing_directory() {
    let temp = TempDir::new().unwrap();

    let result = DirectoryWatcher::watch(temp.path().join("scss"), WatcherOptions::default());

    assert!(matches!(result, Err(StyleError::Watch { .. })));
}

fn options(millis: u64) -> WatcherOptions {
    WatcherOptions {
        debounce: Duration::from_millis(millis),
    }
}

#[tokio::test]
async fn watcher_coalesces_burst_into_one_batch() {
    let temp = TempDir::new().unwrap();
    let watcher = DirectoryWatcher::watch(temp.path(), options(200)).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel::<ChangeBatch>();
    let _subscription = watcher.on_changed(move |batch| {
        let _ = tx.send(batch.clone());
    });

    fs::write(temp.path().join("a.scss"), "a {}").unwrap();
    fs::write(temp.path().join("b.scss"), "b {}").unwrap();
    fs::write(temp.path().join("c.scss"), "c {}").unwrap();

    let batch = timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(batch.event_count >= 3);
    assert!(batch.paths.iter().any(|p| p.ends_with("a.scss")));
    assert!(batch.paths.iter().any(|p| p.ends_with("c.scss")));

    let second = timeout(Duration::from_millis(500), rx.recv()).await;
    assert!(second.is_err());
}

#[tokio::test]
async fn watcher_sees_nested_changes() {
    let temp = TempDir::new().unwrap();
    let nested = temp.path().join("widgets/bar");
    fs::create_dir_all(&nested).unwrap();
    let watcher = DirectoryWatcher::watch(temp.path(), options(50)).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel::<ChangeBatch>();
    let _subscription = watcher.on_changed(move |batch| {
        let _ = tx.send(batch.clone());
    });

    fs::write(nested.join("_clock.scss"), ".clock {}").unwrap();

    let batch = timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(batch.paths.iter().any(|p| p.ends_with("_clock.scss")));
}

#[tokio::test]
async fn every_handler_runs_once_per_batch() {
    let temp = TempDir::new().unwrap();
    let watcher = DirectoryWatcher::watch(temp.path(), options(50)).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel::<&'static str>();
    let first_tx = tx.clone();
    let _first = watcher.on_changed(move |_| {
        let _ = first_tx.send("first");
    });
    let _second = watcher.on_changed(move |_| {
        let _ = tx.send("second");
    });

    fs::write(temp.path().join("main.scss"), "").unwrap();

    let first = timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
    let second = timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
    assert_eq!(first, Some("first"));
    assert_eq!(second, Some("second"));
}

#[tokio::test]
async fn unsubscribed_handler_is_not_called() {
    let temp = TempDir::new().unwrap();
    let watcher = DirectoryWatcher::watch(temp.path(), options(50)).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel::<()>();
    let subscription = watcher.on_changed(move |_| {
        let _ = tx.send(());
    });

    subscription.unsubscribe();
    fs::write(temp.path().join("main.scss"), "").unwrap();

    let received = timeout(Duration::from_millis(500), rx.recv()).await;
    assert!(!matches!(received, Ok(Some(()))));
}

#[tokio::test]
async fn changes_during_dispatch_are_dropped() {
    let temp = TempDir::new().unwrap();
    let watcher = DirectoryWatcher::watch(temp.path(), options(50)).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel::<ChangeBatch>();
    let (release_tx, release_rx) = std_mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);
    let _subscription = watcher.on_changed(move |batch| {
        let _ = tx.send(batch.clone());
        let _ = release_rx.lock().unwrap().recv_timeout(Duration::from_secs(5));
    });

    fs::write(temp.path().join("a.scss"), "a {}").unwrap();
    let first = timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(first.paths.iter().any(|p| p.ends_with("a.scss")));

    // The handler is still blocked; these land while the batch is dispatched.
    fs::write(temp.path().join("b.scss"), "b {}").unwrap();
    fs::write(temp.path().join("c.scss"), "c {}").unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    release_tx.send(()).unwrap();

    let second = timeout(Duration::from_millis(500), rx.recv()).await;
    assert!(second.is_err());
}
