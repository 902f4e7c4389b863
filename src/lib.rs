//! wayshell - desktop widget shell configuration with live stylesheets.
//!
//! Assembles the shell's windows and keeps its stylesheet in sync with the
//! SCSS source tree:
//!
//! - TOML configuration with defaults for every field
//! - Recursive, debounced watching of the SCSS sources
//! - External compilation with atomic output replacement
//! - Reset-then-apply stylesheet swaps published to the renderer
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::{path::Path, sync::Arc};
//!
//! use wayshell::{
//!     config::Config,
//!     shell::Shell,
//!     style::{CssApplier, SasscCompiler},
//!     windows::builtin_registry,
//! };
//!
//! # async fn run() -> wayshell::Result<()> {
//! let config_dir = Path::new("/home/me/.config/wayshell");
//! let config = Config::default();
//! let applier = Arc::new(CssApplier::new());
//!
//! let shell = Shell::initialize(
//!     &config,
//!     config_dir,
//!     Arc::new(SasscCompiler::default()),
//!     applier.clone(),
//!     builtin_registry(&config.windows.enabled, &config.windows.close_delay),
//! )?;
//! println!("{} windows", shell.window_config().windows.len());
//! # Ok(())
//! # }
//! ```

/// Command-line interface.
pub mod cli;

/// Configuration schema definitions and loading.
pub mod config;

/// Core error types and result aliases.
pub mod core;

/// Startup wiring of the style pipeline and windows.
pub mod shell;

/// Reactive stylesheet compilation and application.
pub mod style;

/// Tracing subscriber setup.
pub mod tracing_config;

/// Window factories and the runtime descriptor.
pub mod windows;

/// Re-exported core types for convenience.
pub use self::core::{Result, ShellError};
