//! Command-line interface.
//!
//! `start` runs the shell until interrupted; the other commands are one-shot
//! helpers for inspecting and testing a configuration.

pub mod formatting;


use std::{error::Error, io, path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use schemars::schema_for;
use tokio_stream::{StreamExt, wrappers::WatchStream};
use tracing::{info, instrument};

use crate::{
    config::{Config, ConfigPaths},
    shell::Shell,
    style::{CssApplier, SasscCompiler, StyleCompiler},
    tracing_config,
    windows::builtin_registry,
};

/// Desktop widget shell with live-reloading stylesheets.
#[derive(Debug, Parser)]
#[command(name = "wayshell", version)]
pub struct Cli {
    /// Configuration directory. Defaults to `$XDG_CONFIG_HOME/wayshell`.
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the shell and hot-reload the stylesheet until interrupted.
    Start,
    /// Compile the stylesheet once and exit.
    Compile,
    /// Print the window descriptor handed to the shell runtime as JSON.
    Describe,
    /// Configuration helpers.
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// `wayshell config` subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the default configuration as TOML.
    Default,
    /// Print the configuration JSON schema.
    Schema,
}

impl Cli {
    /// The configuration directory to use.
    ///
    /// # Errors
    /// Returns an error if no directory was given and neither
    /// `XDG_CONFIG_HOME` nor `HOME` is set.
    pub fn resolve_config_dir(&self) -> Result<PathBuf, io::Error> {
        match &self.config_dir {
            Some(dir) => Ok(dir.clone()),
            None => ConfigPaths::config_dir(),
        }
    }
}

/// Executes the parsed command line.
///
/// # Errors
/// Returns the first error raised by configuration loading, startup or
/// output serialization.
pub async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config_dir = cli.resolve_config_dir()?;

    match cli.command {
        Commands::Config(ConfigCommand::Default) => {
            print!("{}", Config::default().to_toml()?);
            Ok(())
        }
        Commands::Config(ConfigCommand::Schema) => {
            println!("{}", serde_json::to_string_pretty(&schema_for!(Config))?);
            Ok(())
        }
        Commands::Start => {
            let config = Config::load(&ConfigPaths::main_config(&config_dir))?;
            start(&config, config_dir).await
        }
        Commands::Compile => {
            let config = Config::load(&ConfigPaths::main_config(&config_dir))?;
            tracing_config::init_cli_mode(config.general.log_level)?;

            let source = config.style.style_source(&config_dir);
            SasscCompiler::new(&config.style.compiler, config.style.compiler_args.clone())
                .compile(&source)?;

            let message = format!("Compiled {}", source.output_path.display());
            println!("{}", formatting::format_success(&message));
            Ok(())
        }
        Commands::Describe => {
            let config = Config::load(&ConfigPaths::main_config(&config_dir))?;
            tracing_config::init_cli_mode(config.general.log_level)?;

            let style = config.style.style_source(&config_dir).output_path;
            let descriptor =
                builtin_registry(&config.windows.enabled, &config.windows.close_delay).build(style)?;
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
            Ok(())
        }
    }
}

#[instrument(skip(config))]
async fn start(config: &Config, config_dir: PathBuf) -> Result<(), Box<dyn Error>> {
    let _guard = tracing_config::init_with_file(config.general.log_level)?;
    info!("Starting wayshell");

    let applier = Arc::new(CssApplier::new());
    let compiler = Arc::new(SasscCompiler::new(
        &config.style.compiler,
        config.style.compiler_args.clone(),
    ));

    let mut stylesheets = WatchStream::new(applier.subscribe());
    let windows = builtin_registry(&config.windows.enabled, &config.windows.close_delay);
    let shell = tokio::task::block_in_place(|| {
        Shell::initialize(config, &config_dir, compiler, applier, windows)
    })?;

    for window in &shell.window_config().windows {
        info!(window = %window.name, "Window registered");
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            Some(active) = stylesheets.next() => match active {
                Some(sheet) => info!(
                    path = %sheet.path.display(),
                    bytes = sheet.css.len(),
                    "Stylesheet active"
                ),
                None => info!("Stylesheet reset"),
            },
            _ = &mut ctrl_c => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}
