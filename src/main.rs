//! wayshell entry point.

use std::process;

use clap::Parser;
use wayshell::cli::{self, Cli, formatting::format_error};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli::run(cli).await {
        eprintln!("{}: {e}", format_error("Error"));
        process::exit(1);
    }
}
