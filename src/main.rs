//! Rigprep CLI - Layer Flattening and Export
//!
//! Command-line interface for the Rigprep export flow.

use clap::Parser;
use env_logger::Env;
use log::info;

use rigprep::cli::{commands, Cli, Commands};

fn main() {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Rigprep v{}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Some(Commands::Export { path, strategy }) => commands::export(&path, strategy.into()),
        Some(Commands::Check { path }) => commands::check(&path),
        Some(Commands::Inspect { path }) => commands::inspect(&path),
        None => {
            println!("Rigprep v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    };

    if let Err(err) = result {
        // Preflight aborts already rendered their dialog.
        if !err.is_user_abort() {
            eprintln!("Error [{}]: {}", err.error_code(), err);
        }
        std::process::exit(1);
    }
}
