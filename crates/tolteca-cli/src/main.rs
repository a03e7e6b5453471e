//! tolteca CLI
//!
//! The command-line interface for managing Toltec runtime context
//! directories.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands};
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Warnings such as a version mismatch are always shown
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(cli.verbose)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| CliError::user(format!("Failed to set tracing subscriber: {e}")))?;
    tracing::debug!(dir = %cli.dir.display(), "Verbose mode enabled");

    match cli.command {
        Some(cmd) => execute_command(&cli.dir, cmd),
        None => {
            println!(
                "{} Toltec runtime context manager",
                "tolteca".green().bold()
            );
            println!();
            println!("Run {} for available commands.", "tolteca --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(dir: &std::path::Path, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init { force } => commands::run_init(dir, force),
        Commands::Setup { overwrite, set } => commands::run_setup(dir, overwrite, &set),
        Commands::Config => commands::run_config(dir),
        Commands::Link { src, name } => commands::run_link(dir, &src, name.as_deref()),
        Commands::Files => commands::run_files(dir),
    }
}
