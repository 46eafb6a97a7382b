//! strata CLI
//!
//! Merges layered record files declared in job files.

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

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

    logging::init(cli.verbose)
        .map_err(|e| CliError::user(format!("failed to set up logging: {e}")))?;

    match cli.command {
        Some(cmd) => execute_command(cmd),
        None => {
            println!("{} layered record merges", "strata".green().bold());
            println!();
            println!("Run {} for available commands.", "strata --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Merge {
            job,
            output,
            dry_run,
            json,
        } => commands::run_merge(&job, output.as_deref(), dry_run, json),
        Commands::Check { job, json } => commands::run_check(&job, json),
        Commands::Explain {
            job,
            key,
            section,
            json,
        } => commands::run_explain(&job, &key, section.as_deref(), json),
    }
}
