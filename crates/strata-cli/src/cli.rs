//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// strata - merge layered record files by dominance
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Merge every source of a job and write the result
    ///
    /// Examples:
    ///   strata merge items.toml               # Write to the job's output
    ///   strata merge items.toml -o merged.txt # Write somewhere else
    ///   strata merge items.toml --dry-run     # Show what would change
    Merge {
        /// Job file (.toml, .json, .yaml)
        job: PathBuf,

        /// Write here instead of the job's output path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Preview the merged output as a diff without writing it
        #[arg(long)]
        dry_run: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Read every source of a job and report line statistics
    Check {
        /// Job file (.toml, .json, .yaml)
        job: PathBuf,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show how one key is resolved across the job's sources
    Explain {
        /// Job file (.toml, .json, .yaml)
        job: PathBuf,

        /// Key written as it appears in a data line, e.g. "goblin sword 0"
        #[arg(short, long)]
        key: String,

        /// Section the key belongs to (block-sectioned kinds)
        #[arg(short, long)]
        section: Option<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}
