//! Check command implementation
//!
//! Reads every source of a job and reports how many lines were accepted,
//! rejected or skipped, without merging.

use std::path::Path;

use colored::Colorize;
use serde_json::{Value, json};
use strata_records::ReadStats;

use super::load_job;
use crate::error::{CliError, Result};

/// Run the check command
///
/// Fails when any source cannot be read.
pub fn run_check(job_path: &Path, json: bool) -> Result<()> {
    let job = load_job(job_path)?;
    let mut engine = job.engine();

    let mut entries = Vec::with_capacity(job.sources.len());
    let mut failed = 0;
    for source in &job.sources {
        let result = engine.load_source(source.name.clone(), &source.path, source.is_default);
        let keys = engine.stores().last().map_or(0, |store| store.len());
        if result.is_err() {
            failed += 1;
        }
        entries.push((source, result.map(|stats| (stats, keys))));
    }

    if json {
        let sources: Vec<Value> = entries
            .iter()
            .map(|(source, result)| match result {
                Ok((stats, keys)) => json!({
                    "name": source.name,
                    "path": source.path.as_str(),
                    "default": source.is_default,
                    "ok": true,
                    "lines": stats.lines,
                    "accepted": stats.accepted,
                    "rejected": stats.rejected,
                    "skipped": stats.skipped,
                    "keys": keys,
                }),
                Err(err) => json!({
                    "name": source.name,
                    "path": source.path.as_str(),
                    "default": source.is_default,
                    "ok": false,
                    "error": err.to_string(),
                }),
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "kind": job.kind_name(),
                "sources": sources,
            }))?
        );
    } else {
        println!("{} {}", "Check".blue().bold(), job.kind_name().cyan());
        for (source, result) in &entries {
            let marker = if source.is_default { " (default)" } else { "" };
            match result {
                Ok((stats, keys)) => print_stats(&source.name, marker, stats, *keys),
                Err(err) => {
                    println!("  {} {}{}: {}", "FAIL".red().bold(), source.name, marker, err)
                }
            }
        }
    }

    if failed > 0 {
        return Err(CliError::user(format!(
            "{failed} of {} sources could not be read",
            job.sources.len()
        )));
    }
    Ok(())
}

fn print_stats(name: &str, marker: &str, stats: &ReadStats, keys: usize) {
    let status = if stats.rejected > 0 {
        "WARN".yellow().bold()
    } else {
        "OK".green().bold()
    };
    println!(
        "  {status} {name}{marker}: {} lines, {} accepted, {} rejected, {} skipped, {keys} keys",
        stats.lines, stats.accepted, stats.rejected, stats.skipped
    );
}
