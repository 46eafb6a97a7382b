//! Merge command implementation

use std::path::Path;

use colored::Colorize;
use serde_json::json;
use similar::{ChangeTag, TextDiff};
use strata_core::MergeReport;
use strata_fs::{NormalizedPath, io};

use super::load_job;
use crate::error::Result;

/// Run the merge command
///
/// With `dry_run` the merged text is diffed against the current output
/// instead of being written.
pub fn run_merge(job_path: &Path, output: Option<&Path>, dry_run: bool, json: bool) -> Result<()> {
    let mut job = load_job(job_path)?;
    if let Some(output) = output {
        job.output = NormalizedPath::new(output);
    }

    if dry_run {
        return preview(&job, json);
    }

    let report = job.run()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn preview(job: &strata_core::Job, json: bool) -> Result<()> {
    let (merged, report) = job.load_engine()?.render()?;
    let current = if job.output.is_file() {
        io::read_text(&job.output)?
    } else {
        String::new()
    };

    let diff = TextDiff::from_lines(&current, &merged);
    let has_changes = current != merged;

    if json {
        let json_output = json!({
            "has_changes": has_changes,
            "output": job.output.as_str(),
            "report": report,
            "diff": diff
                .unified_diff()
                .header(job.output.as_str(), "merged")
                .to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&json_output)?);
        return Ok(());
    }

    if !has_changes {
        println!(
            "{} {} is up to date.",
            "OK".green().bold(),
            job.output.as_str().yellow()
        );
        return Ok(());
    }

    println!("{} {}", "Diff".blue().bold(), job.output.as_str().yellow());
    println!();
    for change in diff.iter_all_changes() {
        let line = change.to_string_lossy();
        let line = line.trim_end_matches(['\r', '\n']);
        match change.tag() {
            ChangeTag::Delete => println!("{}", format!("-{line}").red()),
            ChangeTag::Insert => println!("{}", format!("+{line}").green()),
            ChangeTag::Equal => println!(" {line}"),
        }
    }
    println!();
    println!(
        "{} keys, {} rows, {} removed (dry run, nothing written)",
        report.keys, report.written, report.removed
    );
    Ok(())
}

fn print_report(report: &MergeReport) {
    println!(
        "{} {} -> {}",
        "Merged".green().bold(),
        report.kind.cyan(),
        report.output.as_deref().unwrap_or("-").yellow()
    );
    println!("  keys:     {}", report.keys);
    println!("  written:  {}", report.written);
    println!("  removed:  {}", report.removed);
    if report.dropped > 0 {
        println!("  {} {}", "dropped:".yellow(), report.dropped);
    }
    println!("  checksum: {}", report.checksum.dimmed());
}
