//! Explain command implementation

use std::path::Path;

use colored::Colorize;
use serde_json::json;
use strata_core::{Bucket, RecordKind};
use strata_records::Row;

use super::load_job;
use crate::error::Result;

/// Run the explain command
///
/// Loads every source, resolves one key and prints each distinct value
/// with the stores carrying it.
pub fn run_explain(job_path: &Path, key: &str, section: Option<&str>, json: bool) -> Result<()> {
    let job = load_job(job_path)?;
    let engine = job.load_engine()?;
    let key = job.kind.parse_key(section, key)?;
    let resolution = engine.explain(&key);
    let stores = engine.stores();
    let store_name = |index: usize| stores.get(index).map_or("?", |s| s.name());

    if json {
        let buckets: Vec<_> = resolution
            .buckets
            .iter()
            .enumerate()
            .map(|(index, bucket)| {
                json!({
                    "value": render(bucket),
                    "count": bucket.count,
                    "seen_in_default": bucket.seen_in_default,
                    "first_store": store_name(bucket.first_store),
                    "winner": resolution.winner == Some(index),
                })
            })
            .collect();
        let output = json!({
            "key": key.to_string(),
            "section": job.kind.section_name(&key),
            "flags": format!("{:?}", engine.kind().flags(&key)),
            "outcome": resolution.outcome,
            "value": resolution.value().map(|row| row.record.serialize().ok()),
            "buckets": buckets,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let section = job
        .kind
        .section_name(&key)
        .map(|name| format!(" in {name}"))
        .unwrap_or_default();
    println!("{} {}{}", "Key".blue().bold(), key.to_string().cyan(), section);
    println!("  flags: {:?}", engine.kind().flags(&key));
    println!();

    for (index, bucket) in resolution.buckets.iter().enumerate() {
        let marker = if resolution.winner == Some(index) {
            "*".green().bold()
        } else {
            " ".normal()
        };
        let origin = if bucket.seen_in_default { " default" } else { "" };
        println!(
            "  {marker} {}  x{}{}  first in {}",
            render(bucket),
            bucket.count,
            origin.dimmed(),
            store_name(bucket.first_store)
        );
    }
    if resolution.buckets.is_empty() {
        println!("  (no buckets)");
    }

    println!();
    match resolution.value() {
        Some(_) => println!("{} {}", "Outcome:".bold(), resolution.outcome.to_string().green()),
        None => println!("{} {}", "Outcome:".bold(), resolution.outcome.to_string().yellow()),
    }
    Ok(())
}

fn render(bucket: &Bucket<'_, Row>) -> String {
    bucket
        .value
        .record
        .serialize()
        .unwrap_or_else(|err| format!("<unprintable: {err}>"))
}
