//! Command implementations for strata-cli

pub mod check;
pub mod explain;
pub mod merge;

pub use check::run_check;
pub use explain::run_explain;
pub use merge::run_merge;

use std::path::Path;

use strata_core::Job;
use strata_fs::NormalizedPath;

use crate::error::Result;

/// Load the job file at `path`.
pub(crate) fn load_job(path: &Path) -> Result<Job> {
    Ok(Job::load(&NormalizedPath::new(path))?)
}
