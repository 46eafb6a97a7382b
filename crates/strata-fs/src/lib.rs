//! Filesystem boundary for the strata merge engine
//!
//! Provides normalized paths, atomic output writes, format-agnostic job
//! configuration loading and size-aware access to source files.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod path;
pub mod source;

pub use config::{ConfigFormat, load_config};
pub use error::{Error, Result};
pub use path::NormalizedPath;
pub use source::{DEFAULT_STREAM_THRESHOLD, SourceText};
