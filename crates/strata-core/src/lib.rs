//! Layered merge engine for sectioned record files.
//!
//! Several sources of the same file kind (one default baseline plus any
//! number of overrides) are read into [`RecordStore`]s. For every key seen
//! in any store the [dominance resolver](dominance) picks one value, and
//! the survivors are written back in the same dialect by the
//! [`SectionWriter`].
//!
//! File kinds are described either in code, by implementing
//! [`RecordKind`], or declaratively through a [`Job`] file.

pub mod dominance;
pub mod engine;
pub mod error;
pub mod job;
pub mod kind;
pub mod store;
pub mod writer;

pub use dominance::{Bucket, DominanceFlags, Outcome, Resolution, resolve, resolve_detailed};
pub use engine::{MergeEngine, MergeReport, Merged};
pub use error::{Error, Result};
pub use job::{DeclaredKind, Job, JobConfig, JobSource, KeyField, RowKey};
pub use kind::{RecordKind, RowStore};
pub use store::{KeyOrder, RecordStore};
pub use writer::{LineEnding, SectionWriter, WriteOptions, WriteStats};
