//! Typed records for layered data files.
//!
//! A data file is a sequence of whitespace-separated rows, optionally
//! grouped into named sections. This crate covers everything needed to go
//! from one text line to a structured value and back:
//!
//! - [`field`]: per-type behavior (ignore flag, separator, comparison cost,
//!   precompare hook) held in an explicit [`FieldRegistry`]
//! - [`schema`]: the fixed shape of one record kind, with a required prefix
//!   and an optional suffix
//! - [`record`]: a parsed row ([`Record`]) with presence tracking
//! - [`section`]: the ordered [`SectionTable`] for one file kind
//! - [`layout`]: binds sections to schemas and produces section-tagged
//!   [`Row`]s
//! - [`reader`]: line cleaning and the block / per-line sectioned reader
//!
//! ```
//! use strata_records::{FieldRegistry, FieldType, Record, Schema};
//!
//! let registry = FieldRegistry::standard();
//! let schema = Schema::builder(&registry)
//!     .field(FieldType::Word)
//!     .field(FieldType::Int)
//!     .optional()
//!     .field(FieldType::Float)
//!     .build()
//!     .unwrap();
//!
//! let record = Record::from_line(schema, "sword 12").unwrap();
//! assert_eq!(record.filled(), 2);
//! assert_eq!(record.serialize().unwrap(), "sword 12");
//! ```

pub mod error;
pub mod field;
pub mod layout;
pub mod reader;
pub mod record;
pub mod schema;
pub mod section;
pub mod value;

pub use error::{Error, Result};
pub use field::{FieldDescriptor, FieldRegistry, FieldType, Precompare};
pub use layout::{Layout, LayoutBuilder, Row, Sectioning};
pub use reader::{END_MARKER, LineKind, ReadOptions, ReadStats, SectionedReader, clean_line};
pub use record::Record;
pub use schema::{Schema, SchemaBuilder, Slot};
pub use section::{Section, SectionId, SectionTable};
pub use value::Value;
