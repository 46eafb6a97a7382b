//! Field type registry.
//!
//! Every slot of a [`Schema`](crate::Schema) has a [`FieldType`]. What a type
//! *does* (whether it is ignored, which separator follows it on output, how
//! expensive it is to compare, and whether a cheap precompare exists) lives
//! in a [`FieldDescriptor`] looked up from a [`FieldRegistry`]. Schemas
//! resolve their descriptors once at build time, so records never consult
//! the registry again.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::record::Record;

/// Cheap equality test over a full pair of records.
///
/// Returns `Some(equal)` to settle the comparison immediately, or `None` to
/// fall through to the field-by-field check.
pub type Precompare = fn(&Record, &Record) -> Option<bool>;

/// Identity of a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldType {
    /// Signed 64-bit integer
    Int,
    /// Unsigned 64-bit integer
    Uint,
    /// Finite 64-bit float
    Float,
    /// Unsigned integer written in hexadecimal, `0x` prefix optional on input
    Hex,
    /// Any token without whitespace or reserved punctuation
    Word,
    /// `0`/`1`/`true`/`false`, written as `0`/`1`
    Bool,
    /// Placeholder slot that consumes no input
    Skip,
}

impl FieldType {
    pub const ALL: [FieldType; 7] = [
        FieldType::Int,
        FieldType::Uint,
        FieldType::Float,
        FieldType::Hex,
        FieldType::Word,
        FieldType::Bool,
        FieldType::Skip,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::Hex => "hex",
            Self::Word => "word",
            Self::Bool => "bool",
            Self::Skip => "skip",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FieldType::ALL
            .into_iter()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownFieldType {
                name: s.to_string(),
            })
    }
}

/// Behavior of one field type.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub field_type: FieldType,
    /// Ignored fields consume no token and are never marked present.
    pub ignore: bool,
    /// Character written after the field on output.
    pub separator: char,
    /// Comparison weight: 0 is free, 1 cheap, higher is more expensive.
    pub cost: u8,
    pub precompare: Option<Precompare>,
}

impl FieldDescriptor {
    pub fn new(field_type: FieldType, cost: u8) -> Self {
        Self {
            field_type,
            ignore: false,
            separator: ' ',
            cost,
            precompare: None,
        }
    }

    pub fn ignored(field_type: FieldType) -> Self {
        Self {
            ignore: true,
            cost: 0,
            ..Self::new(field_type, 0)
        }
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_cost(mut self, cost: u8) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_precompare(mut self, precompare: Precompare) -> Self {
        self.precompare = Some(precompare);
        self
    }
}

/// Explicit registry of field type behavior.
///
/// Built once at startup and passed by reference to schema construction.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    entries: BTreeMap<FieldType, FieldDescriptor>,
}

impl FieldRegistry {
    /// An empty registry; every type must be registered before use.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in behavior for every [`FieldType`].
    ///
    /// Integers cost 1, floats 2 and words 3; `skip` is ignored and free.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry
            .register(FieldDescriptor::new(FieldType::Int, 1))
            .register(FieldDescriptor::new(FieldType::Uint, 1))
            .register(FieldDescriptor::new(FieldType::Hex, 1))
            .register(FieldDescriptor::new(FieldType::Bool, 1))
            .register(FieldDescriptor::new(FieldType::Float, 2))
            .register(FieldDescriptor::new(FieldType::Word, 3))
            .register(FieldDescriptor::ignored(FieldType::Skip));
        registry
    }

    /// Register (or replace) the behavior of a field type.
    pub fn register(&mut self, descriptor: FieldDescriptor) -> &mut Self {
        self.entries.insert(descriptor.field_type, descriptor);
        self
    }

    pub fn get(&self, field_type: FieldType) -> Option<&FieldDescriptor> {
        self.entries.get(&field_type)
    }

    /// Look up a descriptor, failing for unregistered types.
    pub fn descriptor(&self, field_type: FieldType) -> Result<FieldDescriptor> {
        self.get(field_type)
            .copied()
            .ok_or_else(|| Error::UnknownFieldType {
                name: field_type.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
