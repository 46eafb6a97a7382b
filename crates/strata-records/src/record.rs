//! Typed records: one parsed line shaped by a [`Schema`].

use std::fmt::Write as _;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::value::Value;

/// One row of a data file.
///
/// Holds a value per schema slot, a presence flag per slot and the number
/// of present slots. Ignored slots can hold a value but are never present,
/// so they are neither printed nor counted nor compared.
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<Schema>,
    values: Vec<Option<Value>>,
    present: Vec<bool>,
    filled: usize,
}

impl Record {
    /// An empty record of the given shape.
    pub fn new(schema: Arc<Schema>) -> Self {
        let len = schema.len();
        Self {
            schema,
            values: vec![None; len],
            present: vec![false; len],
            filled: 0,
        }
    }

    /// Parse `line` into a new record, failing when it does not fill the
    /// required fields.
    pub fn from_line(schema: Arc<Schema>, line: &str) -> Result<Self> {
        let mut record = Self::new(schema);
        let filled = record.parse(line);
        if record.is_good() {
            Ok(record)
        } else {
            Err(Error::Parse {
                line: line.to_string(),
                required: record.schema.required_len(),
                filled,
            })
        }
    }

    /// Replace the contents of this record with the fields of `line`.
    ///
    /// Returns the number of fields filled. The record is good when that
    /// count reaches the schema's required length; optional fields are
    /// filled greedily up to the first token that does not fit.
    pub fn parse(&mut self, line: &str) -> usize {
        self.reset();
        let schema = Arc::clone(&self.schema);
        let mut parsed = Vec::new();
        let filled = schema.scan(line, |index, field_type, token| {
            match Value::parse(field_type, token) {
                Some(value) => {
                    parsed.push((index, value));
                    true
                }
                None => false,
            }
        });
        for (index, value) in parsed {
            self.values[index] = Some(value);
            self.present[index] = true;
        }
        self.filled = filled;
        filled
    }

    /// Count the fields `line` would fill, leaving this record untouched.
    pub fn check(&self, line: &str) -> usize {
        self.schema.check(line)
    }

    /// Whether every required slot is filled.
    pub fn is_good(&self) -> bool {
        let required = (0..self.schema.len())
            .filter(|&index| self.schema.is_required(index) && self.present[index])
            .count();
        required == self.schema.required_len()
    }

    /// Append the present fields to `out`, returning how many were printed.
    ///
    /// Each printed field is followed by its type's separator, except the
    /// last one when the schema declares no trailing separator. Printing
    /// stops at the first value that cannot be written as one token.
    pub fn write_fields(&self, out: &mut String) -> usize {
        let mut printed = 0;
        let mut pending_separator = None;
        for (index, slot) in self.schema.slots().iter().enumerate() {
            if !self.present[index] {
                continue;
            }
            let Some(value) = &self.values[index] else {
                break;
            };
            if !value.is_printable() {
                break;
            }
            if let Some(separator) = pending_separator.take() {
                out.push(separator);
            }
            let _ = write!(out, "{value}");
            pending_separator = Some(slot.separator);
            printed += 1;
        }
        if self.schema.trailing_separator() {
            if let Some(separator) = pending_separator {
                out.push(separator);
            }
        }
        printed
    }

    /// Render this record as one line.
    ///
    /// Fails when fewer fields were printed than are filled.
    pub fn serialize(&self) -> Result<String> {
        let mut line = String::new();
        let printed = self.write_fields(&mut line);
        if printed == self.filled {
            Ok(line)
        } else {
            Err(Error::Serialize {
                printed,
                filled: self.filled,
            })
        }
    }

    /// Value stored in slot `index`, present or not.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the schema.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values[index].as_ref()
    }

    /// Store `value` in slot `index` and mark it present, unless the slot's
    /// type is ignored.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the schema.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) {
        let value = value.into();
        let slot = self.schema.slot(index);
        debug_assert!(
            slot.ignore || slot.field_type == value.field_type(),
            "slot {index} holds {} but got {}",
            slot.field_type,
            value.field_type()
        );
        self.values[index] = Some(value);
        if !slot.ignore && !self.present[index] {
            self.present[index] = true;
            self.filled += 1;
        }
    }

    /// Remove the value in slot `index`, returning it.
    pub fn take(&mut self, index: usize) -> Option<Value> {
        if self.present[index] {
            self.present[index] = false;
            self.filled -= 1;
        }
        self.values[index].take()
    }

    pub fn is_present(&self, index: usize) -> bool {
        self.present[index]
    }

    /// Number of present slots.
    pub fn filled(&self) -> usize {
        self.filled
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Present values in slot order.
    pub fn values(&self) -> impl Iterator<Item = (usize, &Value)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|(index, _)| self.present[*index])
            .filter_map(|(index, value)| value.as_ref().map(|v| (index, v)))
    }

    fn reset(&mut self) {
        self.values.iter_mut().for_each(|value| *value = None);
        self.present.iter_mut().for_each(|present| *present = false);
        self.filled = 0;
    }

    fn same_schema(&self, other: &Record) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema) || self.schema.same_shape(&other.schema)
    }
}

impl PartialEq for Record {
    /// Precompare hooks settle first; otherwise filled counts must match and
    /// then slots are compared cheapest first, presence included.
    fn eq(&self, other: &Self) -> bool {
        if !self.same_schema(other) {
            return false;
        }

        for precompare in self.schema.precompares() {
            if let Some(equal) = precompare(self, other) {
                return equal;
            }
        }

        if self.filled != other.filled {
            return false;
        }

        self.schema.compare_order().iter().all(|&index| {
            self.present[index] == other.present[index]
                && (!self.present[index] || self.values[index] == other.values[index])
        })
    }
}
