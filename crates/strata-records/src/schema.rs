//! Record schemas.
//!
//! A schema is the ordered list of field slots for one record kind. The
//! [`Slot::Optional`] marker splits the list into a required prefix and an
//! optional suffix; it occupies no slot itself. Schemas are immutable once
//! built and shared between records through an `Arc`.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::field::{FieldDescriptor, FieldRegistry, FieldType, Precompare};
use crate::value::Value;

/// One declaration in a schema's field list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Field(FieldType),
    /// Everything after this marker may be absent.
    Optional,
}

/// The fixed shape of one record kind.
#[derive(Debug)]
pub struct Schema {
    slots: Vec<FieldDescriptor>,
    /// Slots (ignored ones included) before the optional marker.
    required_slots: usize,
    /// Non-ignored slots before the optional marker.
    required_len: usize,
    /// Non-ignored slot indices, cheapest first.
    compare_order: Vec<usize>,
    precompares: Vec<Precompare>,
    trailing_separator: bool,
}

impl Schema {
    pub fn builder(registry: &FieldRegistry) -> SchemaBuilder<'_> {
        SchemaBuilder {
            registry,
            slots: Vec::new(),
            trailing_separator: false,
        }
    }

    /// Build a schema from a slot list such as a job file declares.
    pub fn from_slots(registry: &FieldRegistry, slots: &[Slot]) -> Result<Arc<Self>> {
        let mut builder = Self::builder(registry);
        builder.slots.extend_from_slice(slots);
        builder.build()
    }

    pub fn slots(&self) -> &[FieldDescriptor] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> &FieldDescriptor {
        &self.slots[index]
    }

    /// Number of slots, ignored ones included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Minimum number of fields a line must fill to parse.
    pub fn required_len(&self) -> usize {
        self.required_len
    }

    /// Whether slot `index` lies before the optional marker.
    pub fn is_required(&self, index: usize) -> bool {
        index < self.required_slots
    }

    pub fn trailing_separator(&self) -> bool {
        self.trailing_separator
    }

    pub(crate) fn compare_order(&self) -> &[usize] {
        &self.compare_order
    }

    pub(crate) fn precompares(&self) -> &[Precompare] {
        &self.precompares
    }

    /// Walk `line` through the schema, left to right.
    ///
    /// Ignored slots consume no token. Filling stops at the first token that
    /// is missing or does not fit its slot. `accept` sees every token that
    /// fits and the return value is the number of slots filled.
    pub(crate) fn scan<'l, F>(&self, line: &'l str, mut accept: F) -> usize
    where
        F: FnMut(usize, FieldType, &'l str) -> bool,
    {
        let mut tokens = line.split_whitespace();
        let mut filled = 0;
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.ignore {
                continue;
            }
            let Some(token) = tokens.next() else {
                break;
            };
            if !accept(index, slot.field_type, token) {
                break;
            }
            filled += 1;
        }
        filled
    }

    /// Count the fields `line` would fill, without building values.
    pub fn check(&self, line: &str) -> usize {
        self.scan(line, |_, field_type, token| Value::accepts(field_type, token))
    }

    /// Whether `line` fills at least the required fields.
    pub fn matches(&self, line: &str) -> bool {
        self.check(line) >= self.required_len
    }

    /// Whether two schemas describe the same shape.
    pub fn same_shape(&self, other: &Schema) -> bool {
        self.required_slots == other.required_slots
            && self.trailing_separator == other.trailing_separator
            && self.slots.len() == other.slots.len()
            && self
                .slots
                .iter()
                .zip(&other.slots)
                .all(|(a, b)| a.field_type == b.field_type && a.ignore == b.ignore)
    }
}

/// Incremental schema construction.
#[derive(Debug)]
pub struct SchemaBuilder<'r> {
    registry: &'r FieldRegistry,
    slots: Vec<Slot>,
    trailing_separator: bool,
}

impl SchemaBuilder<'_> {
    pub fn field(mut self, field_type: FieldType) -> Self {
        self.slots.push(Slot::Field(field_type));
        self
    }

    pub fn fields(mut self, field_types: impl IntoIterator<Item = FieldType>) -> Self {
        self.slots.extend(field_types.into_iter().map(Slot::Field));
        self
    }

    /// Mark every following field as optional.
    pub fn optional(mut self) -> Self {
        self.slots.push(Slot::Optional);
        self
    }

    /// Write a separator after the last printed field too.
    pub fn trailing_separator(mut self, trailing: bool) -> Self {
        self.trailing_separator = trailing;
        self
    }

    pub fn build(self) -> Result<Arc<Schema>> {
        let mut slots = Vec::with_capacity(self.slots.len());
        let mut required_slots = None;

        for slot in &self.slots {
            match slot {
                Slot::Field(field_type) => slots.push(self.registry.descriptor(*field_type)?),
                Slot::Optional if required_slots.is_some() => {
                    return Err(Error::DuplicateOptionalMarker);
                }
                Slot::Optional => required_slots = Some(slots.len()),
            }
        }

        if slots.is_empty() {
            return Err(Error::EmptySchema);
        }

        let required_slots = required_slots.unwrap_or(slots.len());
        let required_len = slots[..required_slots]
            .iter()
            .filter(|slot| !slot.ignore)
            .count();

        let mut compare_order: Vec<usize> = (0..slots.len())
            .filter(|&index| !slots[index].ignore)
            .collect();
        compare_order.sort_by_key(|&index| slots[index].cost);

        let mut seen = Vec::new();
        let mut precompares = Vec::new();
        for slot in &slots {
            if let Some(hook) = slot.precompare {
                if !seen.contains(&slot.field_type) {
                    seen.push(slot.field_type);
                    precompares.push(hook);
                }
            }
        }

        Ok(Arc::new(Schema {
            slots,
            required_slots,
            required_len,
            compare_order,
            precompares,
            trailing_separator: self.trailing_separator,
        }))
    }
}
