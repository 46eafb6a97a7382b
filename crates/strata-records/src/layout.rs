//! File layouts: how sections and schemas fit together for one file kind.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::record::Record;
use crate::schema::Schema;
use crate::section::{SectionId, SectionTable};

/// How a file kind assigns lines to sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sectioning {
    /// No sections; every line uses the fallback schema.
    #[default]
    None,
    /// `NAME` ... `end` blocks; data lines inherit the open section.
    Block,
    /// Each line names its own section through its leading characters.
    PerLine {
        /// Fixed classification width, when names are not compared over
        /// their full length.
        width: Option<usize>,
    },
}

/// A record tagged with the section it belongs to.
///
/// The section decides which schema shaped the record; two rows are equal
/// only when both the tag and the record match.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub section: Option<SectionId>,
    pub record: Record,
}

impl Row {
    pub fn new(section: Option<SectionId>, record: Record) -> Self {
        Self { section, record }
    }
}

/// Sections, sectioning mode and schemas for one file kind.
#[derive(Debug, Clone)]
pub struct Layout {
    sectioning: Sectioning,
    sections: SectionTable,
    schemas: Vec<Option<Arc<Schema>>>,
    fallback: Option<Arc<Schema>>,
}

impl Layout {
    /// An unsectioned layout where every line uses `schema`.
    pub fn flat(schema: Arc<Schema>) -> Self {
        Self {
            sectioning: Sectioning::None,
            sections: SectionTable::default(),
            schemas: Vec::new(),
            fallback: Some(schema),
        }
    }

    pub fn builder(sectioning: Sectioning) -> LayoutBuilder {
        LayoutBuilder {
            sectioning,
            sections: SectionTable::default(),
            schemas: Vec::new(),
            fallback: None,
        }
    }

    pub fn sectioning(&self) -> Sectioning {
        self.sectioning
    }

    pub fn sections(&self) -> &SectionTable {
        &self.sections
    }

    pub fn is_sectioned(&self) -> bool {
        self.sectioning != Sectioning::None
    }

    /// Schema for rows of `section`, falling back to the unsectioned schema.
    pub fn schema_for(&self, section: Option<SectionId>) -> Option<&Arc<Schema>> {
        section
            .and_then(|id| self.schemas.get(id.0))
            .and_then(Option::as_ref)
            .or(self.fallback.as_ref())
    }

    /// Every declared schema, section schemas first.
    pub fn schemas(&self) -> impl Iterator<Item = &Arc<Schema>> {
        self.schemas.iter().flatten().chain(self.fallback.as_ref())
    }

    /// Section a cleaned line belongs to in per-line mode.
    pub fn classify(&self, line: &str) -> Option<SectionId> {
        match self.sectioning {
            Sectioning::PerLine { width } => {
                self.sections.by_prefix(line, width).map(|section| section.id())
            }
            Sectioning::None | Sectioning::Block => None,
        }
    }

    /// Parse a cleaned data line as a row of `section`.
    pub fn parse_row(&self, section: Option<SectionId>, line: &str) -> Result<Row> {
        let schema = self.schema_for(section).ok_or_else(|| Error::UnknownSection {
            name: section
                .and_then(|id| self.sections.name(id))
                .unwrap_or("<none>")
                .to_string(),
        })?;
        let record = Record::from_line(Arc::clone(schema), line)?;
        Ok(Row::new(section, record))
    }
}

#[derive(Debug)]
pub struct LayoutBuilder {
    sectioning: Sectioning,
    sections: SectionTable,
    schemas: Vec<Option<Arc<Schema>>>,
    fallback: Option<Arc<Schema>>,
}

impl LayoutBuilder {
    /// Declare the next section with its own schema.
    pub fn section(mut self, name: impl Into<String>, schema: Arc<Schema>) -> Result<Self> {
        let id = self.sections.push(name)?;
        self.schemas.resize(id.0 + 1, None);
        self.schemas[id.0] = Some(schema);
        Ok(self)
    }

    /// Declare the next section, reading its rows with the fallback schema.
    pub fn bare_section(mut self, name: impl Into<String>) -> Result<Self> {
        let id = self.sections.push(name)?;
        self.schemas.resize(id.0 + 1, None);
        Ok(self)
    }

    /// Schema for lines outside any section, or in sections without one.
    pub fn fallback(mut self, schema: Arc<Schema>) -> Self {
        self.fallback = Some(schema);
        self
    }

    pub fn build(self) -> Layout {
        Layout {
            sectioning: self.sectioning,
            sections: self.sections,
            schemas: self.schemas,
            fallback: self.fallback,
        }
    }
}
