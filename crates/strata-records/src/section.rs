//! Section tables.
//!
//! A section table is the ordered list of section names one file kind
//! knows. Ids follow declaration order and double as positions, so a
//! table must be declared in the same order as the schemas that serve it.
//! "No section" is represented by `None` at the use sites rather than by
//! an empty-named entry.

use std::fmt;

use crate::error::{Error, Result};

/// Position of a section in its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(pub usize);

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    id: SectionId,
}

impl Section {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> SectionId {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionTable {
    sections: Vec<Section>,
}

impl SectionTable {
    /// Declare sections in order. Names must be non-empty and unique,
    /// ignoring case.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::default();
        for name in names {
            table.push(name)?;
        }
        Ok(table)
    }

    /// Append a section, returning its id.
    pub fn push(&mut self, name: impl Into<String>) -> Result<SectionId> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::EmptySectionName);
        }
        if self.by_name(&name).is_some() {
            return Err(Error::DuplicateSection { name });
        }
        let id = SectionId(self.sections.len());
        self.sections.push(Section { name, id });
        Ok(id)
    }

    /// Section whose name equals the whole of `line`, ignoring case.
    pub fn by_name(&self, line: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|section| section.name.eq_ignore_ascii_case(line))
    }

    /// Section whose name matches the start of `line`, ignoring case.
    ///
    /// Each name is compared over its own length, or over `width`
    /// characters when a fixed classification width is given. When several
    /// names match, the longest wins, then the earliest declared.
    pub fn by_prefix(&self, line: &str, width: Option<usize>) -> Option<&Section> {
        let mut best: Option<(&Section, usize)> = None;
        for section in &self.sections {
            let len = width.map_or(section.name.len(), |w| w.min(section.name.len()));
            let (Some(head), Some(name)) = (line.get(..len), section.name.get(..len)) else {
                continue;
            };
            if head.eq_ignore_ascii_case(name) && best.is_none_or(|(_, best_len)| len > best_len) {
                best = Some((section, len));
            }
        }
        best.map(|(section, _)| section)
    }

    pub fn get(&self, id: SectionId) -> Option<&Section> {
        self.sections.get(id.0)
    }

    pub fn name(&self, id: SectionId) -> Option<&str> {
        self.get(id).map(Section::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SectionTable {
        SectionTable::new(["ITEMS", "ITEMSET", "SPAWN"]).unwrap()
    }

    #[test]
    fn ids_follow_declaration_order() {
        let table = table();
        let ids: Vec<_> = table.iter().map(|s| s.id().0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(table.name(SectionId(2)), Some("SPAWN"));
        assert_eq!(table.get(SectionId(3)), None);
    }

    #[test]
    fn by_name_matches_whole_line_ignoring_case() {
        let table = table();
        assert_eq!(table.by_name("items").map(Section::id), Some(SectionId(0)));
        assert_eq!(table.by_name("Spawn").map(Section::id), Some(SectionId(2)));
        assert!(table.by_name("ITEMS 1").is_none());
        assert!(table.by_name("").is_none());
    }

    #[test]
    fn by_prefix_prefers_longest_match() {
        let table = table();
        assert_eq!(
            table.by_prefix("itemset 4 5", None).map(Section::id),
            Some(SectionId(1))
        );
        assert_eq!(
            table.by_prefix("ITEMS 4 5", None).map(Section::id),
            Some(SectionId(0))
        );
        assert!(table.by_prefix("ITEM", None).is_none());
    }

    #[test]
    fn by_prefix_with_fixed_width() {
        let table = SectionTable::new(["SPAWN", "SPELL"]).unwrap();
        assert_eq!(
            table.by_prefix("spawnpoint 1", Some(3)).map(Section::id),
            Some(SectionId(0))
        );
        assert_eq!(
            table.by_prefix("SPExx 1", Some(3)).map(Section::id),
            Some(SectionId(1))
        );
    }

    #[test]
    fn rejects_empty_and_duplicate_names() {
        assert!(matches!(
            SectionTable::new(["A", ""]),
            Err(Error::EmptySectionName)
        ));
        assert!(matches!(
            SectionTable::new(["Items", "ITEMS"]),
            Err(Error::DuplicateSection { .. })
        ));
    }
}
