//! Sectioned reader.
//!
//! Turns raw text into cleaned, classified lines and parses data lines
//! into [`Row`]s. Malformed lines are counted and skipped; only failing to
//! open or read the source is an error.

use std::borrow::Cow;
use std::io::BufRead;

use strata_fs::{DEFAULT_STREAM_THRESHOLD, SourceText};
use tracing::{debug, trace};

use crate::layout::{Layout, Row, Sectioning};
use crate::section::SectionId;

/// Literal line that closes a block section.
pub const END_MARKER: &str = "end";

/// Reader tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Sources larger than this many bytes are streamed line by line.
    pub stream_threshold: u64,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            stream_threshold: DEFAULT_STREAM_THRESHOLD,
        }
    }
}

/// Per-source line accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Raw lines seen, blank and comment lines included.
    pub lines: usize,
    /// Data lines that became rows.
    pub accepted: usize,
    /// Data lines that did not fill their schema's required fields.
    pub rejected: usize,
    /// Data lines with no schema to read them (outside any section).
    pub skipped: usize,
}

/// What a cleaned line means to the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Empty,
    /// Closes the open block section.
    End,
    /// Opens a block section.
    Open(SectionId),
    Data(&'a str),
}

/// Strip the trailing comment, turn commas and control characters into
/// spaces and trim both ends.
///
/// A comment starts at the first `#` or `;`.
pub fn clean_line(raw: &str) -> Cow<'_, str> {
    let code = match raw.find(['#', ';']) {
        Some(pos) => &raw[..pos],
        None => raw,
    };
    let needs_rewrite = |c: char| c == ',' || c.is_control();
    if code.contains(needs_rewrite) {
        let rewritten: String = code
            .chars()
            .map(|c| if needs_rewrite(c) { ' ' } else { c })
            .collect();
        Cow::Owned(rewritten.trim().to_string())
    } else {
        Cow::Borrowed(code.trim())
    }
}

/// Reads lines of one source into rows according to a [`Layout`].
#[derive(Debug)]
pub struct SectionedReader<'l> {
    layout: &'l Layout,
    current: Option<SectionId>,
    stats: ReadStats,
}

impl<'l> SectionedReader<'l> {
    pub fn new(layout: &'l Layout) -> Self {
        Self {
            layout,
            current: None,
            stats: ReadStats::default(),
        }
    }

    /// Section currently open in block mode.
    pub fn current_section(&self) -> Option<SectionId> {
        self.current
    }

    pub fn stats(&self) -> ReadStats {
        self.stats
    }

    /// Classify a cleaned line.
    pub fn classify<'a>(&self, line: &'a str) -> LineKind<'a> {
        if line.is_empty() {
            return LineKind::Empty;
        }
        if self.layout.sectioning() == Sectioning::Block {
            if line.eq_ignore_ascii_case(END_MARKER) {
                return LineKind::End;
            }
            if let Some(section) = self.layout.sections().by_name(line) {
                return LineKind::Open(section.id());
            }
        }
        LineKind::Data(line)
    }

    /// Process one raw line, returning the row it produced.
    pub fn feed_line(&mut self, raw: &str) -> Option<Row> {
        self.stats.lines += 1;
        let line_no = self.stats.lines;
        let cleaned = clean_line(raw);

        let data = match self.classify(&cleaned) {
            LineKind::Empty => return None,
            LineKind::End => {
                trace!(line_no, "section closed");
                self.current = None;
                return None;
            }
            LineKind::Open(id) => {
                trace!(line_no, section = %id, "section opened");
                self.current = Some(id);
                return None;
            }
            LineKind::Data(data) => data,
        };

        let section = match self.layout.sectioning() {
            Sectioning::Block => self.current,
            Sectioning::PerLine { .. } => self.layout.classify(data),
            Sectioning::None => None,
        };

        if self.layout.schema_for(section).is_none() {
            trace!(line_no, "no schema for line, skipping");
            self.stats.skipped += 1;
            return None;
        }

        match self.layout.parse_row(section, data) {
            Ok(row) => {
                self.stats.accepted += 1;
                Some(row)
            }
            Err(err) => {
                debug!(line_no, %err, "dropping malformed line");
                self.stats.rejected += 1;
                None
            }
        }
    }

    /// Read every line of `text`.
    pub fn read_str<F>(&mut self, text: &str, mut sink: F) -> ReadStats
    where
        F: FnMut(Row),
    {
        for raw in text.lines() {
            if let Some(row) = self.feed_line(raw) {
                sink(row);
            }
        }
        self.stats
    }

    /// Read every line of an opened source.
    pub fn read_source<F>(
        &mut self,
        source: SourceText,
        mut sink: F,
    ) -> strata_fs::Result<ReadStats>
    where
        F: FnMut(Row),
    {
        source.for_each_line(|raw| {
            if let Some(row) = self.feed_line(raw) {
                sink(row);
            }
        })?;
        Ok(self.stats)
    }

    /// Read every line of a buffered stream.
    pub fn read_buf<R, F>(&mut self, reader: R, mut sink: F) -> std::io::Result<ReadStats>
    where
        R: BufRead,
        F: FnMut(Row),
    {
        for raw in reader.lines() {
            if let Some(row) = self.feed_line(&raw?) {
                sink(row);
            }
        }
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("  sword 10  ", "sword 10")]
    #[case("sword,10,2.5", "sword 10 2.5")]
    #[case("sword\t10\r", "sword 10")]
    #[case("sword 10 # heavy", "sword 10")]
    #[case("sword 10 ; legacy # note", "sword 10")]
    #[case("# whole line comment", "")]
    #[case(";", "")]
    #[case("", "")]
    fn clean_line_cases(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(clean_line(raw), expected);
    }

    #[test]
    fn clean_line_borrows_when_possible() {
        assert!(matches!(clean_line("  a b  "), Cow::Borrowed("a b")));
        assert!(matches!(clean_line("a,b"), Cow::Owned(_)));
    }
}
