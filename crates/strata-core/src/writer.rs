//! Sectioned output writer.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use strata_records::{END_MARKER, Layout, Row, SectionId, Sectioning};
use tracing::{trace, warn};

/// Line terminator used for written files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOptions {
    pub line_ending: LineEnding,
}

/// Counters for one write pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteStats {
    /// Rows written.
    pub written: usize,
    /// Rows that failed to serialize and were left out.
    pub dropped: usize,
    /// Section blocks opened.
    pub sections: usize,
}

/// Writes rows in the dialect of a [`Layout`].
///
/// In block mode a section header is emitted only when a row's section
/// differs from the previous row's, and the open block is closed with
/// `end` before switching or when a row without a section follows.
pub struct SectionWriter<'l, W: Write> {
    layout: &'l Layout,
    out: W,
    options: WriteOptions,
    open: Option<SectionId>,
    stats: WriteStats,
}

impl<'l, W: Write> SectionWriter<'l, W> {
    pub fn new(layout: &'l Layout, out: W, options: WriteOptions) -> Self {
        Self {
            layout,
            out,
            options,
            open: None,
            stats: WriteStats::default(),
        }
    }

    pub fn stats(&self) -> WriteStats {
        self.stats
    }

    /// Write one row. Returns `Ok(false)` when the row could not be
    /// serialized and was dropped.
    pub fn write_row(&mut self, row: &Row) -> io::Result<bool> {
        let line = match row.record.serialize() {
            Ok(line) => line,
            Err(err) => {
                warn!(%err, "dropping row that failed to serialize");
                self.stats.dropped += 1;
                return Ok(false);
            }
        };

        if self.layout.sectioning() == Sectioning::Block && row.section != self.open {
            self.close_section()?;
            if let Some(id) = row.section {
                self.open_section(id)?;
            }
        }

        self.write_line(&line)?;
        self.stats.written += 1;
        Ok(true)
    }

    pub fn write_rows<'r, I>(&mut self, rows: I) -> io::Result<()>
    where
        I: IntoIterator<Item = &'r Row>,
    {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    /// Close any open section and flush.
    pub fn finish(mut self) -> io::Result<WriteStats> {
        self.close_section()?;
        self.out.flush()?;
        Ok(self.stats)
    }

    fn open_section(&mut self, id: SectionId) -> io::Result<()> {
        let Some(name) = self.layout.sections().name(id) else {
            return Ok(());
        };
        trace!(section = name, "opening section");
        let name = name.to_string();
        self.write_line(&name)?;
        self.open = Some(id);
        self.stats.sections += 1;
        Ok(())
    }

    fn close_section(&mut self) -> io::Result<()> {
        if self.open.take().is_some() {
            self.write_line(END_MARKER)?;
        }
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(self.options.line_ending.as_str().as_bytes())
    }
}
