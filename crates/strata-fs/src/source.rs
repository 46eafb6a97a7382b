//! Line access to source files.
//!
//! Small sources are read into memory in one call; anything above the
//! stream threshold is read line by line through a buffered reader.
//! Both paths yield identical lines.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;

use crate::{Error, NormalizedPath, Result};

/// Default size above which sources are streamed instead of slurped.
pub const DEFAULT_STREAM_THRESHOLD: u64 = 2 * 1024 * 1024;

/// An opened source file.
#[derive(Debug)]
pub struct SourceText {
    path: PathBuf,
    inner: Inner,
}

#[derive(Debug)]
enum Inner {
    InMemory(String),
    Stream(BufReader<File>),
}

impl SourceText {
    /// Open `path`, choosing the buffering strategy from its size.
    ///
    /// Failing to open or stat the file is the only error here; it is the
    /// "source-open" failure that leaves a store not ready.
    pub fn open(path: &NormalizedPath, stream_threshold: u64) -> Result<Self> {
        let native = path.to_native();
        let file = File::open(&native).map_err(|e| Error::io(&native, e))?;
        let len = file.metadata().map_err(|e| Error::io(&native, e))?.len();

        let inner = if len > stream_threshold {
            tracing::debug!(path = %path, len, "streaming source");
            Inner::Stream(BufReader::new(file))
        } else {
            let mut bytes = Vec::with_capacity(len as usize);
            let mut reader = BufReader::new(file);
            reader
                .read_to_end(&mut bytes)
                .map_err(|e| Error::io(&native, e))?;
            Inner::InMemory(String::from_utf8_lossy(&bytes).into_owned())
        };

        Ok(Self {
            path: native,
            inner,
        })
    }

    /// Wrap text that is already in memory.
    pub fn from_text(name: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: name.into(),
            inner: Inner::InMemory(text.into()),
        }
    }

    /// Whether this source is being streamed.
    pub fn is_streamed(&self) -> bool {
        matches!(self.inner, Inner::Stream(_))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Feed every line to `f`, without its line terminator.
    pub fn for_each_line<F>(self, mut f: F) -> Result<()>
    where
        F: FnMut(&str),
    {
        match self.inner {
            Inner::InMemory(text) => {
                for line in text.lines() {
                    f(line);
                }
                Ok(())
            }
            Inner::Stream(mut reader) => {
                let mut buf = Vec::new();
                loop {
                    buf.clear();
                    let read = reader
                        .read_until(b'\n', &mut buf)
                        .map_err(|e| Error::io(&self.path, e))?;
                    if read == 0 {
                        return Ok(());
                    }
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.strip_suffix('\n').unwrap_or(&line);
                    let line = line.strip_suffix('\r').unwrap_or(line);
                    f(line);
                }
            }
        }
    }
}
