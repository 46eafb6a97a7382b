//! Merge engine: loads stores for one record kind, resolves every key and
//! writes the survivors.

use std::collections::BTreeSet;
use std::io::Write;

use indexmap::IndexSet;
use serde::Serialize;
use strata_fs::{NormalizedPath, SourceText, checksum, io};
use strata_records::{ReadStats, Row, SectionedReader};
use tracing::{debug, trace};

use crate::dominance::{DominanceFlags, Resolution, resolve_detailed};
use crate::error::{Error, Result};
use crate::kind::{RecordKind, RowStore};
use crate::store::KeyOrder;
use crate::writer::{SectionWriter, WriteStats};

/// Surviving rows of one merge, in key-universe order.
#[derive(Debug, Clone)]
pub struct Merged<K> {
    pub rows: Vec<(K, Row)>,
    /// Keys that resolved to no value.
    pub removed: Vec<K>,
}

impl<K> Merged<K> {
    /// Number of keys that were resolved.
    pub fn keys(&self) -> usize {
        self.rows.len() + self.removed.len()
    }
}

/// Summary of one completed merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Record kind name.
    pub kind: String,
    /// Destination, when the merge was written to disk.
    pub output: Option<String>,
    /// Size of the key universe.
    pub keys: usize,
    /// Rows written.
    pub written: usize,
    /// Keys resolved to no value.
    pub removed: usize,
    /// Rows dropped because they failed to serialize.
    pub dropped: usize,
    /// Checksum of the merged text.
    pub checksum: String,
}

/// Merges layered sources of one record kind.
///
/// Stores are kept in the order they were added; that order is the scan
/// order of dominance resolution.
pub struct MergeEngine<K: RecordKind> {
    kind: K,
    stores: Vec<RowStore<K::Key>>,
}

impl<K: RecordKind> MergeEngine<K> {
    pub fn new(kind: K) -> Self {
        Self {
            kind,
            stores: Vec::new(),
        }
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    pub fn stores(&self) -> &[RowStore<K::Key>] {
        &self.stores
    }

    pub fn stores_mut(&mut self) -> &mut [RowStore<K::Key>] {
        &mut self.stores
    }

    /// Empty, not yet loaded store ordered the way this kind orders keys.
    pub fn new_store(&self, name: impl Into<String>, is_default: bool) -> RowStore<K::Key> {
        RowStore::new(name, self.kind.key_order()).with_default(is_default)
    }

    /// Append an already filled store.
    pub fn push_store(&mut self, store: RowStore<K::Key>) {
        self.stores.push(store);
    }

    /// Read the file at `path` into a new store.
    ///
    /// The store is appended even when the source cannot be read, so the
    /// scan order still matches the declaration order; it is then left not
    /// ready and takes no part in resolution.
    ///
    /// # Arguments
    ///
    /// * `name` - Store name used in logs and diagnostics
    /// * `path` - Source file
    /// * `is_default` - Whether this source is the unmodified baseline
    pub fn load_source(
        &mut self,
        name: impl Into<String>,
        path: &NormalizedPath,
        is_default: bool,
    ) -> Result<ReadStats> {
        let mut store = self.new_store(name, is_default);
        let threshold = self.kind.read_options().stream_threshold;
        let kind = &self.kind;

        let mut stats = ReadStats::default();
        let loaded = store.load(|store| {
            let source = SourceText::open(path, threshold)?;
            let mut reader = SectionedReader::new(kind.layout());
            stats = reader.read_source(source, |row| insert_row(kind, store, row))?;
            Ok::<(), strata_fs::Error>(())
        });

        if let Err(source) = loaded {
            debug!(store = store.name(), path = %path, %source, "source unavailable");
            self.stores.push(store);
            return Err(Error::SourceOpen {
                path: path.to_native(),
                source,
            });
        }

        debug!(
            store = store.name(),
            path = %path,
            accepted = stats.accepted,
            rejected = stats.rejected,
            keys = store.len(),
            "loaded source"
        );
        self.kind.after_read(&mut store);
        self.stores.push(store);
        Ok(stats)
    }

    /// Read in-memory text into a new store.
    pub fn load_text(
        &mut self,
        name: impl Into<String>,
        text: &str,
        is_default: bool,
    ) -> ReadStats {
        let mut store = self.new_store(name, is_default);
        let kind = &self.kind;

        let mut stats = ReadStats::default();
        let Ok(_) = store.load(|store| {
            let mut reader = SectionedReader::new(kind.layout());
            stats = reader.read_str(text, |row| insert_row(kind, store, row));
            Ok::<(), std::convert::Infallible>(())
        });

        self.kind.after_read(&mut store);
        self.stores.push(store);
        stats
    }

    /// Every key seen in any ready store, deduplicated, in the kind's key
    /// order.
    pub fn key_universe(&self) -> Vec<K::Key> {
        let ready = || {
            self.stores
                .iter()
                .filter(|store| store.is_ready())
                .flat_map(|store| store.keys())
        };
        match self.kind.key_order() {
            KeyOrder::Insertion => {
                let keys: IndexSet<&K::Key> = ready().collect();
                keys.into_iter().cloned().collect()
            }
            KeyOrder::Sorted => {
                let keys: BTreeSet<&K::Key> = ready().collect();
                keys.into_iter().cloned().collect()
            }
        }
    }

    /// Resolve a single key with the kind's flags for it.
    pub fn explain(&self, key: &K::Key) -> Resolution<'_, Row> {
        resolve_detailed(key, &self.stores, self.kind.flags(key))
    }

    /// Run the `before_merge` hook, then resolve every key with the kind's
    /// flags.
    pub fn merge(&mut self) -> Merged<K::Key> {
        self.kind.before_merge(&mut self.stores);
        self.merge_with(|key| self.kind.flags(key))
    }

    /// Resolve every key with flags chosen by `flags_for`.
    pub fn merge_with<F>(&self, flags_for: F) -> Merged<K::Key>
    where
        F: Fn(&K::Key) -> DominanceFlags,
    {
        let mut merged = Merged {
            rows: Vec::new(),
            removed: Vec::new(),
        };

        for key in self.key_universe() {
            let resolution = resolve_detailed(&key, &self.stores, flags_for(&key));
            match resolution.value() {
                Some(row) => merged.rows.push((key, row.clone())),
                None => {
                    trace!(?key, outcome = %resolution.outcome, "key removed");
                    merged.removed.push(key);
                }
            }
        }

        debug!(
            kind = self.kind.name(),
            survived = merged.rows.len(),
            removed = merged.removed.len(),
            "merged stores"
        );
        merged
    }

    /// Run the `before_write` hook and write `merged` to `out`.
    pub fn write_to<W: Write>(&self, mut merged: Merged<K::Key>, out: W) -> Result<WriteStats> {
        self.kind.before_write(&mut merged.rows);
        let mut writer = SectionWriter::new(self.kind.layout(), out, self.kind.write_options());
        writer.write_rows(merged.rows.iter().map(|(_, row)| row))?;
        Ok(writer.finish()?)
    }

    /// Merge and return the output text without touching the filesystem.
    pub fn render(&mut self) -> Result<(String, MergeReport)> {
        let (bytes, report) = self.produce()?;
        self.kind.after_merge(&report);
        Ok((String::from_utf8_lossy(&bytes).into_owned(), report))
    }

    /// Merge and atomically replace the file at `path` with the result.
    ///
    /// On failure the destination is left as it was.
    pub fn merge_to_path(&mut self, path: &NormalizedPath) -> Result<MergeReport> {
        let (bytes, mut report) = self.produce()?;
        io::write_atomic(path, &bytes).map_err(|source| Error::Destination {
            path: path.to_native(),
            source,
        })?;
        report.output = Some(path.as_str().to_string());

        debug!(
            kind = self.kind.name(),
            path = %path,
            written = report.written,
            "wrote merged output"
        );
        self.kind.after_merge(&report);
        Ok(report)
    }

    fn produce(&mut self) -> Result<(Vec<u8>, MergeReport)> {
        let merged = self.merge();
        let keys = merged.keys();
        let removed = merged.removed.len();

        let mut bytes = Vec::new();
        let stats = self.write_to(merged, &mut bytes)?;
        let report = MergeReport {
            kind: self.kind.name().to_string(),
            output: None,
            keys,
            written: stats.written,
            removed,
            dropped: stats.dropped,
            checksum: checksum::compute_checksum(&bytes),
        };
        Ok((bytes, report))
    }
}

fn insert_row<K: RecordKind>(kind: &K, store: &mut RowStore<K::Key>, row: Row) {
    match kind.key(&row) {
        Some(key) => {
            store.insert(key, row);
        }
        None => trace!(store = store.name(), "row has no key, skipping"),
    }
}
