//! The contract a record kind fulfils to be merged.

use std::fmt::Debug;
use std::hash::Hash;

use strata_records::{Layout, ReadOptions, Row};

use crate::dominance::DominanceFlags;
use crate::engine::MergeReport;
use crate::store::{KeyOrder, RecordStore};
use crate::writer::WriteOptions;

/// Store of section-tagged rows keyed by a kind's key type.
pub type RowStore<K> = RecordStore<K, Row>;

/// Everything the merge engine needs to know about one file kind.
///
/// Only [`name`](Self::name), [`layout`](Self::layout) and
/// [`key`](Self::key) are required. The hooks default to doing nothing;
/// the engine calls them at fixed points but owns none of their logic.
pub trait RecordKind {
    type Key: Clone + Eq + Hash + Ord + Debug;

    fn name(&self) -> &str;

    fn layout(&self) -> &Layout;

    /// Key identifying `row` across sources. Rows without a key are not
    /// stored.
    fn key(&self, row: &Row) -> Option<Self::Key>;

    fn key_order(&self) -> KeyOrder {
        KeyOrder::Insertion
    }

    /// Dominance policy for one key.
    fn flags(&self, _key: &Self::Key) -> DominanceFlags {
        DominanceFlags::empty()
    }

    fn read_options(&self) -> ReadOptions {
        ReadOptions::default()
    }

    fn write_options(&self) -> WriteOptions {
        WriteOptions::default()
    }

    /// Called on every freshly loaded store.
    fn after_read(&self, _store: &mut RowStore<Self::Key>) {}

    /// Called once with every store before keys are resolved.
    fn before_merge(&self, _stores: &mut [RowStore<Self::Key>]) {}

    /// Called with the surviving rows, in output order, before they are
    /// written.
    fn before_write(&self, _rows: &mut Vec<(Self::Key, Row)>) {}

    fn after_merge(&self, _report: &MergeReport) {}
}
