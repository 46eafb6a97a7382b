//! Scenarios driving the engine with a record kind written in code,
//! including the collaborator hooks.

use pretty_assertions::assert_eq;
use strata_core::{DominanceFlags, MergeEngine, RecordKind, RowStore};
use strata_fs::NormalizedPath;
use strata_records::{FieldRegistry, FieldType, Layout, Row, Schema, Sectioning, Value};
use strata_test_utils::TestLayers;

/// Per-line spawn table: `MONxx name weight` and `BOSxx name`, classified by
/// their first three characters.
struct Spawns {
    layout: Layout,
}

impl Spawns {
    fn new() -> Self {
        let registry = FieldRegistry::standard();
        let monster = Schema::builder(&registry)
            .fields([FieldType::Word, FieldType::Word, FieldType::Int])
            .build()
            .unwrap();
        let boss = Schema::builder(&registry)
            .fields([FieldType::Word, FieldType::Word])
            .build()
            .unwrap();
        let layout = Layout::builder(Sectioning::PerLine { width: Some(3) })
            .section("MON", monster)
            .unwrap()
            .section("BOS", boss)
            .unwrap()
            .build();
        Self { layout }
    }
}

impl RecordKind for Spawns {
    type Key = (usize, String);

    fn name(&self) -> &str {
        "spawns"
    }

    fn layout(&self) -> &Layout {
        &self.layout
    }

    fn key(&self, row: &Row) -> Option<Self::Key> {
        Some((row.section?.0, row.record.get(1)?.to_string()))
    }

    fn flags(&self, key: &Self::Key) -> DominanceFlags {
        if key.0 == 1 {
            DominanceFlags::REMOVE_IF_MISSING_FROM_ALL_CUSTOM
        } else {
            DominanceFlags::empty()
        }
    }

    /// Zero-weight monsters mean "disabled"; drop them on read.
    fn after_read(&self, store: &mut RowStore<Self::Key>) {
        let disabled: Vec<_> = store
            .iter()
            .filter(|(key, row)| key.0 == 0 && row.record.get(2).and_then(Value::as_int) == Some(0))
            .map(|(key, _)| key.clone())
            .collect();
        for key in disabled {
            store.remove(&key);
        }
    }

    /// Bosses first, then monsters by name.
    fn before_write(&self, rows: &mut Vec<(Self::Key, Row)>) {
        rows.sort_by(|(a, _), (b, _)| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    }
}

#[test]
fn hooks_shape_the_merged_table() {
    let mut layers = TestLayers::new();
    let base = layers.add_default(
        "base/spawns.txt",
        "MON01 orc 5\nMON02 goblin 10\nBOS01 dragon\nMON03 rat 0\n",
    );
    let tweak = layers.add_override(
        "mods/a/spawns.txt",
        "MON02 goblin 25 ; doubled\nMON01 orc 0\nBOS01 dragon\nBOS02 lich\n",
    );
    let out = layers.path("out/spawns.txt");

    let mut engine = MergeEngine::new(Spawns::new());
    engine
        .load_source("base", &NormalizedPath::new(&base), true)
        .unwrap();
    engine
        .load_source("tweak", &NormalizedPath::new(&tweak), false)
        .unwrap();

    let report = engine.merge_to_path(&NormalizedPath::new(&out)).unwrap();

    // orc: the only override disables it, so the default row wins alone
    assert_eq!(
        layers.read("out/spawns.txt"),
        "BOS01 dragon\nBOS02 lich\nMON02 goblin 25\nMON01 orc 5\n"
    );
    assert_eq!(report.written, 4);
    assert_eq!(report.removed, 0);
}

#[test]
fn boss_removed_when_any_override_omits_it() {
    let mut engine = MergeEngine::new(Spawns::new());
    engine.load_text("base", "BOS01 dragon\nBOS02 lich\n", true);
    engine.load_text("a", "BOS01 dragon\n", false);
    engine.load_text("b", "BOS01 dragon\nBOS02 lich\n", false);

    let merged = engine.merge();
    let kept: Vec<_> = merged.rows.iter().map(|(key, _)| key.1.as_str()).collect();
    assert_eq!(kept, vec!["dragon"]);
    assert_eq!(merged.removed, vec![(1, "lich".to_string())]);
}

#[test]
fn unclassified_lines_are_skipped() {
    let mut engine = MergeEngine::new(Spawns::new());
    let stats = engine.load_text("base", "XYZ01 nothing\nMON01 orc 5\nMONSTER\n", true);

    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.rejected, 1);
}
