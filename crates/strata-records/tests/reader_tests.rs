//! Integration tests for the sectioned reader.

use std::io::Cursor;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use strata_records::{
    FieldRegistry, FieldType, Layout, ReadStats, Row, Schema, SectionId, SectionedReader,
    Sectioning, Value,
};

fn schema(fields: &[FieldType]) -> Arc<Schema> {
    Schema::builder(&FieldRegistry::standard())
        .fields(fields.iter().copied())
        .build()
        .unwrap()
}

fn block_layout() -> Layout {
    Layout::builder(Sectioning::Block)
        .section("ITEMS", schema(&[FieldType::Word, FieldType::Int]))
        .unwrap()
        .section("SPAWNS", schema(&[FieldType::Word, FieldType::Float, FieldType::Float]))
        .unwrap()
        .build()
}

fn read(layout: &Layout, text: &str) -> (Vec<Row>, ReadStats) {
    let mut rows = Vec::new();
    let stats = SectionedReader::new(layout).read_str(text, |row| rows.push(row));
    (rows, stats)
}

#[test]
fn block_mode_assigns_open_section() {
    let text = "\
# items first
ITEMS
sword 10
axe, 12   ; trailing comment
end

spawns
goblin 1.5 2
END
";
    let (rows, stats) = read(&block_layout(), text);

    assert_eq!(
        rows.iter().map(|r| r.section).collect::<Vec<_>>(),
        vec![Some(SectionId(0)), Some(SectionId(0)), Some(SectionId(1))]
    );
    assert_eq!(rows[1].record.get(1), Some(&Value::Int(12)));
    assert_eq!(rows[2].record.get(2), Some(&Value::Float(2.0)));
    assert_eq!(
        stats,
        ReadStats {
            lines: 9,
            accepted: 3,
            rejected: 0,
            skipped: 0
        }
    );
}

#[test]
fn block_mode_skips_lines_outside_sections_without_fallback() {
    let (rows, stats) = read(&block_layout(), "stray 1\nITEMS\nsword 1\nend\nstray 2\n");
    assert_eq!(rows.len(), 1);
    assert_eq!(stats.skipped, 2);
}

#[test]
fn block_mode_uses_fallback_outside_sections() {
    let layout = Layout::builder(Sectioning::Block)
        .section("ITEMS", schema(&[FieldType::Word, FieldType::Int]))
        .unwrap()
        .fallback(schema(&[FieldType::Word]))
        .build();
    let (rows, _) = read(&layout, "header\nITEMS\nsword 1\nend\nfooter\n");

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].section, None);
    assert_eq!(rows[2].section, None);
}

#[test]
fn opening_a_section_switches_without_end() {
    let (rows, _) = read(&block_layout(), "ITEMS\nsword 1\nSPAWNS\norc 1 1\n");
    assert_eq!(rows[0].section, Some(SectionId(0)));
    assert_eq!(rows[1].section, Some(SectionId(1)));
}

#[test]
fn malformed_lines_are_dropped_and_counted() {
    let (rows, stats) = read(&block_layout(), "ITEMS\nsword ten\nsword 10\naxe\nend\n");
    assert_eq!(rows.len(), 1);
    assert_eq!(stats.rejected, 2);
    assert_eq!(stats.accepted, 1);
}

#[test]
fn per_line_mode_classifies_each_line() {
    let layout = Layout::builder(Sectioning::PerLine { width: None })
        .section("MAP", schema(&[FieldType::Word, FieldType::Int]))
        .unwrap()
        .section("MUSIC", schema(&[FieldType::Word, FieldType::Word]))
        .unwrap()
        .build();
    let (rows, stats) = read(&layout, "MAP 3\nmusic track01\nMAP x\nunknown 1\n");

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].section, Some(SectionId(0)));
    assert_eq!(rows[1].section, Some(SectionId(1)));
    assert_eq!(rows[1].record.get(0), Some(&Value::Word("music".into())));
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.skipped, 1);
}

#[test]
fn per_line_mode_treats_end_as_data() {
    let layout = Layout::builder(Sectioning::PerLine { width: None })
        .fallback(schema(&[FieldType::Word]))
        .build();
    let (rows, _) = read(&layout, "end\n");
    assert_eq!(rows.len(), 1);
}

#[test]
fn flat_layout_reads_every_line() {
    let layout = Layout::flat(schema(&[FieldType::Int, FieldType::Hex]));
    let (rows, stats) = read(&layout, "1 0x10\n2,ff\n\n3\n");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].record.get(1), Some(&Value::Hex(0xff)));
    assert_eq!(stats.rejected, 1);
}

#[test]
fn read_buf_matches_read_str() {
    let text = "ITEMS\nsword 1\naxe 2\nend\n";
    let layout = block_layout();
    let (expected, _) = read(&layout, text);

    let mut rows = Vec::new();
    SectionedReader::new(&layout)
        .read_buf(Cursor::new(text), |row| rows.push(row))
        .unwrap();
    assert_eq!(rows, expected);
}

#[test]
fn read_source_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("items.txt");
    std::fs::write(&path, "ITEMS\r\nsword 1\r\nend\r\n").unwrap();

    let layout = block_layout();
    let source =
        strata_fs::SourceText::open(&strata_fs::NormalizedPath::new(&path), 0).unwrap();
    let mut rows = Vec::new();
    let stats = SectionedReader::new(&layout)
        .read_source(source, |row| rows.push(row))
        .unwrap();

    assert_eq!(stats.accepted, 1);
    assert_eq!(rows[0].record.serialize().unwrap(), "sword 1");
}
