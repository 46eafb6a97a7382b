//! End-to-end merges through job files: config loading -> sectioned
//! reading -> dominance -> atomic write.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use strata_core::{Job, RecordKind};
use strata_fs::NormalizedPath;
use strata_test_utils::TestLayers;

const WEIGHTS_KIND: &str = r#"
[kind]
name = "weights"
key_order = "sorted"
flags = { remove_if_missing_from_one_custom = true }

[schema]
fields = ["word", "uint", "|", "hex"]
"#;

fn load(layers: &TestLayers, job: &str) -> Job {
    Job::load(&NormalizedPath::new(layers.path(job))).unwrap()
}

#[test]
fn streamed_and_in_memory_sources_merge_identically() {
    let base: String = (0..500).map(|i| format!("w{i:03} {i}\n")).collect();
    let tweaks: String = (0..500)
        .map(|i| {
            if i % 50 == 0 {
                format!("w{i:03} 9999\n")
            } else {
                format!("w{i:03} {i}\n")
            }
        })
        .collect();

    let render = |threshold: u64| {
        let mut layers = TestLayers::new();
        layers.add_default("base.txt", &base);
        layers.add_override("tweaks.txt", &tweaks);
        let kind = WEIGHTS_KIND.replace(
            "key_order = \"sorted\"",
            &format!("key_order = \"sorted\"\nstream_threshold = {threshold}"),
        );
        layers.write_job("job.toml", &kind, "out.txt");
        load(&layers, "job.toml").run().unwrap();
        layers.read("out.txt")
    };

    let streamed = render(0);
    let buffered = render(i64::MAX as u64);
    assert_eq!(streamed, buffered);
    assert!(streamed.contains("w050 9999\n"));
    assert_eq!(streamed.lines().count(), 500);
}

#[test]
fn crlf_sources_and_output() {
    let mut layers = TestLayers::new();
    layers.add_default("base.txt", "b 2\r\na 1 0x1F\r\n");
    layers.add_override("mod.txt", "a 1 0x20\r\nb 2\r\n");
    let kind = WEIGHTS_KIND.replace(
        "name = \"weights\"",
        "name = \"weights\"\nline_ending = \"crlf\"",
    );
    layers.write_job("job.toml", &kind, "out.txt");

    load(&layers, "job.toml").run().unwrap();
    assert_eq!(layers.read("out.txt"), "a 1 0x20\r\nb 2\r\n");
}

#[test]
fn merged_output_is_a_fixpoint() {
    let mut layers = TestLayers::new();
    layers.add_default("base.txt", "a 1\nb 2\nc 3\n");
    layers.add_override("one.txt", "a 5\nb 2\nc 3\n");
    layers.add_override("two.txt", "a 1\nb 7\nc 3\n");
    layers.write_job("job.toml", WEIGHTS_KIND, "out.txt");
    load(&layers, "job.toml").run().unwrap();
    let first = layers.read("out.txt");
    assert_eq!(first, "a 5\nb 7\nc 3\n");

    // merging the result over the same baseline reproduces it
    let mut again = TestLayers::new();
    again.add_default("base.txt", "a 1\nb 2\nc 3\n");
    again.add_override("merged.txt", &first);
    again.write_job("job.toml", WEIGHTS_KIND, "out.txt");
    load(&again, "job.toml").run().unwrap();
    assert_eq!(again.read("out.txt"), first);
}

#[test]
fn removed_keys_are_reported_and_absent() {
    let mut layers = TestLayers::new();
    layers.add_default("base.txt", "a 1\nb 2\n");
    layers.add_override("one.txt", "a 1\n");
    layers.add_override("two.txt", "a 1\nb 2\nc 3\n");
    layers.write_job("job.toml", WEIGHTS_KIND, "out.txt");

    let report = load(&layers, "job.toml").run().unwrap();
    assert_eq!(layers.read("out.txt"), "a 1\nc 3\n");
    assert_eq!(report.removed, 1);
    assert_eq!(report.keys, 3);
}

#[test]
fn rerunning_a_job_is_byte_identical() {
    let mut layers = TestLayers::new();
    layers.add_default("base.txt", "x 1\ny 2\n");
    layers.add_override("one.txt", "y 3\nx 1\nz 4\n");
    layers.write_job("job.toml", WEIGHTS_KIND, "out.txt");
    let job = load(&layers, "job.toml");

    let first = job.run().unwrap();
    let first_text = layers.read("out.txt");
    let second = job.run().unwrap();

    assert_eq!(first.checksum, second.checksum);
    assert_eq!(layers.read("out.txt"), first_text);
    assert_eq!(job.kind.name(), "weights");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn merge_is_deterministic_for_any_layering(
        base in proptest::collection::btree_map("[a-e]", 0u32..4, 1..5),
        overrides in proptest::collection::vec(
            proptest::collection::btree_map("[a-e]", 0u32..4, 0..5),
            1..4,
        ),
    ) {
        let mut layers = TestLayers::new();
        let text = |entries: &std::collections::BTreeMap<String, u32>| {
            entries.iter().map(|(k, v)| format!("{k} {v}\n")).collect::<String>()
        };
        layers.add_default("base.txt", &text(&base));
        for (index, entries) in overrides.iter().enumerate() {
            layers.add_override(&format!("mod{index}.txt"), &text(entries));
        }
        layers.write_job("job.toml", WEIGHTS_KIND, "out.txt");
        let job = load(&layers, "job.toml");

        let mut first = job.load_engine().unwrap();
        let mut second = job.load_engine().unwrap();
        prop_assert_eq!(first.render().unwrap(), second.render().unwrap());
    }
}
