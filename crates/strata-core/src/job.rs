//! Merge jobs declared in a config file.
//!
//! A job names one record kind, its layout and dominance policy, the
//! ordered sources to merge and the output file:
//!
//! ```toml
//! output = "merged/items.txt"
//!
//! [kind]
//! name = "items"
//! sectioning = "block"
//! flags = { remove_if_missing_from_one_custom = true }
//!
//! [[sections]]
//! name = "ITEMS"
//! fields = ["word", "int", "|", "float"]
//!
//! [[sources]]
//! path = "base/items.txt"
//! default = true
//!
//! [[sources]]
//! path = "mods/tweaks/items.txt"
//! ```
//!
//! Field types are `int`, `uint`, `float`, `hex`, `word`, `bool` and
//! `skip`; `|` separates required fields from optional ones. Relative paths
//! are resolved against the directory holding the job file.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strata_fs::{DEFAULT_STREAM_THRESHOLD, NormalizedPath, load_config};
use strata_records::{
    FieldRegistry, FieldType, Layout, ReadOptions, Row, Schema, SectionId, Sectioning, Value,
};
use tracing::debug;

use crate::dominance::DominanceFlags;
use crate::engine::{MergeEngine, MergeReport};
use crate::error::{Error, Result};
use crate::kind::RecordKind;
use crate::store::KeyOrder;
use crate::writer::{LineEnding, WriteOptions};

/// Marker separating required from optional fields in a field list.
pub const OPTIONAL_MARKER: &str = "|";

/// Raw job file contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    pub kind: KindConfig,

    /// Schema for lines outside any section, and for sections declared
    /// without fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<SectionConfig>,

    pub sources: Vec<SourceConfig>,

    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KindConfig {
    pub name: String,

    #[serde(default)]
    pub sectioning: SectioningConfig,

    /// Fixed classification width for per-line sections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_width: Option<usize>,

    #[serde(default)]
    pub key_order: KeyOrder,

    #[serde(default)]
    pub line_ending: LineEnding,

    /// Dominance policy for keys whose section sets none.
    #[serde(default)]
    pub flags: FlagsConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_threshold: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectioningConfig {
    #[default]
    None,
    Block,
    PerLine,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    pub fields: Vec<String>,

    /// Slot indices forming the record key. Defaults to the first slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Vec<usize>>,

    #[serde(default)]
    pub trailing_separator: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionConfig {
    pub name: String,

    /// Field list; when absent the section reads rows with the job's
    /// fallback schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Vec<usize>>,

    #[serde(default)]
    pub trailing_separator: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<FlagsConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlagsConfig {
    #[serde(default)]
    pub remove_if_missing_from_one_custom: bool,
    #[serde(default)]
    pub remove_if_missing_from_all_custom: bool,
}

impl From<FlagsConfig> for DominanceFlags {
    fn from(config: FlagsConfig) -> Self {
        let mut flags = DominanceFlags::empty();
        flags.set(
            DominanceFlags::REMOVE_IF_MISSING_FROM_ONE_CUSTOM_BUT_PRESENT_IN_DEFAULT,
            config.remove_if_missing_from_one_custom,
        );
        flags.set(
            DominanceFlags::REMOVE_IF_MISSING_FROM_ALL_CUSTOM,
            config.remove_if_missing_from_all_custom,
        );
        flags
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub default: bool,
}

/// Key of a row in a declared kind: its section plus the typed key fields.
///
/// Ordering compares the section first, then each field by value, so a
/// sorted kind keyed on an `int` slot lists `2` before `10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey {
    pub section: Option<SectionId>,
    pub fields: Vec<KeyField>,
}

impl RowKey {
    pub fn new<I, V>(section: Option<SectionId>, fields: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            section,
            fields: fields.into_iter().map(|v| KeyField(v.into())).collect(),
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, field) in self.fields.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{field}")?;
        }
        Ok(())
    }
}

/// One key field with a total order.
///
/// Numbers compare numerically, floats by `total_cmp` and words
/// lexically. Values of different types order by type.
#[derive(Debug, Clone)]
pub struct KeyField(pub Value);

impl KeyField {
    pub fn value(&self) -> &Value {
        &self.0
    }

    fn rank(&self) -> u8 {
        match self.0 {
            Value::Int(_) => 0,
            Value::Uint(_) => 1,
            Value::Hex(_) => 2,
            Value::Float(_) => 3,
            Value::Bool(_) => 4,
            Value::Word(_) => 5,
        }
    }
}

impl Ord for KeyField {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.0, &other.0) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Uint(a), Value::Uint(b)) | (Value::Hex(a), Value::Hex(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Word(a), Value::Word(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for KeyField {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for KeyField {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyField {}

impl Hash for KeyField {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match &self.0 {
            Value::Int(v) => v.hash(state),
            Value::Uint(v) | Value::Hex(v) => v.hash(state),
            // total_cmp equality is bit equality
            Value::Float(v) => v.to_bits().hash(state),
            Value::Bool(v) => v.hash(state),
            Value::Word(v) => v.hash(state),
        }
    }
}

impl fmt::Display for KeyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A record kind built from a [`JobConfig`].
#[derive(Debug, Clone)]
pub struct DeclaredKind {
    name: String,
    layout: Layout,
    key_order: KeyOrder,
    flags: DominanceFlags,
    fallback_key: Vec<usize>,
    section_keys: Vec<Option<Vec<usize>>>,
    section_flags: Vec<Option<DominanceFlags>>,
    read_options: ReadOptions,
    write_options: WriteOptions,
}

impl DeclaredKind {
    pub fn from_config(config: &JobConfig, registry: &FieldRegistry) -> Result<Self> {
        let kind = &config.kind;
        let sectioning = match kind.sectioning {
            SectioningConfig::None => Sectioning::None,
            SectioningConfig::Block => Sectioning::Block,
            SectioningConfig::PerLine => Sectioning::PerLine {
                width: kind.prefix_width,
            },
        };

        if sectioning == Sectioning::None && !config.sections.is_empty() {
            return Err(Error::invalid_job(format!(
                "kind {} declares sections but no sectioning mode",
                kind.name
            )));
        }
        if sectioning != Sectioning::None && config.sections.is_empty() {
            return Err(Error::invalid_job(format!(
                "kind {} is sectioned but declares no sections",
                kind.name
            )));
        }

        let mut builder = Layout::builder(sectioning);
        let mut fallback_key = Vec::new();
        if let Some(schema_config) = &config.schema {
            let schema =
                build_schema(registry, &schema_config.fields, schema_config.trailing_separator)?;
            fallback_key = schema_config.key.clone().unwrap_or_else(|| vec![0]);
            check_key(&kind.name, "fallback schema", &schema, &fallback_key)?;
            builder = builder.fallback(schema);
        }

        let mut section_keys = Vec::with_capacity(config.sections.len());
        let mut section_flags = Vec::with_capacity(config.sections.len());
        for section in &config.sections {
            match &section.fields {
                Some(fields) => {
                    let schema = build_schema(registry, fields, section.trailing_separator)?;
                    let key = section.key.clone().unwrap_or_else(|| vec![0]);
                    check_key(&kind.name, &section.name, &schema, &key)?;
                    builder = builder.section(section.name.clone(), schema)?;
                    section_keys.push(Some(key));
                }
                None => {
                    if config.schema.is_none() {
                        return Err(Error::invalid_job(format!(
                            "section {} has no fields and kind {} has no fallback schema",
                            section.name, kind.name
                        )));
                    }
                    if section.key.is_some() {
                        return Err(Error::invalid_job(format!(
                            "section {} sets a key but no fields",
                            section.name
                        )));
                    }
                    builder = builder.bare_section(section.name.clone())?;
                    section_keys.push(None);
                }
            }
            section_flags.push(section.flags.map(DominanceFlags::from));
        }

        let layout = builder.build();
        if layout.schemas().next().is_none() {
            return Err(Error::invalid_job(format!("kind {} declares no schema", kind.name)));
        }

        Ok(Self {
            name: kind.name.clone(),
            layout,
            key_order: kind.key_order,
            flags: kind.flags.into(),
            fallback_key,
            section_keys,
            section_flags,
            read_options: ReadOptions {
                stream_threshold: kind.stream_threshold.unwrap_or(DEFAULT_STREAM_THRESHOLD),
            },
            write_options: WriteOptions {
                line_ending: kind.line_ending,
            },
        })
    }

    fn key_fields(&self, section: Option<SectionId>) -> &[usize] {
        section
            .and_then(|id| self.section_keys.get(id.0))
            .and_then(Option::as_deref)
            .unwrap_or(self.fallback_key.as_slice())
    }

    /// Parse a key written the way it appears in a data line.
    pub fn parse_key(&self, section: Option<&str>, tokens: &str) -> Result<RowKey> {
        let section = match section {
            Some(name) => {
                let found = self.layout.sections().by_name(name).ok_or_else(|| {
                    strata_records::Error::UnknownSection {
                        name: name.to_string(),
                    }
                })?;
                Some(found.id())
            }
            None if matches!(self.layout.sectioning(), Sectioning::PerLine { .. }) => {
                self.layout.classify(tokens)
            }
            None => None,
        };
        let row = self.layout.parse_row(section, tokens)?;
        self.key(&row).ok_or_else(|| {
            Error::invalid_job(format!("{tokens:?} does not fill the key fields of {}", self.name))
        })
    }

    pub fn section_name(&self, key: &RowKey) -> Option<&str> {
        key.section.and_then(|id| self.layout.sections().name(id))
    }
}

impl RecordKind for DeclaredKind {
    type Key = RowKey;

    fn name(&self) -> &str {
        &self.name
    }

    fn layout(&self) -> &Layout {
        &self.layout
    }

    fn key(&self, row: &Row) -> Option<RowKey> {
        let fields = self
            .key_fields(row.section)
            .iter()
            .map(|&index| {
                if row.record.is_present(index) {
                    row.record.get(index).cloned().map(KeyField)
                } else {
                    None
                }
            })
            .collect::<Option<Vec<_>>>()?;
        Some(RowKey {
            section: row.section,
            fields,
        })
    }

    fn key_order(&self) -> KeyOrder {
        self.key_order
    }

    fn flags(&self, key: &RowKey) -> DominanceFlags {
        key.section
            .and_then(|id| self.section_flags.get(id.0).copied().flatten())
            .unwrap_or(self.flags)
    }

    fn read_options(&self) -> ReadOptions {
        self.read_options
    }

    fn write_options(&self) -> WriteOptions {
        self.write_options
    }
}

fn build_schema(
    registry: &FieldRegistry,
    fields: &[String],
    trailing_separator: bool,
) -> Result<Arc<Schema>> {
    let mut builder = Schema::builder(registry);
    for field in fields {
        builder = if field.trim() == OPTIONAL_MARKER {
            builder.optional()
        } else {
            builder.field(field.parse::<FieldType>()?)
        };
    }
    Ok(builder.trailing_separator(trailing_separator).build()?)
}

fn check_key(kind: &str, owner: &str, schema: &Schema, key: &[usize]) -> Result<()> {
    if key.is_empty() {
        return Err(Error::invalid_job(format!("{kind}/{owner}: key is empty")));
    }
    for &index in key {
        if index >= schema.len() || !schema.is_required(index) || schema.slot(index).ignore {
            return Err(Error::invalid_job(format!(
                "{kind}/{owner}: key slot {index} is not a required field"
            )));
        }
    }
    Ok(())
}

/// One source of a loaded job, with its path resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSource {
    pub name: String,
    pub path: NormalizedPath,
    pub is_default: bool,
}

/// A validated merge job.
#[derive(Debug, Clone)]
pub struct Job {
    pub kind: DeclaredKind,
    pub sources: Vec<JobSource>,
    pub output: NormalizedPath,
}

impl Job {
    /// Load and validate the job file at `path`.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        let config: JobConfig = load_config(path)?;
        let base = path.parent().unwrap_or_else(|| NormalizedPath::new("."));
        debug!(job = %path, kind = %config.kind.name, "loaded job file");
        Self::from_config(&config, &base, &FieldRegistry::standard())
    }

    /// Build a job from parsed config, resolving relative paths against
    /// `base`.
    pub fn from_config(
        config: &JobConfig,
        base: &NormalizedPath,
        registry: &FieldRegistry,
    ) -> Result<Self> {
        if config.sources.is_empty() {
            return Err(Error::invalid_job("job declares no sources"));
        }
        let defaults = config.sources.iter().filter(|s| s.default).count();
        if defaults > 1 {
            return Err(Error::invalid_job(format!(
                "job declares {defaults} default sources; at most one is allowed"
            )));
        }

        let kind = DeclaredKind::from_config(config, registry)?;
        let sources = config
            .sources
            .iter()
            .map(|source| {
                let path = base.join(&source.path);
                JobSource {
                    name: source
                        .name
                        .clone()
                        .unwrap_or_else(|| source.path.clone()),
                    path,
                    is_default: source.default,
                }
            })
            .collect();

        Ok(Self {
            kind,
            sources,
            output: base.join(&config.output),
        })
    }

    pub fn kind_name(&self) -> &str {
        &self.kind.name
    }

    /// Engine for this job with no sources loaded.
    pub fn engine(&self) -> MergeEngine<DeclaredKind> {
        MergeEngine::new(self.kind.clone())
    }

    /// Engine with every source loaded. Fails on the first unreadable
    /// source.
    pub fn load_engine(&self) -> Result<MergeEngine<DeclaredKind>> {
        let mut engine = self.engine();
        for source in &self.sources {
            engine.load_source(source.name.clone(), &source.path, source.is_default)?;
        }
        Ok(engine)
    }

    /// Load every source and write the merged output.
    pub fn run(&self) -> Result<MergeReport> {
        self.load_engine()?.merge_to_path(&self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_text: &str) -> JobConfig {
        toml::from_str(toml_text).unwrap()
    }

    const ITEMS_JOB: &str = r#"
        output = "out/items.txt"

        [kind]
        name = "items"
        sectioning = "block"

        [[sections]]
        name = "ITEMS"
        fields = ["word", "int", "|", "float"]

        [[sections]]
        name = "RECIPES"
        fields = ["word", "word", "int"]
        key = [0, 1]
        flags = { remove_if_missing_from_all_custom = true }

        [[sources]]
        path = "base.txt"
        default = true

        [[sources]]
        path = "/abs/mod.txt"
        name = "mod"
    "#;

    #[test]
    fn builds_job_with_resolved_paths() {
        let job = Job::from_config(
            &parse(ITEMS_JOB),
            &NormalizedPath::new("/data/jobs"),
            &FieldRegistry::standard(),
        )
        .unwrap();

        assert_eq!(job.output.as_str(), "/data/jobs/out/items.txt");
        assert_eq!(job.sources[0].path.as_str(), "/data/jobs/base.txt");
        assert_eq!(job.sources[0].name, "base.txt");
        assert!(job.sources[0].is_default);
        assert_eq!(job.sources[1].path.as_str(), "/abs/mod.txt");
        assert_eq!(job.sources[1].name, "mod");
    }

    #[test]
    fn key_uses_section_key_fields() {
        let job = Job::from_config(
            &parse(ITEMS_JOB),
            &NormalizedPath::new("/data"),
            &FieldRegistry::standard(),
        )
        .unwrap();
        let kind = &job.kind;

        let item = kind.layout().parse_row(Some(SectionId(0)), "sword 10 2.5").unwrap();
        assert_eq!(kind.key(&item), Some(RowKey::new(Some(SectionId(0)), ["sword"])));

        let recipe = kind.layout().parse_row(Some(SectionId(1)), "iron sword 3").unwrap();
        assert_eq!(
            kind.key(&recipe),
            Some(RowKey::new(Some(SectionId(1)), ["iron", "sword"]))
        );
    }

    #[test]
    fn section_flags_override_kind_flags() {
        let job = Job::from_config(
            &parse(ITEMS_JOB),
            &NormalizedPath::new("/data"),
            &FieldRegistry::standard(),
        )
        .unwrap();

        let item = RowKey::new(Some(SectionId(0)), ["sword"]);
        let recipe = RowKey::new(Some(SectionId(1)), ["iron", "sword"]);
        assert_eq!(job.kind.flags(&item), DominanceFlags::empty());
        assert_eq!(
            job.kind.flags(&recipe),
            DominanceFlags::REMOVE_IF_MISSING_FROM_ALL_CUSTOM
        );
    }

    #[test]
    fn parse_key_reads_tokens_in_named_section() {
        let job = Job::from_config(
            &parse(ITEMS_JOB),
            &NormalizedPath::new("/data"),
            &FieldRegistry::standard(),
        )
        .unwrap();

        let key = job.kind.parse_key(Some("recipes"), "iron sword 0").unwrap();
        assert_eq!(key, RowKey::new(Some(SectionId(1)), ["iron", "sword"]));
        assert_eq!(job.kind.section_name(&key), Some("RECIPES"));
        assert!(job.kind.parse_key(Some("nope"), "x").is_err());
    }

    #[test]
    fn key_fields_order_by_value() {
        let key = |v: Value| RowKey::new(None, [v]);
        assert!(key(Value::Int(2)) < key(Value::Int(10)));
        assert!(key(Value::Hex(0xf)) < key(Value::Hex(0x10)));
        assert!(key(Value::Float(-0.5)) < key(Value::Float(0.25)));
        assert!(key("Zed".into()) < key("axe".into()));
        assert_eq!(key(Value::Uint(7)).to_string(), "7");
        assert_ne!(key(Value::Int(7)), key(Value::Uint(7)));
    }

    #[test]
    fn rejects_two_default_sources() {
        let mut config = parse(ITEMS_JOB);
        config.sources[1].default = true;
        let err = Job::from_config(&config, &NormalizedPath::new("/"), &FieldRegistry::standard())
            .unwrap_err();
        assert!(err.to_string().contains("2 default sources"));
    }

    #[test]
    fn rejects_key_on_optional_slot() {
        let mut config = parse(ITEMS_JOB);
        config.sections[0].key = Some(vec![2]);
        let err = Job::from_config(&config, &NormalizedPath::new("/"), &FieldRegistry::standard())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidJob { .. }));
    }

    #[test]
    fn rejects_unknown_field_type() {
        let mut config = parse(ITEMS_JOB);
        config.sections[0].fields = Some(vec!["word".into(), "money".into()]);
        let err = Job::from_config(&config, &NormalizedPath::new("/"), &FieldRegistry::standard())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Records(strata_records::Error::UnknownFieldType { .. })
        ));
    }

    #[test]
    fn bare_section_needs_fallback_schema() {
        let config = parse(
            r#"
            output = "out.txt"
            [kind]
            name = "flags"
            sectioning = "block"
            [[sections]]
            name = "FLAGS"
            [[sources]]
            path = "a.txt"
            "#,
        );
        let err = Job::from_config(&config, &NormalizedPath::new("/"), &FieldRegistry::standard())
            .unwrap_err();
        assert!(err.to_string().contains("no fallback schema"));
    }

    #[test]
    fn flat_job_uses_fallback_schema() {
        let config = parse(
            r#"
            output = "out.txt"
            [kind]
            name = "weights"
            key_order = "sorted"
            line_ending = "crlf"
            flags = { remove_if_missing_from_one_custom = true }
            [schema]
            fields = ["uint", "skip", "float"]
            [[sources]]
            path = "a.txt"
            "#,
        );
        let job = Job::from_config(&config, &NormalizedPath::new("/"), &FieldRegistry::standard())
            .unwrap();

        assert_eq!(job.kind.key_order(), KeyOrder::Sorted);
        assert_eq!(job.kind.write_options().line_ending, LineEnding::CrLf);
        let row = job.kind.layout().parse_row(None, "7 1.5").unwrap();
        assert_eq!(job.kind.key(&row), Some(RowKey::new(None, [Value::Uint(7)])));
        assert_eq!(
            job.kind.flags(&RowKey::new(None, [Value::Uint(7)])),
            DominanceFlags::REMOVE_IF_MISSING_FROM_ONE_CUSTOM_BUT_PRESENT_IN_DEFAULT
        );
    }

    #[test]
    fn sections_without_sectioning_are_rejected() {
        let mut config = parse(ITEMS_JOB);
        config.kind.sectioning = SectioningConfig::None;
        assert!(
            Job::from_config(&config, &NormalizedPath::new("/"), &FieldRegistry::standard())
                .is_err()
        );
    }
}
