//! Record stores: the parsed records of one source.

use std::collections::BTreeMap;
use std::hash::Hash;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Order in which a store keeps its keys.
///
/// The key universe of a merge follows the same order, so this decides the
/// order of the merged output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyOrder {
    /// First-seen order.
    #[default]
    Insertion,
    /// Ascending key order.
    Sorted,
}

#[derive(Debug, Clone)]
enum Entries<K, V> {
    Insertion(IndexMap<K, V>),
    Sorted(BTreeMap<K, V>),
}

/// Keyed records read from one source.
///
/// `ready` is set by a successful [`load`](Self::load); `is_default` marks
/// the baseline source as opposed to an override.
#[derive(Debug, Clone)]
pub struct RecordStore<K, V> {
    name: String,
    ready: bool,
    is_default: bool,
    entries: Entries<K, V>,
}

impl<K, V> RecordStore<K, V>
where
    K: Clone + Eq + Hash + Ord,
{
    pub fn new(name: impl Into<String>, order: KeyOrder) -> Self {
        let entries = match order {
            KeyOrder::Insertion => Entries::Insertion(IndexMap::new()),
            KeyOrder::Sorted => Entries::Sorted(BTreeMap::new()),
        };
        Self {
            name: name.into(),
            ready: false,
            is_default: false,
            entries,
        }
    }

    pub fn insertion(name: impl Into<String>) -> Self {
        Self::new(name, KeyOrder::Insertion)
    }

    pub fn sorted(name: impl Into<String>) -> Self {
        Self::new(name, KeyOrder::Sorted)
    }

    /// Builder-style [`set_default`](Self::set_default).
    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn order(&self) -> KeyOrder {
        match self.entries {
            Entries::Insertion(_) => KeyOrder::Insertion,
            Entries::Sorted(_) => KeyOrder::Sorted,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Mark the store loaded without running a parser.
    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
    }

    /// Fill the store once.
    ///
    /// When the store is already ready the parser is not invoked. When the
    /// parser fails, anything it inserted is discarded and the store stays
    /// not ready.
    pub fn load<F, E>(&mut self, parser: F) -> std::result::Result<bool, E>
    where
        F: FnOnce(&mut Self) -> std::result::Result<(), E>,
    {
        if self.ready {
            tracing::trace!(store = %self.name, "store already loaded");
            return Ok(true);
        }
        match parser(self) {
            Ok(()) => {
                self.ready = true;
                Ok(true)
            }
            Err(err) => {
                self.clear();
                Err(err)
            }
        }
    }

    /// Drop every entry and reset `ready`.
    pub fn clear(&mut self) {
        match &mut self.entries {
            Entries::Insertion(map) => map.clear(),
            Entries::Sorted(map) => map.clear(),
        }
        self.ready = false;
    }

    /// Insert or replace an entry. A replaced key keeps its position.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match &mut self.entries {
            Entries::Insertion(map) => map.insert(key, value),
            Entries::Sorted(map) => map.insert(key, value),
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        match &self.entries {
            Entries::Insertion(map) => map.get(key),
            Entries::Sorted(map) => map.get(key),
        }
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        match &mut self.entries {
            Entries::Insertion(map) => map.get_mut(key),
            Entries::Sorted(map) => map.get_mut(key),
        }
    }

    /// Remove an entry, keeping the order of the others.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        match &mut self.entries {
            Entries::Insertion(map) => map.shift_remove(key),
            Entries::Sorted(map) => map.remove(key),
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        match &self.entries {
            Entries::Insertion(map) => map.len(),
            Entries::Sorted(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries in store order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        let (insertion, sorted) = match &self.entries {
            Entries::Insertion(map) => (Some(map.iter()), None),
            Entries::Sorted(map) => (None, Some(map.iter())),
        };
        insertion
            .into_iter()
            .flatten()
            .chain(sorted.into_iter().flatten())
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Stack `other` on top of this store: every entry of `other`
    /// overwrites or is appended, with no conflict analysis.
    pub fn force_merge(&mut self, other: &Self)
    where
        V: Clone,
    {
        for (key, value) in other.iter() {
            self.insert(key.clone(), value.clone());
        }
    }
}

impl<K, V> Extend<(K, V)> for RecordStore<K, V>
where
    K: Clone + Eq + Hash + Ord,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}
