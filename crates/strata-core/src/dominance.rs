//! Dominance resolution: choosing one value per key across layered stores.
//!
//! Stores are scanned in argument order. Equal values collapse into one
//! bucket that counts how many stores carry it and whether the default
//! store is among them. The winning bucket is chosen by three rules, in
//! order:
//!
//! 1. a bucket seen in the default store loses to any bucket that was not,
//! 2. a bucket carried by fewer stores beats one carried by more,
//! 3. the bucket encountered first wins the remaining ties.
//!
//! [`DominanceFlags`] can turn a key into "no value" before selection runs.

use std::fmt;
use std::hash::Hash;

use bitflags::bitflags;
use serde::Serialize;
use tracing::trace;

use crate::store::RecordStore;

bitflags! {
    /// Removal policies applied before a winner is selected.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DominanceFlags: u8 {
        /// Drop a key the default store has when any custom store lacks it.
        const REMOVE_IF_MISSING_FROM_ONE_CUSTOM_BUT_PRESENT_IN_DEFAULT = 0b0000_0001;
        /// Drop a key as soon as a ready custom store is found without it.
        const REMOVE_IF_MISSING_FROM_ALL_CUSTOM = 0b0000_0010;
    }
}

/// One distinct value seen while scanning the stores for a key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket<'s, V> {
    pub value: &'s V,
    /// Number of ready stores carrying this value.
    pub count: usize,
    pub seen_in_default: bool,
    /// Argument position of the first store carrying this value.
    pub first_store: usize,
}

/// How a resolution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A bucket was selected.
    Winner,
    /// No ready store carries the key.
    NoCandidates,
    /// A ready custom store lacks the key and
    /// [`DominanceFlags::REMOVE_IF_MISSING_FROM_ALL_CUSTOM`] is set.
    RemovedMissingFromCustom,
    /// The key is in the default store, a custom store lacks it, and
    /// [`DominanceFlags::REMOVE_IF_MISSING_FROM_ONE_CUSTOM_BUT_PRESENT_IN_DEFAULT`]
    /// is set.
    RemovedMissingFromOneCustom,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Winner => "winner",
            Self::NoCandidates => "no candidates",
            Self::RemovedMissingFromCustom => "removed: missing from a custom store",
            Self::RemovedMissingFromOneCustom => {
                "removed: missing from a custom store but present in default"
            }
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full result of resolving one key.
#[derive(Debug, Clone)]
pub struct Resolution<'s, V> {
    /// Buckets in first-seen order. Empty when the scan exited early.
    pub buckets: Vec<Bucket<'s, V>>,
    /// Index into `buckets` of the winner.
    pub winner: Option<usize>,
    pub outcome: Outcome,
}

impl<'s, V> Resolution<'s, V> {
    fn removed(buckets: Vec<Bucket<'s, V>>, outcome: Outcome) -> Self {
        Self {
            buckets,
            winner: None,
            outcome,
        }
    }

    /// The winning value, if any.
    pub fn value(&self) -> Option<&'s V> {
        self.winner.map(|index| self.buckets[index].value)
    }

    pub fn winning_bucket(&self) -> Option<&Bucket<'s, V>> {
        self.winner.map(|index| &self.buckets[index])
    }
}

/// Resolve `key` across `stores`, returning only the winning value.
pub fn resolve<'s, K, V, I>(key: &K, stores: I, flags: DominanceFlags) -> Option<&'s V>
where
    K: Clone + Eq + Hash + Ord + 's,
    V: PartialEq + 's,
    I: IntoIterator<Item = &'s RecordStore<K, V>>,
{
    resolve_detailed(key, stores, flags).value()
}

/// Resolve `key` across `stores`, keeping every bucket for inspection.
pub fn resolve_detailed<'s, K, V, I>(
    key: &K,
    stores: I,
    flags: DominanceFlags,
) -> Resolution<'s, V>
where
    K: Clone + Eq + Hash + Ord + 's,
    V: PartialEq + 's,
    I: IntoIterator<Item = &'s RecordStore<K, V>>,
{
    let mut buckets: Vec<Bucket<'s, V>> = Vec::new();
    let mut in_default = false;
    let mut missing_from_custom = false;
    let mut any_custom = false;

    for (index, store) in stores.into_iter().enumerate() {
        if !store.is_ready() {
            continue;
        }
        let is_default = store.is_default();
        if !is_default {
            any_custom = true;
        }

        match store.get(key) {
            Some(value) => {
                match buckets.iter_mut().find(|bucket| bucket.value == value) {
                    Some(bucket) => {
                        bucket.count += 1;
                        bucket.seen_in_default |= is_default;
                    }
                    None => buckets.push(Bucket {
                        value,
                        count: 1,
                        seen_in_default: is_default,
                        first_store: index,
                    }),
                }
                in_default |= is_default;
            }
            None if !is_default => {
                missing_from_custom = true;
                if flags.contains(DominanceFlags::REMOVE_IF_MISSING_FROM_ALL_CUSTOM) {
                    trace!(store = store.name(), "key missing from custom store, removing");
                    return Resolution::removed(Vec::new(), Outcome::RemovedMissingFromCustom);
                }
            }
            None => {}
        }
    }

    if buckets.is_empty() {
        return Resolution::removed(buckets, Outcome::NoCandidates);
    }

    if flags.contains(DominanceFlags::REMOVE_IF_MISSING_FROM_ONE_CUSTOM_BUT_PRESENT_IN_DEFAULT)
        && any_custom
        && in_default
        && missing_from_custom
    {
        return Resolution::removed(buckets, Outcome::RemovedMissingFromOneCustom);
    }

    let mut best = 0;
    for (index, candidate) in buckets.iter().enumerate().skip(1) {
        if dominates(candidate, &buckets[best]) {
            best = index;
        }
    }

    Resolution {
        buckets,
        winner: Some(best),
        outcome: Outcome::Winner,
    }
}

/// Whether `candidate` strictly beats `current`. Ties go to `current`,
/// which was seen first.
fn dominates<V>(candidate: &Bucket<'_, V>, current: &Bucket<'_, V>) -> bool {
    match (candidate.seen_in_default, current.seen_in_default) {
        (false, true) => true,
        (true, false) => false,
        _ => candidate.count < current.count,
    }
}
