//! First-wins claims over a stream of candidates.
//!
//! Both the placeholder parser (one field per name) and the execution stream
//! handler (one execution identifier per run) see the same key offered more
//! than once and must keep only the earliest offer. `Claims` records that
//! decision in one place.

use indexmap::IndexMap;
use std::borrow::Borrow;
use std::hash::Hash;

/// Insertion-ordered map where the first value claimed for a key is final.
#[derive(Debug, Clone)]
pub struct Claims<K, V> {
    entries: IndexMap<K, V>,
}

impl<K: Hash + Eq, V> Claims<K, V> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Offer `value` for `key`.
    ///
    /// Returns `true` if this offer won the key. A losing offer is dropped,
    /// the stored value is never replaced or merged.
    pub fn claim(&mut self, key: K, value: V) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, value);
        true
    }

    pub fn is_claimed<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.entries.contains_key(key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Winning values in the order their keys were first claimed.
    pub fn into_values(self) -> Vec<V> {
        self.entries.into_values().collect()
    }

    /// Winning keys in claim order.
    pub fn into_keys(self) -> Vec<K> {
        self.entries.into_keys().collect()
    }
}

impl<K: Hash + Eq, V> Default for Claims<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
