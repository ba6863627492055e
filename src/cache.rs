//! Per-query memoization.
//!
//! A [`QueryCache`] is created at the start of every top-level verifier call
//! and dropped when it returns. Nothing is shared between queries: domains
//! depend on source state that may change between two queries, and
//! concurrent queries must not contend on a common table.

use std::collections::HashMap;
use std::hash::Hash;

use crate::domain::Domain;
use crate::types::{SymbolId, Type};

/// A memo table backed by [HashMap], counting hits and misses.
#[derive(Debug)]
pub struct MemoCache<K, V> {
    map: HashMap<K, V>,
    hits: usize,
    misses: usize,
}

impl<K, V> Default for MemoCache<K, V> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<K, V> MemoCache<K, V> {
    /// Returns the number of entries in the cache.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the number of cache hits.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Returns the number of cache misses.
    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}

impl<K, V> MemoCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    /// Looks up a key, returning a copy of the memoized value.
    pub fn get(&mut self, key: &K) -> Option<V> {
        match self.map.get(key) {
            Some(v) => {
                self.hits += 1;
                Some(v.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.map.insert(key, value);
    }
}

/// Key of the registry memo: resolved callee plus the folded argument.
pub type RegistryKey = (SymbolId, Option<i64>);

/// Transient tables owned by one verification query.
#[derive(Debug, Default)]
pub struct QueryCache {
    /// Declared domain of a symbol for a target type.
    pub domains: MemoCache<(SymbolId, Type), Option<Domain>>,
    /// Built-in registry lookups.
    pub registry: MemoCache<RegistryKey, Option<Domain>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memo_basic() {
        let mut cache = MemoCache::<(u64, u64), i32>::default();

        cache.insert((1, 2), 42);
        cache.insert((3, 4), 99);

        assert_eq!(cache.get(&(1, 2)), Some(42));
        assert_eq!(cache.get(&(3, 4)), Some(99));
        assert_eq!(cache.get(&(5, 6)), None);

        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_memo_clear() {
        let mut cache = MemoCache::<u32, Option<i32>>::default();
        cache.insert(1, None);
        assert_eq!(cache.get(&1), Some(None));
        cache.clear();
        assert_eq!(cache.get(&1), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_query_cache_starts_empty() {
        let cache = QueryCache::new();
        assert!(cache.domains.is_empty());
        assert!(cache.registry.is_empty());
    }
}
