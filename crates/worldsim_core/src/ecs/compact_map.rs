//! # Compact Map
//!
//! A flat, always-sorted associative container for very small key sets.
//! Each entity holds at most a handful of component handles, so a linear
//! scan over a contiguous `Vec` beats any hashed or tree map here.

use std::ops::Index;

/// Sorted `(key, value)` pairs.
///
/// Insertion keeps the pairs sorted by key and replaces an existing entry
/// with the same key, so each key appears at most once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompactMap<K, V> {
    entries: Vec<(K, V)>,
}

impl<K, V> Default for CompactMap<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: Ord + Copy, V> CompactMap<K, V> {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts a pair, returning the previous value for `key` if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let at = self.entries.partition_point(|(k, _)| *k < key);
        match self.entries.get_mut(at) {
            Some((k, v)) if *k == key => Some(std::mem::replace(v, value)),
            _ => {
                self.entries.insert(at, (key, value));
                None
            }
        }
    }

    /// Returns true if `key` is present.
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Looks up `key`, stopping as soon as a larger key is seen.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        for (k, v) in &self.entries {
            if k > key {
                break;
            }
            if k == key {
                return Some(v);
            }
        }
        None
    }

    /// Mutable lookup.
    #[inline]
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        for (k, v) in &mut self.entries {
            if *k > *key {
                break;
            }
            if *k == *key {
                return Some(v);
            }
        }
        None
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let at = self.entries.partition_point(|(k, _)| k < key);
        match self.entries.get(at) {
            Some((k, _)) if k == key => Some(self.entries.remove(at).1),
            _ => None,
        }
    }

    /// Iterates pairs in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Iterates keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    /// Number of pairs.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map holds no pairs.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every pair.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drains all pairs in ascending key order.
    pub fn drain(&mut self) -> impl Iterator<Item = (K, V)> + '_ {
        self.entries.drain(..)
    }
}

impl<K: Ord + Copy + std::fmt::Debug, V> Index<&K> for CompactMap<K, V> {
    type Output = V;

    /// # Panics
    ///
    /// Panics if `key` is absent. Check with `contains_key` first.
    fn index(&self, key: &K) -> &V {
        match self.get(key) {
            Some(v) => v,
            None => panic!("CompactMap has no entry for key {key:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_sorted() {
        let mut map = CompactMap::new();
        for k in [5u8, 1, 4, 2, 3] {
            map.insert(k, u32::from(k) * 10);
        }
        let keys: Vec<u8> = map.keys().collect();
        assert_eq!(keys, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_has_get_roundtrip() {
        let mut map = CompactMap::new();
        let added = [7u8, 2, 9, 0, 4];
        for k in added {
            map.insert(k, k ^ 0xAA);
        }
        for k in added {
            assert!(map.contains_key(&k));
            assert_eq!(map.get(&k), Some(&(k ^ 0xAA)));
            assert_eq!(map[&k], k ^ 0xAA);
        }
        for k in [1u8, 3, 5, 6, 8, 10, 255] {
            assert!(!map.contains_key(&k));
            assert!(map.get(&k).is_none());
        }
    }

    #[test]
    fn test_insert_replaces_duplicate() {
        let mut map = CompactMap::new();
        assert_eq!(map.insert(3u8, "a"), None);
        assert_eq!(map.insert(3u8, "b"), Some("a"));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&3), Some(&"b"));
    }

    #[test]
    fn test_remove() {
        let mut map = CompactMap::new();
        map.insert(1u8, 'x');
        map.insert(2u8, 'y');
        assert_eq!(map.remove(&1), Some('x'));
        assert_eq!(map.remove(&1), None);
        assert!(!map.contains_key(&1));
        assert!(map.contains_key(&2));
    }

    #[test]
    #[should_panic(expected = "no entry")]
    fn test_index_missing_panics() {
        let map: CompactMap<u8, u8> = CompactMap::new();
        let _ = map[&1];
    }
}
