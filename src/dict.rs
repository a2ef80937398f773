use std::borrow::Borrow;
use std::collections::BTreeMap;

/// Signals that [`Dict::insert`] found the key already present. Carries the
/// rejected value back so the caller can undo side effects without cloning.
#[derive(Debug)]
pub struct DuplicateKey<V>(pub V);

/// Ordered key/value container backing both directory listings and the
/// file-id → block-chain index. Thin layer over `BTreeMap` that splits
/// insertion into a duplicate-rejecting `insert` (directory creation wants
/// "already exists" feedback) and an `upsert` (a full-file overwrite wants
/// silent replacement).
pub struct Dict<K, V> {
    entries: BTreeMap<K, V>,
}

impl<K: Ord, V> Dict<K, V> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Adds an entry, refusing to displace an existing one.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), DuplicateKey<V>> {
        if self.entries.contains_key(&key) {
            return Err(DuplicateKey(value));
        }
        self.entries.insert(key, value);
        Ok(())
    }

    /// Adds or replaces, returning the displaced value if there was one.
    pub fn upsert(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    pub fn find<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn find_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.get_mut(key)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.remove(key)
    }

    /// Visits entries in ascending key order, regardless of insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Ord, V> Default for Dict<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_rejects_duplicates_and_returns_the_value() {
        let mut dict = Dict::new();
        dict.insert("a", 1).unwrap();

        let rejected = dict.insert("a", 2).unwrap_err();
        assert_eq!(rejected.0, 2);
        assert_eq!(dict.find(&"a"), Some(&1));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn upsert_replaces_and_hands_back_the_old_value() {
        let mut dict = Dict::new();
        dict.insert("a", 1).unwrap();

        assert_eq!(dict.upsert("a", 2), Some(1));
        assert_eq!(dict.upsert("b", 3), None);
        assert_eq!(dict.find(&"a"), Some(&2));
    }

    #[test]
    fn traversal_is_key_ordered_not_insertion_ordered() {
        let mut dict = Dict::new();
        dict.insert("zeta", 1).unwrap();
        dict.insert("alpha", 2).unwrap();
        dict.insert("mid", 3).unwrap();

        let keys: Vec<_> = dict.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn remove_takes_the_entry_out() {
        let mut dict = Dict::new();
        dict.insert(7_u64, "chain").unwrap();

        assert_eq!(dict.remove(&7), Some("chain"));
        assert_eq!(dict.remove(&7), None);
        assert!(dict.is_empty());
    }
}
