use std::{
    collections::BTreeMap,
    sync::{Arc, PoisonError, RwLock},
};

/// Maps the keys of an indexed tree to the indices of their leaves.
///
/// The index is shared by every version of a tree. Lookups take the size of the version they
/// read from and ignore keys stored at or beyond it, so older versions never observe keys
/// inserted after them.
#[derive(Debug, Clone, Default)]
pub(crate) struct KeyIndex(Arc<RwLock<BTreeMap<u64, u64>>>);

impl KeyIndex {
    /// Returns the leaf index of `key` in a version of the given size.
    pub fn get(&self, key: u64, size: u64) -> Option<u64> {
        let keys = self.0.read().unwrap_or_else(PoisonError::into_inner);
        keys.get(&key).copied().filter(|index| *index < size)
    }

    /// Returns the largest key lower than or equal to `key`, together with its leaf index, in
    /// a version of the given size.
    pub fn low_leaf(&self, key: u64, size: u64) -> Option<(u64, u64)> {
        let keys = self.0.read().unwrap_or_else(PoisonError::into_inner);
        keys.range(..=key)
            .rev()
            .find(|(_, index)| **index < size)
            .map(|(key, index)| (*key, *index))
    }

    pub fn insert_all(&self, entries: impl IntoIterator<Item = (u64, u64)>) {
        let mut keys = self.0.write().unwrap_or_else(PoisonError::into_inner);
        keys.extend(entries);
    }

    /// Drops every key stored at or beyond `size`.
    pub fn truncate(&self, size: u64) {
        let mut keys = self.0.write().unwrap_or_else(PoisonError::into_inner);
        keys.retain(|_, index| *index < size);
    }
}
