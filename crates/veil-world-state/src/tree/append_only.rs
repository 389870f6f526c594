use veil_objects::{
    Felt,
    tree::{SiblingPath, TreeKind, hash_value_leaf},
};

use super::{TreeVersion, indexed::check_batch_shape};
use crate::TreeError;

/// A Merkle tree of raw values which only ever grows at its right edge.
#[derive(Debug)]
pub struct AppendOnlyTree {
    kind: TreeKind,
    committed: TreeVersion<Felt>,
    uncommitted: TreeVersion<Felt>,
}

impl AppendOnlyTree {
    pub fn new(kind: TreeKind, depth: u8) -> Self {
        let version = TreeVersion::empty(depth);
        Self {
            kind,
            committed: version.clone(),
            uncommitted: version,
        }
    }

    pub fn kind(&self) -> TreeKind {
        self.kind
    }

    pub fn version(&self, include_uncommitted: bool) -> &TreeVersion<Felt> {
        if include_uncommitted { &self.uncommitted } else { &self.committed }
    }

    /// Appends `values` and returns the index of the first one.
    ///
    /// # Errors
    /// Returns an error if the values do not fit into the tree. Nothing is appended then.
    pub fn append_leaves(&mut self, values: &[Felt]) -> Result<u64, TreeError> {
        let values: Vec<_> = values.iter().copied().map(Some).collect();
        self.insert(&values, None)
    }

    /// Appends `values` as a complete subtree of height `subtree_height`. `None` entries leave
    /// their slot empty.
    ///
    /// Returns the index of the first slot and the sibling path of the subtree root.
    ///
    /// # Errors
    /// Returns an error if the values do not fit into the tree, or do not form a complete
    /// subtree aligned to the current size.
    pub fn batch_insert_subtree(
        &mut self,
        values: &[Option<Felt>],
        subtree_height: u8,
    ) -> Result<(u64, SiblingPath), TreeError> {
        let start = self.insert(values, Some(subtree_height))?;
        let path = self.uncommitted.sibling_path(start)?;
        Ok((start, SiblingPath::new(path.nodes()[subtree_height as usize..].to_vec())))
    }

    pub fn commit(&mut self) {
        self.committed = self.uncommitted.clone();
    }

    pub fn rollback(&mut self) {
        self.uncommitted = self.committed.clone();
    }

    fn insert(
        &mut self,
        values: &[Option<Felt>],
        subtree_height: Option<u8>,
    ) -> Result<u64, TreeError> {
        let start = self.uncommitted.size();
        check_batch_shape(&self.uncommitted, values.len(), subtree_height)?;

        let mut version = self.uncommitted.clone();
        for (index, value) in (start..).zip(values) {
            if let Some(value) = value {
                version = version.with_leaf(index, hash_value_leaf(*value), *value)?;
            }
        }
        self.uncommitted = version.with_size(start + values.len() as u64);

        Ok(start)
    }
}
