use std::sync::Arc;

use miden_crypto::merkle::EmptySubtreeRoots;
use veil_objects::{
    Digest, Hasher,
    tree::{SiblingPath, TreeInfo, TreeKind, TreeSnapshot},
};

use crate::TreeError;

// NODE
// ================================================================================================

/// A node of a persistent Merkle tree. Missing children stand for empty subtrees.
#[derive(Debug)]
enum Node<L> {
    Leaf {
        hash: Digest,
        leaf: L,
    },
    Inner {
        hash: Digest,
        left: Option<Arc<Node<L>>>,
        right: Option<Arc<Node<L>>>,
    },
}

impl<L> Node<L> {
    fn hash(&self) -> Digest {
        match self {
            Node::Leaf { hash, .. } | Node::Inner { hash, .. } => *hash,
        }
    }

    /// Returns the children of an inner node. Leaves have none.
    fn children(&self) -> (Option<&Arc<Node<L>>>, Option<&Arc<Node<L>>>) {
        match self {
            Node::Leaf { .. } => (None, None),
            Node::Inner { left, right, .. } => (left.as_ref(), right.as_ref()),
        }
    }
}

fn node_hash<L>(node: Option<&Arc<Node<L>>>, tree_depth: u8, node_depth: u8) -> Digest {
    match node {
        Some(node) => node.hash(),
        None => *EmptySubtreeRoots::entry(tree_depth, node_depth),
    }
}

/// Returns true if the bit of `index` that selects the child at `level` points right.
fn goes_right(index: u64, depth: u8, level: u8) -> bool {
    (index >> (depth - 1 - level)) & 1 == 1
}

// TREE VERSION
// ================================================================================================

/// An immutable version of a sparse Merkle tree of fixed depth whose leaves are filled from
/// index zero upwards.
///
/// Updating a leaf copies the nodes on its path and shares every other node with the previous
/// version, so keeping old versions around costs `O(depth)` nodes per update.
#[derive(Debug)]
pub struct TreeVersion<L> {
    root: Option<Arc<Node<L>>>,
    size: u64,
    depth: u8,
}

impl<L> Clone for TreeVersion<L> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            size: self.size,
            depth: self.depth,
        }
    }
}

impl<L: Clone> TreeVersion<L> {
    pub fn empty(depth: u8) -> Self {
        Self { root: None, size: 0, depth }
    }

    pub fn root(&self) -> Digest {
        node_hash(self.root.as_ref(), self.depth, 0)
    }

    /// Returns the number of leaf slots in use, including padding slots left empty.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn snapshot(&self) -> TreeSnapshot {
        TreeSnapshot::new(self.root(), self.size)
    }

    pub fn info(&self, tree: TreeKind) -> TreeInfo {
        TreeInfo {
            tree,
            root: self.root(),
            size: self.size,
            depth: self.depth,
        }
    }

    /// Returns the number of leaves this tree can hold.
    pub fn capacity(&self) -> u128 {
        1u128 << self.depth
    }

    /// Returns the leaf stored at `index`, or `None` if the slot is empty.
    pub fn leaf(&self, index: u64) -> Option<&L> {
        if index >= self.size {
            return None;
        }

        let mut node = self.root.as_ref()?;
        for level in 0..self.depth {
            let (left, right) = node.children();
            node = if goes_right(index, self.depth, level) { right? } else { left? };
        }

        match node.as_ref() {
            Node::Leaf { leaf, .. } => Some(leaf),
            Node::Inner { .. } => None,
        }
    }

    /// Returns the sibling path of the leaf at `index`, leaf level first.
    ///
    /// # Errors
    /// Returns an error if `index` does not fit into the depth of this tree.
    pub fn sibling_path(&self, index: u64) -> Result<SiblingPath, TreeError> {
        self.check_index(index)?;

        let mut nodes = Vec::with_capacity(self.depth as usize);
        let mut node = self.root.as_ref();
        for level in 0..self.depth {
            let (left, right) = node.map(|node| node.children()).unwrap_or((None, None));
            let (next, sibling) =
                if goes_right(index, self.depth, level) { (right, left) } else { (left, right) };
            nodes.push(node_hash(sibling, self.depth, level + 1));
            node = next;
        }
        nodes.reverse();

        Ok(SiblingPath::new(nodes))
    }

    /// Returns a new version with `leaf` stored at `index`. The size grows to cover `index` if
    /// needed.
    ///
    /// # Errors
    /// Returns an error if `index` does not fit into the depth of this tree.
    pub fn with_leaf(&self, index: u64, hash: Digest, leaf: L) -> Result<Self, TreeError> {
        self.check_index(index)?;

        let root = insert(self.root.as_ref(), self.depth, 0, index, hash, leaf);
        Ok(Self {
            root: Some(root),
            size: self.size.max(index + 1),
            depth: self.depth,
        })
    }

    /// Returns a copy of this version with the size set to `size`, leaving the slots between
    /// the old and the new size empty.
    pub fn with_size(&self, size: u64) -> Self {
        debug_assert!(size as u128 <= self.capacity());
        Self {
            root: self.root.clone(),
            size,
            depth: self.depth,
        }
    }

    /// Returns the lowest index whose leaf satisfies `predicate`.
    pub fn find_leaf(&self, mut predicate: impl FnMut(&L) -> bool) -> Option<u64> {
        let root = self.root.as_ref()?;
        find(root, 0, &mut predicate)
    }

    fn check_index(&self, index: u64) -> Result<(), TreeError> {
        if index as u128 >= self.capacity() {
            return Err(TreeError::LeafIndexOutOfRange { index, depth: self.depth });
        }
        Ok(())
    }
}

fn insert<L: Clone>(
    node: Option<&Arc<Node<L>>>,
    depth: u8,
    level: u8,
    index: u64,
    hash: Digest,
    leaf: L,
) -> Arc<Node<L>> {
    if level == depth {
        return Arc::new(Node::Leaf { hash, leaf });
    }

    let (left, right) = node.map(|node| node.children()).unwrap_or((None, None));
    let (left, right) = if goes_right(index, depth, level) {
        (left.cloned(), Some(insert(right, depth, level + 1, index, hash, leaf)))
    } else {
        (Some(insert(left, depth, level + 1, index, hash, leaf)), right.cloned())
    };

    let hash = Hasher::merge(&[
        node_hash(left.as_ref(), depth, level + 1),
        node_hash(right.as_ref(), depth, level + 1),
    ]);
    Arc::new(Node::Inner { hash, left, right })
}

/// Visits the leaves below `node` in index order. `prefix` holds the path bits of `node`.
fn find<L>(
    node: &Arc<Node<L>>,
    prefix: u64,
    predicate: &mut impl FnMut(&L) -> bool,
) -> Option<u64> {
    match node.as_ref() {
        Node::Leaf { leaf, .. } => predicate(leaf).then_some(prefix),
        Node::Inner { left, right, .. } => left
            .as_ref()
            .and_then(|left| find(left, prefix << 1, predicate))
            .or_else(|| right.as_ref().and_then(|right| find(right, (prefix << 1) | 1, predicate))),
    }
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use veil_objects::{
        Felt,
        crypto::merkle::{MerkleTree, NodeIndex},
        tree::hash_value_leaf,
    };

    use super::*;

    fn version_with(depth: u8, values: &[u64]) -> anyhow::Result<TreeVersion<Felt>> {
        let mut version = TreeVersion::empty(depth);
        for (index, value) in values.iter().enumerate() {
            let value = Felt::new(*value);
            version = version.with_leaf(index as u64, hash_value_leaf(value), value)?;
        }
        Ok(version)
    }

    /// Tests that roots and paths match a dense Merkle tree over the same leaves.
    #[test]
    fn matches_dense_merkle_tree() -> anyhow::Result<()> {
        let values = [3u64, 1, 4, 1, 5];
        let version = version_with(3, &values)?;

        let mut leaves: Vec<_> =
            values.iter().map(|value| hash_value_leaf(Felt::new(*value)).into()).collect();
        leaves.resize(8, veil_objects::EMPTY_WORD);
        let dense = MerkleTree::new(leaves)?;

        assert_eq!(version.root(), dense.root());
        for index in 0..8 {
            let path = version.sibling_path(index)?;
            let expected = dense.get_path(NodeIndex::new(3, index)?)?;
            assert_eq!(path.as_merkle_path(), &expected);
        }
        Ok(())
    }

    /// Tests that older versions are unaffected by updates made after them.
    #[test]
    fn versions_share_structure_but_not_state() -> anyhow::Result<()> {
        let old = version_with(4, &[10, 20])?;
        let new = old.with_leaf(1, hash_value_leaf(Felt::new(99)), Felt::new(99))?;

        assert_eq!(old.leaf(1), Some(&Felt::new(20)));
        assert_eq!(new.leaf(1), Some(&Felt::new(99)));
        assert_eq!(new.leaf(0), Some(&Felt::new(10)));
        assert_ne!(old.root(), new.root());
        assert_eq!(old, version_with(4, &[10, 20])?);
        Ok(())
    }

    /// Tests leaf lookups, padding slots and out of range indices.
    #[test]
    fn leaf_lookup_and_bounds() -> anyhow::Result<()> {
        let version = version_with(2, &[7, 8])?.with_size(3);

        assert_eq!(version.size(), 3);
        assert_eq!(version.leaf(2), None);
        assert_eq!(version.leaf(3), None);
        assert_eq!(version.find_leaf(|value| *value == Felt::new(8)), Some(1));
        assert_eq!(version.find_leaf(|value| *value == Felt::new(9)), None);
        assert_matches!(
            version.sibling_path(4),
            Err(TreeError::LeafIndexOutOfRange { index: 4, depth: 2 })
        );
        assert_eq!(TreeVersion::<Felt>::empty(2).root(), *EmptySubtreeRoots::entry(2, 0));
        Ok(())
    }

    impl<L: Clone + PartialEq> PartialEq for TreeVersion<L> {
        fn eq(&self, other: &Self) -> bool {
            self.root() == other.root() && self.size == other.size && self.depth == other.depth
        }
    }
}
