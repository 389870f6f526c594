use std::sync::Arc;

use veil_objects::{
    Felt,
    block::BlockNumber,
    tree::{
        Leaf, LeafPreimage, NullifierLeafPreimage, PublicDataLeafPreimage, SiblingPath,
        StateReference, TreeInfo, TreeKind,
    },
};

use crate::{
    BatchInsertion, MerkleTreeReadOperations, MerkleTreeWriteOperations, WorldStateError,
    WorldStateView,
    tree::{IndexedTreeView, KeyIndex, LowLeafInfo, TreeVersion},
};

/// The committed versions of every tree at the end of a block.
#[derive(Debug, Clone)]
pub(crate) struct TreeVersions {
    pub nullifier_tree: TreeVersion<NullifierLeafPreimage>,
    pub public_data_tree: TreeVersion<PublicDataLeafPreimage>,
    pub note_hash_tree: TreeVersion<Felt>,
    pub l1_to_l2_message_tree: TreeVersion<Felt>,
    pub archive: TreeVersion<Felt>,
}

// SNAPSHOT VIEW
// ================================================================================================

/// A read-only view of the world state as of the end of a historical block.
///
/// The view owns its tree versions, so it stays valid while the world state moves on and can
/// be shared between threads. Every write fails with [`WorldStateError::ReadOnlyViolation`].
#[derive(Debug, Clone)]
pub struct SnapshotView {
    block_num: BlockNumber,
    versions: Arc<TreeVersions>,
    nullifier_keys: KeyIndex,
    public_data_keys: KeyIndex,
}

impl SnapshotView {
    pub(crate) fn new(
        block_num: BlockNumber,
        versions: Arc<TreeVersions>,
        nullifier_keys: KeyIndex,
        public_data_keys: KeyIndex,
    ) -> Self {
        Self {
            block_num,
            versions,
            nullifier_keys,
            public_data_keys,
        }
    }

    pub fn block_num(&self) -> BlockNumber {
        self.block_num
    }

    /// Returns a borrowed view of this snapshot.
    pub fn view(&self) -> WorldStateView<'_> {
        WorldStateView::new(
            IndexedTreeView::new(&self.versions.nullifier_tree, &self.nullifier_keys),
            IndexedTreeView::new(&self.versions.public_data_tree, &self.public_data_keys),
            &self.versions.note_hash_tree,
            &self.versions.l1_to_l2_message_tree,
            &self.versions.archive,
        )
    }
}

impl MerkleTreeReadOperations for SnapshotView {
    fn get_tree_info(&self, tree: TreeKind) -> TreeInfo {
        self.view().get_tree_info(tree)
    }

    fn get_state_reference(&self) -> StateReference {
        self.view().get_state_reference()
    }

    fn get_sibling_path(&self, tree: TreeKind, index: u64) -> Result<SiblingPath, WorldStateError> {
        self.view().get_sibling_path(tree, index)
    }

    fn get_previous_value_index(
        &self,
        tree: TreeKind,
        key: Felt,
    ) -> Result<LowLeafInfo, WorldStateError> {
        self.view().get_previous_value_index(tree, key)
    }

    fn get_leaf_preimage(
        &self,
        tree: TreeKind,
        index: u64,
    ) -> Result<Option<LeafPreimage>, WorldStateError> {
        self.view().get_leaf_preimage(tree, index)
    }

    fn get_leaf_value(&self, tree: TreeKind, index: u64) -> Option<Leaf> {
        self.view().get_leaf_value(tree, index)
    }

    fn find_leaf_index(&self, tree: TreeKind, leaf: &Leaf) -> Result<Option<u64>, WorldStateError> {
        self.view().find_leaf_index(tree, leaf)
    }
}

impl MerkleTreeWriteOperations for SnapshotView {
    fn append_leaves(&mut self, _tree: TreeKind, _leaves: &[Leaf]) -> Result<u64, WorldStateError> {
        Err(WorldStateError::ReadOnlyViolation(self.block_num))
    }

    fn batch_insert(
        &mut self,
        _tree: TreeKind,
        _leaves: &[Option<Leaf>],
    ) -> Result<BatchInsertion, WorldStateError> {
        Err(WorldStateError::ReadOnlyViolation(self.block_num))
    }

    fn batch_insert_subtree(
        &mut self,
        _tree: TreeKind,
        _leaves: &[Option<Leaf>],
        _subtree_height: u8,
    ) -> Result<BatchInsertion, WorldStateError> {
        Err(WorldStateError::ReadOnlyViolation(self.block_num))
    }

    fn batch_insert_subtrees(
        &mut self,
        _tree: TreeKind,
        _leaves: &[Option<Leaf>],
        _subtree_height: u8,
    ) -> Result<Vec<BatchInsertion>, WorldStateError> {
        Err(WorldStateError::ReadOnlyViolation(self.block_num))
    }

    fn commit(&mut self) -> Result<BlockNumber, WorldStateError> {
        Err(WorldStateError::ReadOnlyViolation(self.block_num))
    }

    fn rollback(&mut self) -> Result<(), WorldStateError> {
        Err(WorldStateError::ReadOnlyViolation(self.block_num))
    }
}
