use veil_objects::{
    Felt,
    block::BlockNumber,
    tree::{
        Leaf, LeafPreimage, MembershipWitness, NullifierLeafPreimage, PublicDataLeafPreimage,
        SiblingPath, StateReference, TreeInfo, TreeKind,
    },
};

use crate::{
    WorldStateError,
    tree::{BatchInsertionResult, LowLeafInfo},
};

// READ OPERATIONS
// ================================================================================================

/// Read access to the trees of one fixed state: the latest uncommitted state, the last
/// committed block or a historical block.
pub trait MerkleTreeReadOperations {
    fn get_tree_info(&self, tree: TreeKind) -> TreeInfo;

    fn get_state_reference(&self) -> StateReference;

    /// Returns the sibling path of the leaf at `index`.
    ///
    /// # Errors
    /// Returns an error if `index` does not fit into the tree depth.
    fn get_sibling_path(&self, tree: TreeKind, index: u64) -> Result<SiblingPath, WorldStateError>;

    /// Finds the leaf of an indexed tree holding the largest key lower than or equal to `key`.
    ///
    /// # Errors
    /// Returns an error if `tree` is not indexed or has no leaves.
    fn get_previous_value_index(
        &self,
        tree: TreeKind,
        key: Felt,
    ) -> Result<LowLeafInfo, WorldStateError>;

    /// Returns the preimage of the leaf at `index`, or `None` for an empty slot.
    ///
    /// # Errors
    /// Returns an error if `tree` is not indexed.
    fn get_leaf_preimage(
        &self,
        tree: TreeKind,
        index: u64,
    ) -> Result<Option<LeafPreimage>, WorldStateError>;

    /// Returns the leaf at `index`, or `None` for an empty slot.
    fn get_leaf_value(&self, tree: TreeKind, index: u64) -> Option<Leaf>;

    /// Returns the index of `leaf`. Indexed trees look the leaf up by key, append-only trees
    /// return the first matching slot.
    ///
    /// # Errors
    /// Returns an error if `leaf` cannot be stored in `tree`.
    fn find_leaf_index(&self, tree: TreeKind, leaf: &Leaf) -> Result<Option<u64>, WorldStateError>;

    // PROVIDED METHODS
    // --------------------------------------------------------------------------------------------

    fn nullifier_preimage(
        &self,
        index: u64,
    ) -> Result<Option<NullifierLeafPreimage>, WorldStateError> {
        match self.get_leaf_preimage(TreeKind::Nullifier, index)? {
            Some(LeafPreimage::Nullifier(preimage)) => Ok(Some(preimage)),
            _ => Ok(None),
        }
    }

    fn public_data_preimage(
        &self,
        index: u64,
    ) -> Result<Option<PublicDataLeafPreimage>, WorldStateError> {
        match self.get_leaf_preimage(TreeKind::PublicData, index)? {
            Some(LeafPreimage::PublicData(preimage)) => Ok(Some(preimage)),
            _ => Ok(None),
        }
    }

    /// Returns the membership witness of the leaf at `index`.
    ///
    /// # Errors
    /// Returns an error if `index` does not fit into the tree depth.
    fn membership_witness(
        &self,
        tree: TreeKind,
        index: u64,
    ) -> Result<MembershipWitness, WorldStateError> {
        Ok(MembershipWitness::new(index, self.get_sibling_path(tree, index)?))
    }
}

// WRITE OPERATIONS
// ================================================================================================

/// The outcome of a batch insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchInsertion {
    Nullifier(BatchInsertionResult<NullifierLeafPreimage>),
    PublicData(BatchInsertionResult<PublicDataLeafPreimage>),
    /// Values appended to an append-only tree.
    Appended {
        first_index: u64,
        new_subtree_sibling_path: SiblingPath,
    },
}

/// Write access to the uncommitted state.
pub trait MerkleTreeWriteOperations {
    /// Appends leaves to `tree` and returns the index of the first one.
    ///
    /// # Errors
    /// Returns an error if a leaf does not fit `tree` or the insertion fails.
    fn append_leaves(&mut self, tree: TreeKind, leaves: &[Leaf]) -> Result<u64, WorldStateError>;

    /// Inserts leaves into an indexed tree at consecutive indices. `None` entries leave their
    /// slot empty.
    ///
    /// # Errors
    /// Returns an error if `tree` is not indexed, a leaf does not fit it, or the insertion
    /// fails.
    fn batch_insert(
        &mut self,
        tree: TreeKind,
        leaves: &[Option<Leaf>],
    ) -> Result<BatchInsertion, WorldStateError>;

    /// Inserts leaves as a complete subtree of height `subtree_height`.
    ///
    /// # Errors
    /// Returns an error if a leaf does not fit `tree` or the insertion fails.
    fn batch_insert_subtree(
        &mut self,
        tree: TreeKind,
        leaves: &[Option<Leaf>],
        subtree_height: u8,
    ) -> Result<BatchInsertion, WorldStateError>;

    /// Inserts leaves into an indexed tree as consecutive complete subtrees of height
    /// `subtree_height`, returning one outcome per subtree. Either every subtree is inserted
    /// or none is.
    ///
    /// # Errors
    /// Returns an error if `tree` is not indexed, a leaf does not fit it, or inserting any of
    /// the subtrees fails.
    fn batch_insert_subtrees(
        &mut self,
        tree: TreeKind,
        leaves: &[Option<Leaf>],
        subtree_height: u8,
    ) -> Result<Vec<BatchInsertion>, WorldStateError>;

    /// Freezes the uncommitted state as the next block and returns its number.
    fn commit(&mut self) -> Result<BlockNumber, WorldStateError>;

    /// Discards the uncommitted state.
    fn rollback(&mut self) -> Result<(), WorldStateError>;
}
