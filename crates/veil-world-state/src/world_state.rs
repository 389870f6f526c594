use std::{collections::BTreeMap, sync::Arc};

use tracing::{debug, info, instrument};
use veil_objects::{
    Felt, PUBLIC_DATA_SUBTREE_HEIGHT,
    block::{BlockNumber, L2BlockData},
    tree::{
        Leaf, NullifierLeaf, NullifierLeafPreimage, PublicDataLeaf, PublicDataLeafPreimage,
        StateReference, TreeInfo, TreeKind,
    },
};

use crate::{
    BatchInsertion, COMPONENT, MerkleTreeReadOperations, MerkleTreeWriteOperations, SnapshotView,
    TreeError, WorldStateConfig, WorldStateError, WorldStateView,
    snapshot::TreeVersions,
    tree::{AppendOnlyTree, IndexedTree},
};

// WORLD STATE
// ================================================================================================

/// The five trees of the rollup together with the history of committed blocks.
///
/// All writes go to an uncommitted state shared by every tree. [`WorldState::commit`] freezes
/// it as the next block, [`WorldState::rollback`] discards it. Frozen blocks stay available
/// through [`WorldState::snapshot_at`].
#[derive(Debug)]
pub struct WorldState {
    config: WorldStateConfig,
    nullifier_tree: IndexedTree<NullifierLeafPreimage>,
    public_data_tree: IndexedTree<PublicDataLeafPreimage>,
    note_hash_tree: AppendOnlyTree,
    l1_to_l2_message_tree: AppendOnlyTree,
    archive: AppendOnlyTree,
    history: BTreeMap<BlockNumber, Arc<TreeVersions>>,
    latest_block: BlockNumber,
}

impl WorldState {
    /// Creates the world state described by `config` and commits its initial contents as the
    /// genesis block.
    ///
    /// # Errors
    /// Returns an error if `config` is invalid.
    pub fn new(config: WorldStateConfig) -> Result<Self, WorldStateError> {
        config.validate()?;

        let nullifier_tree = IndexedTree::new(
            TreeKind::Nullifier,
            config.nullifier_tree.depth,
            config.nullifier_tree.initial_size,
        )
        .map_err(tree_error(TreeKind::Nullifier))?;
        let public_data_tree = IndexedTree::new(
            TreeKind::PublicData,
            config.public_data_tree.depth,
            config.public_data_tree.initial_size,
        )
        .map_err(tree_error(TreeKind::PublicData))?;

        let mut world_state = Self {
            note_hash_tree: AppendOnlyTree::new(TreeKind::NoteHash, config.note_hash_tree.depth),
            l1_to_l2_message_tree: AppendOnlyTree::new(
                TreeKind::L1ToL2Message,
                config.l1_to_l2_message_tree.depth,
            ),
            archive: AppendOnlyTree::new(TreeKind::Archive, config.archive_tree.depth),
            config,
            nullifier_tree,
            public_data_tree,
            history: BTreeMap::new(),
            latest_block: BlockNumber::GENESIS,
        };
        let genesis = Arc::new(world_state.committed_versions());
        world_state.history.insert(BlockNumber::GENESIS, genesis);

        info!(
            target: COMPONENT,
            state = ?world_state.get_state_reference(false),
            "world state created"
        );
        Ok(world_state)
    }

    pub fn config(&self) -> &WorldStateConfig {
        &self.config
    }

    /// Returns the number of the most recently committed block.
    pub fn latest_block_number(&self) -> BlockNumber {
        self.latest_block
    }

    /// Returns a view of either the uncommitted or the last committed state.
    pub fn view(&self, include_uncommitted: bool) -> WorldStateView<'_> {
        WorldStateView::new(
            self.nullifier_tree.view(include_uncommitted),
            self.public_data_tree.view(include_uncommitted),
            self.note_hash_tree.version(include_uncommitted),
            self.l1_to_l2_message_tree.version(include_uncommitted),
            self.archive.version(include_uncommitted),
        )
    }

    /// Returns a view of the uncommitted state.
    pub fn as_latest(&self) -> WorldStateView<'_> {
        self.view(true)
    }

    /// Returns a view of the last committed block.
    pub fn as_committed(&self) -> WorldStateView<'_> {
        self.view(false)
    }

    pub fn get_state_reference(&self, include_uncommitted: bool) -> StateReference {
        self.view(include_uncommitted).get_state_reference()
    }

    pub fn get_tree_info(&self, tree: TreeKind, include_uncommitted: bool) -> TreeInfo {
        self.view(include_uncommitted).get_tree_info(tree)
    }

    /// Returns a read-only view of the state at the end of `block_num`.
    ///
    /// # Errors
    /// Returns an error if `block_num` has not been committed.
    pub fn snapshot_at(&self, block_num: BlockNumber) -> Result<SnapshotView, WorldStateError> {
        let versions =
            self.history.get(&block_num).ok_or(WorldStateError::UnknownBlock(block_num))?;

        Ok(SnapshotView::new(
            block_num,
            Arc::clone(versions),
            self.nullifier_tree.keys().clone(),
            self.public_data_tree.keys().clone(),
        ))
    }

    /// Brings the world state in line with a block produced elsewhere and commits it.
    ///
    /// If the uncommitted state already matches the block, for example because the block was
    /// built locally, it is committed as is and `true` is returned. Otherwise the uncommitted
    /// state is discarded, the block's effects are applied and committed, and `false` is
    /// returned.
    ///
    /// # Errors
    /// Returns an error if:
    /// - the block does not directly follow the latest committed block.
    /// - applying the block fails.
    /// - the resulting state differs from the block's state reference.
    ///
    /// The uncommitted state is discarded on error.
    #[instrument(target = COMPONENT, skip_all, fields(block_num = %block.block_num), err)]
    pub fn sync_block(&mut self, block: &L2BlockData) -> Result<bool, WorldStateError> {
        if block.block_num.parent() != Some(self.latest_block) {
            return Err(WorldStateError::UnexpectedBlockNumber {
                expected: self.latest_block.child(),
                actual: block.block_num,
            });
        }

        if self.get_state_reference(true) == block.state_reference {
            self.commit()?;
            return Ok(true);
        }

        self.rollback()?;
        if let Err(err) = self.apply_block(block) {
            self.rollback()?;
            return Err(err);
        }

        let actual = self.get_state_reference(true);
        let mismatch = TreeKind::ALL
            .into_iter()
            .find(|tree| actual.tree(*tree) != block.state_reference.tree(*tree));
        if let Some(tree) = mismatch {
            self.rollback()?;
            return Err(WorldStateError::BlockStateMismatch { block_num: block.block_num, tree });
        }

        self.commit()?;
        Ok(false)
    }

    // HELPERS
    // --------------------------------------------------------------------------------------------

    fn apply_block(&mut self, block: &L2BlockData) -> Result<(), WorldStateError> {
        let nullifiers: Vec<_> = block
            .nullifiers()
            .map(|nullifier| Some(Leaf::Nullifier(NullifierLeaf::new(nullifier))))
            .collect();
        if !nullifiers.is_empty() {
            self.batch_insert(TreeKind::Nullifier, &nullifiers)?;
        }

        let note_hashes: Vec<_> = block.note_hashes().map(Leaf::Value).collect();
        self.append_leaves(TreeKind::NoteHash, &note_hashes)?;

        // keep the public data tree aligned to the subtrees the public state scratchpad inserts
        let subtree_size = 1usize << PUBLIC_DATA_SUBTREE_HEIGHT;
        for effect in &block.tx_effects {
            if effect.public_data_writes.is_empty() {
                continue;
            }
            let mut writes: Vec<_> = effect
                .public_data_writes
                .iter()
                .map(|write| Some(Leaf::PublicData(*write)))
                .collect();
            writes.resize(writes.len().next_multiple_of(subtree_size), None);
            self.batch_insert(TreeKind::PublicData, &writes)?;
        }

        let messages: Vec<_> = block.l1_to_l2_messages.iter().copied().map(Leaf::Value).collect();
        self.append_leaves(TreeKind::L1ToL2Message, &messages)?;
        self.append_leaves(TreeKind::Archive, &[Leaf::Value(block.block_hash)])?;

        Ok(())
    }

    fn committed_versions(&self) -> TreeVersions {
        TreeVersions {
            nullifier_tree: self.nullifier_tree.version(false).clone(),
            public_data_tree: self.public_data_tree.version(false).clone(),
            note_hash_tree: self.note_hash_tree.version(false).clone(),
            l1_to_l2_message_tree: self.l1_to_l2_message_tree.version(false).clone(),
            archive: self.archive.version(false).clone(),
        }
    }
}

impl MerkleTreeWriteOperations for WorldState {
    fn append_leaves(&mut self, tree: TreeKind, leaves: &[Leaf]) -> Result<u64, WorldStateError> {
        let append_only = match tree {
            TreeKind::Nullifier => {
                let leaves = extract_leaves(tree, leaves, as_nullifier)?;
                return self.nullifier_tree.append_leaves(&leaves).map_err(tree_error(tree));
            },
            TreeKind::PublicData => {
                let leaves = extract_leaves(tree, leaves, as_public_data)?;
                return self.public_data_tree.append_leaves(&leaves).map_err(tree_error(tree));
            },
            TreeKind::NoteHash => &mut self.note_hash_tree,
            TreeKind::L1ToL2Message => &mut self.l1_to_l2_message_tree,
            TreeKind::Archive => &mut self.archive,
        };

        let values = extract_leaves(tree, leaves, as_value)?;
        append_only.append_leaves(&values).map_err(tree_error(tree))
    }

    fn batch_insert(
        &mut self,
        tree: TreeKind,
        leaves: &[Option<Leaf>],
    ) -> Result<BatchInsertion, WorldStateError> {
        match tree {
            TreeKind::Nullifier => {
                let leaves = extract_optional_leaves(tree, leaves, as_nullifier)?;
                let result = self.nullifier_tree.batch_insert(&leaves).map_err(tree_error(tree))?;
                Ok(BatchInsertion::Nullifier(result))
            },
            TreeKind::PublicData => {
                let leaves = extract_optional_leaves(tree, leaves, as_public_data)?;
                let result =
                    self.public_data_tree.batch_insert(&leaves).map_err(tree_error(tree))?;
                Ok(BatchInsertion::PublicData(result))
            },
            _ => Err(WorldStateError::NotIndexed(tree)),
        }
    }

    fn batch_insert_subtree(
        &mut self,
        tree: TreeKind,
        leaves: &[Option<Leaf>],
        subtree_height: u8,
    ) -> Result<BatchInsertion, WorldStateError> {
        let append_only = match tree {
            TreeKind::Nullifier => {
                let leaves = extract_optional_leaves(tree, leaves, as_nullifier)?;
                let result = self
                    .nullifier_tree
                    .batch_insert_subtree(&leaves, subtree_height)
                    .map_err(tree_error(tree))?;
                return Ok(BatchInsertion::Nullifier(result));
            },
            TreeKind::PublicData => {
                let leaves = extract_optional_leaves(tree, leaves, as_public_data)?;
                let result = self
                    .public_data_tree
                    .batch_insert_subtree(&leaves, subtree_height)
                    .map_err(tree_error(tree))?;
                return Ok(BatchInsertion::PublicData(result));
            },
            TreeKind::NoteHash => &mut self.note_hash_tree,
            TreeKind::L1ToL2Message => &mut self.l1_to_l2_message_tree,
            TreeKind::Archive => &mut self.archive,
        };

        let values = extract_optional_leaves(tree, leaves, as_value)?;
        let (first_index, new_subtree_sibling_path) = append_only
            .batch_insert_subtree(&values, subtree_height)
            .map_err(tree_error(tree))?;
        Ok(BatchInsertion::Appended { first_index, new_subtree_sibling_path })
    }

    fn batch_insert_subtrees(
        &mut self,
        tree: TreeKind,
        leaves: &[Option<Leaf>],
        subtree_height: u8,
    ) -> Result<Vec<BatchInsertion>, WorldStateError> {
        match tree {
            TreeKind::Nullifier => {
                let leaves = extract_optional_leaves(tree, leaves, as_nullifier)?;
                let results = self
                    .nullifier_tree
                    .batch_insert_subtrees(&leaves, subtree_height)
                    .map_err(tree_error(tree))?;
                Ok(results.into_iter().map(BatchInsertion::Nullifier).collect())
            },
            TreeKind::PublicData => {
                let leaves = extract_optional_leaves(tree, leaves, as_public_data)?;
                let results = self
                    .public_data_tree
                    .batch_insert_subtrees(&leaves, subtree_height)
                    .map_err(tree_error(tree))?;
                Ok(results.into_iter().map(BatchInsertion::PublicData).collect())
            },
            _ => Err(WorldStateError::NotIndexed(tree)),
        }
    }

    #[instrument(target = COMPONENT, skip_all, err)]
    fn commit(&mut self) -> Result<BlockNumber, WorldStateError> {
        self.nullifier_tree.commit();
        self.public_data_tree.commit();
        self.note_hash_tree.commit();
        self.l1_to_l2_message_tree.commit();
        self.archive.commit();

        let block_num = self.latest_block.child();
        self.history.insert(block_num, Arc::new(self.committed_versions()));
        self.latest_block = block_num;

        info!(
            target: COMPONENT,
            %block_num,
            nullifier_tree_size = self.nullifier_tree.version(false).size(),
            public_data_tree_size = self.public_data_tree.version(false).size(),
            note_hash_tree_size = self.note_hash_tree.version(false).size(),
            "committed block"
        );
        Ok(block_num)
    }

    fn rollback(&mut self) -> Result<(), WorldStateError> {
        self.nullifier_tree.rollback();
        self.public_data_tree.rollback();
        self.note_hash_tree.rollback();
        self.l1_to_l2_message_tree.rollback();
        self.archive.rollback();

        debug!(
            target: COMPONENT,
            latest_block = %self.latest_block,
            "rolled back uncommitted state"
        );
        Ok(())
    }
}

// LEAF CONVERSIONS
// ================================================================================================

fn tree_error(tree: TreeKind) -> impl FnOnce(TreeError) -> WorldStateError {
    move |source| WorldStateError::Tree { tree, source }
}

fn as_nullifier(leaf: &Leaf) -> Option<NullifierLeaf> {
    match leaf {
        Leaf::Nullifier(leaf) => Some(*leaf),
        _ => None,
    }
}

fn as_public_data(leaf: &Leaf) -> Option<PublicDataLeaf> {
    match leaf {
        Leaf::PublicData(leaf) => Some(*leaf),
        _ => None,
    }
}

fn as_value(leaf: &Leaf) -> Option<Felt> {
    match leaf {
        Leaf::Value(value) => Some(*value),
        _ => None,
    }
}

/// Converts generic leaves into the leaf type of `tree`.
fn extract_leaves<T>(
    tree: TreeKind,
    leaves: &[Leaf],
    extract: fn(&Leaf) -> Option<T>,
) -> Result<Vec<T>, WorldStateError> {
    leaves
        .iter()
        .map(|leaf| extract(leaf).ok_or(WorldStateError::LeafKindMismatch { tree, leaf: *leaf }))
        .collect()
}

/// Converts generic leaves into the leaf type of `tree`, keeping `None` entries.
fn extract_optional_leaves<T>(
    tree: TreeKind,
    leaves: &[Option<Leaf>],
    extract: fn(&Leaf) -> Option<T>,
) -> Result<Vec<Option<T>>, WorldStateError> {
    leaves
        .iter()
        .map(|leaf| match leaf {
            None => Ok(None),
            Some(leaf) => extract(leaf)
                .map(Some)
                .ok_or(WorldStateError::LeafKindMismatch { tree, leaf: *leaf }),
        })
        .collect()
}
