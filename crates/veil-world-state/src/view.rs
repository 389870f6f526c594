use veil_objects::{
    Felt,
    tree::{
        IndexedLeafPreimage, Leaf, LeafPreimage, NullifierLeafPreimage, PartialStateReference,
        PublicDataLeafPreimage, SiblingPath, StateReference, TreeInfo, TreeKind,
    },
};

use crate::{
    MerkleTreeReadOperations, WorldStateError,
    tree::{IndexedTreeView, LowLeafInfo, TreeVersion},
};

/// Read access to one version of every tree.
#[derive(Debug, Clone, Copy)]
pub struct WorldStateView<'a> {
    nullifier_tree: IndexedTreeView<'a, NullifierLeafPreimage>,
    public_data_tree: IndexedTreeView<'a, PublicDataLeafPreimage>,
    note_hash_tree: &'a TreeVersion<Felt>,
    l1_to_l2_message_tree: &'a TreeVersion<Felt>,
    archive: &'a TreeVersion<Felt>,
}

impl<'a> WorldStateView<'a> {
    pub(crate) fn new(
        nullifier_tree: IndexedTreeView<'a, NullifierLeafPreimage>,
        public_data_tree: IndexedTreeView<'a, PublicDataLeafPreimage>,
        note_hash_tree: &'a TreeVersion<Felt>,
        l1_to_l2_message_tree: &'a TreeVersion<Felt>,
        archive: &'a TreeVersion<Felt>,
    ) -> Self {
        Self {
            nullifier_tree,
            public_data_tree,
            note_hash_tree,
            l1_to_l2_message_tree,
            archive,
        }
    }

    pub fn nullifier_tree(&self) -> IndexedTreeView<'a, NullifierLeafPreimage> {
        self.nullifier_tree
    }

    pub fn public_data_tree(&self) -> IndexedTreeView<'a, PublicDataLeafPreimage> {
        self.public_data_tree
    }

    /// Returns the snapshots of the trees a transaction writes to.
    pub fn partial_state_reference(&self) -> PartialStateReference {
        PartialStateReference {
            note_hash_tree: self.note_hash_tree.snapshot(),
            nullifier_tree: self.nullifier_tree.version().snapshot(),
            public_data_tree: self.public_data_tree.version().snapshot(),
        }
    }

    fn append_only(&self, tree: TreeKind) -> Option<&'a TreeVersion<Felt>> {
        match tree {
            TreeKind::NoteHash => Some(self.note_hash_tree),
            TreeKind::L1ToL2Message => Some(self.l1_to_l2_message_tree),
            TreeKind::Archive => Some(self.archive),
            TreeKind::Nullifier | TreeKind::PublicData => None,
        }
    }
}

impl MerkleTreeReadOperations for WorldStateView<'_> {
    fn get_tree_info(&self, tree: TreeKind) -> TreeInfo {
        match tree {
            TreeKind::Nullifier => self.nullifier_tree.info(tree),
            TreeKind::PublicData => self.public_data_tree.info(tree),
            TreeKind::NoteHash => self.note_hash_tree.info(tree),
            TreeKind::L1ToL2Message => self.l1_to_l2_message_tree.info(tree),
            TreeKind::Archive => self.archive.info(tree),
        }
    }

    fn get_state_reference(&self) -> StateReference {
        StateReference {
            archive: self.archive.snapshot(),
            l1_to_l2_message_tree: self.l1_to_l2_message_tree.snapshot(),
            partial: self.partial_state_reference(),
        }
    }

    fn get_sibling_path(&self, tree: TreeKind, index: u64) -> Result<SiblingPath, WorldStateError> {
        let path = match tree {
            TreeKind::Nullifier => self.nullifier_tree.version().sibling_path(index),
            TreeKind::PublicData => self.public_data_tree.version().sibling_path(index),
            TreeKind::NoteHash => self.note_hash_tree.sibling_path(index),
            TreeKind::L1ToL2Message => self.l1_to_l2_message_tree.sibling_path(index),
            TreeKind::Archive => self.archive.sibling_path(index),
        };
        path.map_err(|source| WorldStateError::Tree { tree, source })
    }

    fn get_previous_value_index(
        &self,
        tree: TreeKind,
        key: Felt,
    ) -> Result<LowLeafInfo, WorldStateError> {
        let low_leaf = match tree {
            TreeKind::Nullifier => self.nullifier_tree.find_low_leaf(key),
            TreeKind::PublicData => self.public_data_tree.find_low_leaf(key),
            _ => return Err(WorldStateError::NotIndexed(tree)),
        };
        low_leaf.map_err(|source| WorldStateError::Tree { tree, source })
    }

    fn get_leaf_preimage(
        &self,
        tree: TreeKind,
        index: u64,
    ) -> Result<Option<LeafPreimage>, WorldStateError> {
        match tree {
            TreeKind::Nullifier => {
                Ok(self.nullifier_tree.preimage(index).copied().map(LeafPreimage::Nullifier))
            },
            TreeKind::PublicData => {
                Ok(self.public_data_tree.preimage(index).copied().map(LeafPreimage::PublicData))
            },
            _ => Err(WorldStateError::NotIndexed(tree)),
        }
    }

    fn get_leaf_value(&self, tree: TreeKind, index: u64) -> Option<Leaf> {
        match tree {
            TreeKind::Nullifier => {
                self.nullifier_tree.preimage(index).map(|preimage| Leaf::Nullifier(preimage.leaf()))
            },
            TreeKind::PublicData => self
                .public_data_tree
                .preimage(index)
                .map(|preimage| Leaf::PublicData(preimage.leaf())),
            _ => self.append_only(tree)?.leaf(index).copied().map(Leaf::Value),
        }
    }

    fn find_leaf_index(&self, tree: TreeKind, leaf: &Leaf) -> Result<Option<u64>, WorldStateError> {
        match (tree, leaf) {
            (TreeKind::Nullifier, Leaf::Nullifier(leaf)) => {
                Ok(self.nullifier_tree.find_leaf_index(leaf))
            },
            (TreeKind::PublicData, Leaf::PublicData(leaf)) => {
                Ok(self.public_data_tree.find_leaf_index(leaf))
            },
            (_, Leaf::Value(value)) => match self.append_only(tree) {
                Some(version) => Ok(version.find_leaf(|stored| stored == value)),
                None => Err(WorldStateError::LeafKindMismatch { tree, leaf: *leaf }),
            },
            _ => Err(WorldStateError::LeafKindMismatch { tree, leaf: *leaf }),
        }
    }
}
