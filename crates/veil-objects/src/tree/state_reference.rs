use alloc::vec::Vec;

use crate::{
    Digest, Felt,
    tree::TreeKind,
    utils::{
        push_digest,
        serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
    },
};

// TREE SNAPSHOT
// ================================================================================================

/// The root and size of a single tree at some point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeSnapshot {
    pub root: Digest,
    /// Number of leaves in the tree, which is also the index of the next leaf to be appended.
    pub size: u64,
}

impl TreeSnapshot {
    pub fn new(root: Digest, size: u64) -> Self {
        Self { root, size }
    }

    /// Returns `[root, size]` as field elements.
    pub fn to_fields(&self) -> Vec<Felt> {
        let mut fields = Vec::with_capacity(5);
        push_digest(&mut fields, &self.root);
        fields.push(Felt::new(self.size));
        fields
    }
}

impl Serializable for TreeSnapshot {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write(self.root);
        target.write_u64(self.size);
    }
}

impl Deserializable for TreeSnapshot {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let root = source.read()?;
        let size = source.read_u64()?;
        Ok(Self { root, size })
    }
}

// TREE INFO
// ================================================================================================

/// Describes a tree of the world state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeInfo {
    pub tree: TreeKind,
    pub root: Digest,
    pub size: u64,
    pub depth: u8,
}

impl TreeInfo {
    /// Returns the root and size of the tree.
    pub fn snapshot(&self) -> TreeSnapshot {
        TreeSnapshot::new(self.root, self.size)
    }

    /// Returns the number of leaves the tree can hold.
    pub fn capacity(&self) -> u128 {
        1u128 << self.depth
    }
}

// PARTIAL STATE REFERENCE
// ================================================================================================

/// Snapshots of the trees a transaction can write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PartialStateReference {
    pub note_hash_tree: TreeSnapshot,
    pub nullifier_tree: TreeSnapshot,
    pub public_data_tree: TreeSnapshot,
}

impl PartialStateReference {
    pub fn to_fields(&self) -> Vec<Felt> {
        let mut fields = self.note_hash_tree.to_fields();
        fields.extend(self.nullifier_tree.to_fields());
        fields.extend(self.public_data_tree.to_fields());
        fields
    }
}

impl Serializable for PartialStateReference {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.note_hash_tree.write_into(target);
        self.nullifier_tree.write_into(target);
        self.public_data_tree.write_into(target);
    }
}

impl Deserializable for PartialStateReference {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            note_hash_tree: source.read()?,
            nullifier_tree: source.read()?,
            public_data_tree: source.read()?,
        })
    }
}

// STATE REFERENCE
// ================================================================================================

/// Snapshots of every tree of the world state at some point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateReference {
    pub archive: TreeSnapshot,
    pub l1_to_l2_message_tree: TreeSnapshot,
    pub partial: PartialStateReference,
}

impl StateReference {
    /// Returns the snapshot of the given tree.
    pub fn tree(&self, tree: TreeKind) -> TreeSnapshot {
        match tree {
            TreeKind::Nullifier => self.partial.nullifier_tree,
            TreeKind::NoteHash => self.partial.note_hash_tree,
            TreeKind::PublicData => self.partial.public_data_tree,
            TreeKind::L1ToL2Message => self.l1_to_l2_message_tree,
            TreeKind::Archive => self.archive,
        }
    }

    pub fn to_fields(&self) -> Vec<Felt> {
        let mut fields = self.archive.to_fields();
        fields.extend(self.l1_to_l2_message_tree.to_fields());
        fields.extend(self.partial.to_fields());
        fields
    }
}

impl Serializable for StateReference {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.archive.write_into(target);
        self.l1_to_l2_message_tree.write_into(target);
        self.partial.write_into(target);
    }
}

impl Deserializable for StateReference {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            archive: source.read()?,
            l1_to_l2_message_tree: source.read()?,
            partial: source.read()?,
        })
    }
}
