use alloc::vec::Vec;

use crate::{
    Digest, Felt,
    crypto::merkle::{EmptySubtreeRoots, MerkleError, MerklePath},
    utils::{
        push_digest,
        serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
    },
};

// SIBLING PATH
// ================================================================================================

/// The sibling hashes of a leaf, ordered from the leaf level up to the child of the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingPath(MerklePath);

impl SiblingPath {
    /// Creates a sibling path from the provided nodes, leaf level first.
    pub fn new(nodes: Vec<Digest>) -> Self {
        Self(MerklePath::new(nodes))
    }

    /// Returns the sibling path of any leaf of an empty tree of the given depth.
    pub fn empty(depth: u8) -> Self {
        let nodes = (0..depth)
            .map(|level| *EmptySubtreeRoots::entry(depth, depth - level))
            .collect();
        Self::new(nodes)
    }

    /// Returns the number of nodes in this path, which equals the depth of the tree.
    pub fn depth(&self) -> u8 {
        self.0.depth()
    }

    /// Returns the nodes of this path, leaf level first.
    pub fn nodes(&self) -> &[Digest] {
        &self.0
    }

    /// Returns the underlying Merkle path.
    pub fn as_merkle_path(&self) -> &MerklePath {
        &self.0
    }

    /// Computes the root of the tree from this path and the hash of the leaf at `index`.
    ///
    /// # Errors
    /// Returns an error if `index` does not fit into a tree of this path's depth.
    pub fn compute_root(&self, index: u64, leaf_hash: Digest) -> Result<Digest, MerkleError> {
        self.0.compute_root(index, leaf_hash)
    }

    /// Returns the field elements of all nodes of this path, leaf level first.
    pub fn to_fields(&self) -> Vec<Felt> {
        let mut fields = Vec::with_capacity(self.nodes().len() * 4);
        for node in self.nodes() {
            push_digest(&mut fields, node);
        }
        fields
    }
}

impl From<SiblingPath> for MerklePath {
    fn from(path: SiblingPath) -> Self {
        path.0
    }
}

impl Serializable for SiblingPath {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u8(self.depth());
        target.write_many(self.nodes());
    }
}

impl Deserializable for SiblingPath {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let depth = source.read_u8()?;
        let nodes = source.read_many::<Digest>(depth as usize)?;
        Ok(Self::new(nodes))
    }
}

// MEMBERSHIP WITNESS
// ================================================================================================

/// The position of a leaf in a tree together with its sibling path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipWitness {
    leaf_index: u64,
    sibling_path: SiblingPath,
}

impl MembershipWitness {
    pub fn new(leaf_index: u64, sibling_path: SiblingPath) -> Self {
        Self { leaf_index, sibling_path }
    }

    /// Returns the witness used to pad fixed-size hint arrays for a tree of the given depth.
    pub fn empty(depth: u8) -> Self {
        Self::new(0, SiblingPath::new(vec![Digest::default(); depth as usize]))
    }

    pub fn leaf_index(&self) -> u64 {
        self.leaf_index
    }

    pub fn sibling_path(&self) -> &SiblingPath {
        &self.sibling_path
    }

    /// Returns the root obtained by hashing `leaf_hash` up along this witness.
    ///
    /// # Errors
    /// Returns an error if the leaf index does not fit into the tree depth.
    pub fn compute_root(&self, leaf_hash: Digest) -> Result<Digest, MerkleError> {
        self.sibling_path.compute_root(self.leaf_index, leaf_hash)
    }

    /// Returns `[leaf_index, sibling_path...]` as field elements.
    pub fn to_fields(&self) -> Vec<Felt> {
        let mut fields = vec![Felt::new(self.leaf_index)];
        fields.extend(self.sibling_path.to_fields());
        fields
    }
}

impl Serializable for MembershipWitness {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u64(self.leaf_index);
        self.sibling_path.write_into(target);
    }
}

impl Deserializable for MembershipWitness {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let leaf_index = source.read_u64()?;
        let sibling_path = source.read()?;
        Ok(Self { leaf_index, sibling_path })
    }
}
