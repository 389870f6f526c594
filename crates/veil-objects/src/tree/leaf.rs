use alloc::vec::Vec;

use crate::{
    Digest, Felt, Hasher, ZERO,
    tree::TreeKind,
    utils::serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
};

// NULLIFIER LEAF
// ================================================================================================

/// The payload of a nullifier tree leaf: the nullifier itself, which doubles as the leaf key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullifierLeaf {
    pub nullifier: Felt,
}

impl NullifierLeaf {
    pub fn new(nullifier: Felt) -> Self {
        Self { nullifier }
    }
}

// PUBLIC DATA LEAF
// ================================================================================================

/// The payload of a public data tree leaf: a storage slot (the leaf key) and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicDataLeaf {
    pub slot: Felt,
    pub value: Felt,
}

impl PublicDataLeaf {
    pub fn new(slot: Felt, value: Felt) -> Self {
        Self { slot, value }
    }
}

// LEAF
// ================================================================================================

/// A leaf of any world state tree, as supplied for insertion or returned by value lookups.
///
/// Append-only trees (note hashes, messages, archive) store raw [`Leaf::Value`]s; the indexed
/// trees store their dedicated leaf types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leaf {
    Nullifier(NullifierLeaf),
    PublicData(PublicDataLeaf),
    Value(Felt),
}

impl Leaf {
    /// Returns true if this leaf can be stored in a tree of the given kind.
    pub fn fits(&self, tree: TreeKind) -> bool {
        match self {
            Leaf::Nullifier(_) => tree == TreeKind::Nullifier,
            Leaf::PublicData(_) => tree == TreeKind::PublicData,
            Leaf::Value(_) => !tree.is_indexed(),
        }
    }

    /// Returns the field elements of this leaf.
    pub fn to_fields(&self) -> Vec<Felt> {
        match self {
            Leaf::Nullifier(leaf) => vec![leaf.nullifier],
            Leaf::PublicData(leaf) => vec![leaf.slot, leaf.value],
            Leaf::Value(value) => vec![*value],
        }
    }

    /// Returns true if every field of this leaf is zero.
    pub fn is_empty(&self) -> bool {
        self.to_fields().iter().all(|felt| *felt == ZERO)
    }
}

/// Hashes a raw value leaf of an append-only tree.
pub fn hash_value_leaf(value: Felt) -> Digest {
    Hasher::hash_elements(&[value])
}

// SERIALIZATION
// ================================================================================================

const NULLIFIER_TAG: u8 = 0;
const PUBLIC_DATA_TAG: u8 = 1;
const VALUE_TAG: u8 = 2;

impl Serializable for Leaf {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        match self {
            Leaf::Nullifier(leaf) => {
                target.write_u8(NULLIFIER_TAG);
                target.write(leaf.nullifier);
            },
            Leaf::PublicData(leaf) => {
                target.write_u8(PUBLIC_DATA_TAG);
                target.write(leaf.slot);
                target.write(leaf.value);
            },
            Leaf::Value(value) => {
                target.write_u8(VALUE_TAG);
                target.write(*value);
            },
        }
    }
}

impl Deserializable for Leaf {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        match source.read_u8()? {
            NULLIFIER_TAG => Ok(Leaf::Nullifier(NullifierLeaf::new(source.read()?))),
            PUBLIC_DATA_TAG => {
                let slot = source.read()?;
                let value = source.read()?;
                Ok(Leaf::PublicData(PublicDataLeaf::new(slot, value)))
            },
            VALUE_TAG => Ok(Leaf::Value(source.read()?)),
            tag => Err(DeserializationError::InvalidValue(format!("unknown leaf tag {tag}"))),
        }
    }
}

impl From<NullifierLeaf> for Leaf {
    fn from(leaf: NullifierLeaf) -> Self {
        Leaf::Nullifier(leaf)
    }
}

impl From<PublicDataLeaf> for Leaf {
    fn from(leaf: PublicDataLeaf) -> Self {
        Leaf::PublicData(leaf)
    }
}
