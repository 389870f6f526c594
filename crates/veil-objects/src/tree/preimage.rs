use alloc::vec::Vec;
use core::fmt::Debug;

use crate::{
    Digest, Felt, Hasher, LeafCodecError, StarkField, ZERO,
    tree::{NullifierLeaf, PublicDataLeaf},
    utils::{
        felt_from_u64,
        serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
    },
};

// INDEXED LEAF PREIMAGE
// ================================================================================================

/// The full contents of an indexed tree leaf: its payload plus the pointer to the leaf holding
/// the next larger key.
///
/// Leaves of an indexed tree form a linked list sorted by key. A preimage with `next_index == 0`
/// holds the largest key in the tree, otherwise `key < next_key` and no key of the tree lies
/// strictly between the two.
pub trait IndexedLeafPreimage: Clone + Debug + PartialEq + Send + Sync + 'static {
    /// The leaf payload stored at this preimage.
    type Leaf: Copy + Debug + PartialEq + Send + Sync + 'static;

    /// Number of field elements of the preimage encoding.
    const NUM_FIELDS: usize;

    /// Whether inserting a key that is already present rewrites the existing leaf rather than
    /// failing.
    const UPDATABLE: bool;

    /// Builds a preimage from a leaf payload and the pointer to its successor.
    fn new(leaf: Self::Leaf, next_key: Felt, next_index: u64) -> Self;

    /// Returns the key of a leaf payload.
    fn leaf_key(leaf: &Self::Leaf) -> Felt;

    /// Returns the leaf payload holding `key` and a zero value, as used for the sentinel leaves
    /// a tree is prefilled with.
    fn leaf_with_key(key: Felt) -> Self::Leaf;

    /// Returns the leaf payload of this preimage.
    fn leaf(&self) -> Self::Leaf;

    fn key(&self) -> Felt;

    fn value(&self) -> Felt;

    fn next_key(&self) -> Felt;

    fn next_index(&self) -> u64;

    /// Returns the field elements of this preimage, which are also the leaf hash inputs.
    fn to_fields(&self) -> Vec<Felt>;

    /// Decodes a preimage from its field elements.
    ///
    /// # Errors
    /// Returns an error if `fields` does not contain exactly [`Self::NUM_FIELDS`] elements.
    fn from_fields(fields: &[Felt]) -> Result<Self, LeafCodecError>;

    /// Returns a copy of this preimage pointing at a new successor.
    fn with_next(&self, next_key: Felt, next_index: u64) -> Self {
        Self::new(self.leaf(), next_key, next_index)
    }

    /// Returns a copy of this preimage holding `leaf` while keeping the successor pointer.
    fn with_leaf(&self, leaf: Self::Leaf) -> Self {
        Self::new(leaf, self.next_key(), self.next_index())
    }

    /// Returns the key as the integer used to order leaves.
    fn key_int(&self) -> u64 {
        self.key().as_int()
    }

    /// Returns the hash of this preimage, which is the leaf node of the tree.
    fn hash(&self) -> Digest {
        Hasher::hash_elements(&self.to_fields())
    }

    /// Returns the all-zero preimage used as padding in fixed-size hint arrays.
    fn empty() -> Self;

    /// Returns true if every field of this preimage is zero.
    fn is_empty(&self) -> bool {
        self.to_fields().iter().all(|felt| *felt == ZERO)
    }
}

fn check_len(fields: &[Felt], expected: usize) -> Result<(), LeafCodecError> {
    if fields.len() != expected {
        return Err(LeafCodecError::InvalidLength { expected, actual: fields.len() });
    }
    Ok(())
}

// NULLIFIER LEAF PREIMAGE
// ================================================================================================

/// Preimage of a nullifier tree leaf, encoded as `[nullifier, next_nullifier, next_index]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NullifierLeafPreimage {
    pub nullifier: Felt,
    pub next_nullifier: Felt,
    pub next_index: u64,
}

impl IndexedLeafPreimage for NullifierLeafPreimage {
    type Leaf = NullifierLeaf;

    const NUM_FIELDS: usize = 3;
    const UPDATABLE: bool = false;

    fn new(leaf: NullifierLeaf, next_key: Felt, next_index: u64) -> Self {
        Self {
            nullifier: leaf.nullifier,
            next_nullifier: next_key,
            next_index,
        }
    }

    fn leaf_key(leaf: &NullifierLeaf) -> Felt {
        leaf.nullifier
    }

    fn leaf_with_key(key: Felt) -> NullifierLeaf {
        NullifierLeaf::new(key)
    }

    fn leaf(&self) -> NullifierLeaf {
        NullifierLeaf::new(self.nullifier)
    }

    fn key(&self) -> Felt {
        self.nullifier
    }

    /// The nullifier tree carries no value besides the key itself.
    fn value(&self) -> Felt {
        self.nullifier
    }

    fn next_key(&self) -> Felt {
        self.next_nullifier
    }

    fn next_index(&self) -> u64 {
        self.next_index
    }

    fn to_fields(&self) -> Vec<Felt> {
        vec![self.nullifier, self.next_nullifier, felt_from_u64(self.next_index)]
    }

    fn from_fields(fields: &[Felt]) -> Result<Self, LeafCodecError> {
        check_len(fields, Self::NUM_FIELDS)?;
        Ok(Self {
            nullifier: fields[0],
            next_nullifier: fields[1],
            next_index: fields[2].as_int(),
        })
    }

    fn empty() -> Self {
        Self::default()
    }
}

// PUBLIC DATA LEAF PREIMAGE
// ================================================================================================

/// Preimage of a public data tree leaf, encoded as `[slot, value, next_slot, next_index]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublicDataLeafPreimage {
    pub slot: Felt,
    pub value: Felt,
    pub next_slot: Felt,
    pub next_index: u64,
}

impl IndexedLeafPreimage for PublicDataLeafPreimage {
    type Leaf = PublicDataLeaf;

    const NUM_FIELDS: usize = 4;
    const UPDATABLE: bool = true;

    fn new(leaf: PublicDataLeaf, next_key: Felt, next_index: u64) -> Self {
        Self {
            slot: leaf.slot,
            value: leaf.value,
            next_slot: next_key,
            next_index,
        }
    }

    fn leaf_key(leaf: &PublicDataLeaf) -> Felt {
        leaf.slot
    }

    fn leaf_with_key(key: Felt) -> PublicDataLeaf {
        PublicDataLeaf::new(key, ZERO)
    }

    fn leaf(&self) -> PublicDataLeaf {
        PublicDataLeaf::new(self.slot, self.value)
    }

    fn key(&self) -> Felt {
        self.slot
    }

    fn value(&self) -> Felt {
        self.value
    }

    fn next_key(&self) -> Felt {
        self.next_slot
    }

    fn next_index(&self) -> u64 {
        self.next_index
    }

    fn to_fields(&self) -> Vec<Felt> {
        vec![self.slot, self.value, self.next_slot, felt_from_u64(self.next_index)]
    }

    fn from_fields(fields: &[Felt]) -> Result<Self, LeafCodecError> {
        check_len(fields, Self::NUM_FIELDS)?;
        Ok(Self {
            slot: fields[0],
            value: fields[1],
            next_slot: fields[2],
            next_index: fields[3].as_int(),
        })
    }

    fn empty() -> Self {
        Self::default()
    }
}

// LEAF PREIMAGE
// ================================================================================================

/// A preimage of either indexed tree, as returned by tree-agnostic lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafPreimage {
    Nullifier(NullifierLeafPreimage),
    PublicData(PublicDataLeafPreimage),
}

impl LeafPreimage {
    pub fn key(&self) -> Felt {
        match self {
            LeafPreimage::Nullifier(preimage) => preimage.key(),
            LeafPreimage::PublicData(preimage) => preimage.key(),
        }
    }

    pub fn next_key(&self) -> Felt {
        match self {
            LeafPreimage::Nullifier(preimage) => preimage.next_key(),
            LeafPreimage::PublicData(preimage) => preimage.next_key(),
        }
    }

    pub fn next_index(&self) -> u64 {
        match self {
            LeafPreimage::Nullifier(preimage) => preimage.next_index(),
            LeafPreimage::PublicData(preimage) => preimage.next_index(),
        }
    }

    pub fn to_fields(&self) -> Vec<Felt> {
        match self {
            LeafPreimage::Nullifier(preimage) => preimage.to_fields(),
            LeafPreimage::PublicData(preimage) => preimage.to_fields(),
        }
    }

    pub fn hash(&self) -> Digest {
        match self {
            LeafPreimage::Nullifier(preimage) => preimage.hash(),
            LeafPreimage::PublicData(preimage) => preimage.hash(),
        }
    }
}

impl From<NullifierLeafPreimage> for LeafPreimage {
    fn from(preimage: NullifierLeafPreimage) -> Self {
        LeafPreimage::Nullifier(preimage)
    }
}

impl From<PublicDataLeafPreimage> for LeafPreimage {
    fn from(preimage: PublicDataLeafPreimage) -> Self {
        LeafPreimage::PublicData(preimage)
    }
}

// SERIALIZATION
// ================================================================================================

impl Serializable for NullifierLeafPreimage {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write(self.nullifier);
        target.write(self.next_nullifier);
        target.write_u64(self.next_index);
    }
}

impl Deserializable for NullifierLeafPreimage {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            nullifier: source.read()?,
            next_nullifier: source.read()?,
            next_index: source.read_u64()?,
        })
    }
}

impl Serializable for PublicDataLeafPreimage {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write(self.slot);
        target.write(self.value);
        target.write(self.next_slot);
        target.write_u64(self.next_index);
    }
}

impl Deserializable for PublicDataLeafPreimage {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            slot: source.read()?,
            value: source.read()?,
            next_slot: source.read()?,
            next_index: source.read_u64()?,
        })
    }
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rand::{Rng, SeedableRng, rngs::SmallRng};

    use super::*;
    use crate::utils::serde::{Deserializable, Serializable};

    /// Tests that decoding the field encoding of random preimages returns the original preimage.
    #[test]
    fn preimage_fields_round_trip() -> anyhow::Result<()> {
        let mut rng = SmallRng::seed_from_u64(7);

        for _ in 0..32 {
            let nullifier = NullifierLeafPreimage {
                nullifier: Felt::new(rng.random::<u32>() as u64),
                next_nullifier: Felt::new(rng.random::<u32>() as u64),
                next_index: rng.random::<u32>() as u64,
            };
            assert_eq!(NullifierLeafPreimage::from_fields(&nullifier.to_fields())?, nullifier);

            let public_data = PublicDataLeafPreimage {
                slot: Felt::new(rng.random::<u32>() as u64),
                value: Felt::new(rng.random::<u32>() as u64),
                next_slot: Felt::new(rng.random::<u32>() as u64),
                next_index: rng.random::<u32>() as u64,
            };
            assert_eq!(PublicDataLeafPreimage::from_fields(&public_data.to_fields())?, public_data);
            assert_eq!(PublicDataLeafPreimage::read_from_bytes(&public_data.to_bytes())?, public_data);
        }

        Ok(())
    }

    /// Tests that decoding rejects field slices of the wrong length.
    #[test]
    fn from_fields_rejects_wrong_length() {
        let error = NullifierLeafPreimage::from_fields(&[ZERO; 4]).unwrap_err();
        assert_matches!(error, LeafCodecError::InvalidLength { expected: 3, actual: 4 });

        let error = PublicDataLeafPreimage::from_fields(&[ZERO; 2]).unwrap_err();
        assert_matches!(error, LeafCodecError::InvalidLength { expected: 4, actual: 2 });
    }

    /// Tests that a preimage hashes its field encoding.
    #[test]
    fn preimage_hash_matches_fields() {
        let preimage = NullifierLeafPreimage {
            nullifier: Felt::new(5),
            next_nullifier: Felt::new(9),
            next_index: 4,
        };
        let expected = Hasher::hash_elements(&[Felt::new(5), Felt::new(9), Felt::new(4)]);

        assert_eq!(preimage.hash(), expected);
        assert_eq!(LeafPreimage::from(preimage).hash(), expected);
    }
}
