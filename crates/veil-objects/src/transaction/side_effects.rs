use alloc::vec::Vec;
use core::fmt::Debug;

use crate::{
    Felt, ZERO,
    utils::serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
};

// SIDE EFFECT
// ================================================================================================

/// Position of a side effect within the execution of a transaction.
///
/// Counters are unique within a transaction and totally order its side effects.
pub type SideEffectCounter = u32;

/// A read or write a transaction performed, tagged with its counter.
pub trait SideEffect: Clone + Debug + PartialEq {
    /// Returns the counter of this side effect.
    fn counter(&self) -> SideEffectCounter;

    /// Returns the padding value of fixed-size arrays of this side effect.
    fn empty() -> Self;

    /// Returns true if this side effect is padding.
    fn is_empty(&self) -> bool {
        *self == Self::empty()
    }

    /// Returns the field elements of this side effect.
    fn to_fields(&self) -> Vec<Felt>;
}

// NOTE HASH
// ================================================================================================

/// A note commitment created by a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoteHash {
    pub value: Felt,
    pub counter: SideEffectCounter,
}

impl NoteHash {
    pub fn new(value: Felt, counter: SideEffectCounter) -> Self {
        Self { value, counter }
    }
}

impl SideEffect for NoteHash {
    fn counter(&self) -> SideEffectCounter {
        self.counter
    }

    fn empty() -> Self {
        Self::default()
    }

    fn to_fields(&self) -> Vec<Felt> {
        vec![self.value, Felt::from(self.counter)]
    }
}

// NULLIFIER
// ================================================================================================

/// A nullifier emitted by a transaction, optionally linked to the note hash it nullifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Nullifier {
    pub value: Felt,
    pub note_hash: Felt,
    pub counter: SideEffectCounter,
}

impl Nullifier {
    pub fn new(value: Felt, note_hash: Felt, counter: SideEffectCounter) -> Self {
        Self { value, note_hash, counter }
    }
}

impl SideEffect for Nullifier {
    fn counter(&self) -> SideEffectCounter {
        self.counter
    }

    fn empty() -> Self {
        Self::default()
    }

    fn to_fields(&self) -> Vec<Felt> {
        vec![self.value, self.note_hash, Felt::from(self.counter)]
    }
}

// PUBLIC DATA UPDATE REQUEST
// ================================================================================================

/// A write of `new_value` to a public storage slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublicDataUpdateRequest {
    pub leaf_slot: Felt,
    pub new_value: Felt,
    pub counter: SideEffectCounter,
}

impl PublicDataUpdateRequest {
    pub fn new(leaf_slot: Felt, new_value: Felt, counter: SideEffectCounter) -> Self {
        Self { leaf_slot, new_value, counter }
    }
}

impl SideEffect for PublicDataUpdateRequest {
    fn counter(&self) -> SideEffectCounter {
        self.counter
    }

    fn empty() -> Self {
        Self::default()
    }

    fn to_fields(&self) -> Vec<Felt> {
        vec![self.leaf_slot, self.new_value, Felt::from(self.counter)]
    }
}

// PUBLIC DATA READ
// ================================================================================================

/// A read of a public storage slot that observed `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublicDataRead {
    pub leaf_slot: Felt,
    pub value: Felt,
    pub counter: SideEffectCounter,
}

impl PublicDataRead {
    pub fn new(leaf_slot: Felt, value: Felt, counter: SideEffectCounter) -> Self {
        Self { leaf_slot, value, counter }
    }
}

impl SideEffect for PublicDataRead {
    fn counter(&self) -> SideEffectCounter {
        self.counter
    }

    fn empty() -> Self {
        Self::default()
    }

    fn to_fields(&self) -> Vec<Felt> {
        vec![self.leaf_slot, self.value, Felt::from(self.counter)]
    }
}

// READ REQUEST
// ================================================================================================

/// A request to prove that `value` exists (or does not exist) in a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadRequest {
    pub value: Felt,
    pub counter: SideEffectCounter,
}

impl ReadRequest {
    pub fn new(value: Felt, counter: SideEffectCounter) -> Self {
        Self { value, counter }
    }
}

impl SideEffect for ReadRequest {
    fn counter(&self) -> SideEffectCounter {
        self.counter
    }

    fn empty() -> Self {
        Self::default()
    }

    fn to_fields(&self) -> Vec<Felt> {
        vec![self.value, Felt::from(self.counter)]
    }
}

// SIDE EFFECT RECORD
// ================================================================================================

/// The kind of a raw side effect record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SideEffectKind {
    NullifierRead,
    NullifierNonExistentRead,
    NullifierWrite,
    NoteHashWrite,
    PublicDataRead,
    PublicDataWrite,
}

/// A side effect as reported by the execution simulator, before it is sorted into the typed
/// arrays of the kernel output.
///
/// `key` is the nullifier, note hash or storage slot. `value` is the value read or written for
/// public data records, the linked note hash for nullifier writes and ignored otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideEffectRecord {
    pub kind: SideEffectKind,
    pub key: Felt,
    pub value: Felt,
    pub counter: SideEffectCounter,
    /// Whether the effect is discarded when the revertible part of the transaction reverts.
    pub revertible: bool,
}

impl SideEffectRecord {
    pub fn new(kind: SideEffectKind, key: Felt, counter: SideEffectCounter) -> Self {
        Self {
            kind,
            key,
            value: ZERO,
            counter,
            revertible: true,
        }
    }

    /// Sets the value of this record.
    pub fn with_value(mut self, value: Felt) -> Self {
        self.value = value;
        self
    }

    /// Marks this record as part of the non-revertible phase.
    pub fn non_revertible(mut self) -> Self {
        self.revertible = false;
        self
    }
}

// SERIALIZATION
// ================================================================================================

macro_rules! serialize_side_effect {
    ($ty:ident { $($field:ident),+ }) => {
        impl Serializable for $ty {
            fn write_into<W: ByteWriter>(&self, target: &mut W) {
                $(target.write(self.$field);)+
            }
        }

        impl Deserializable for $ty {
            fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
                Ok(Self { $($field: source.read()?),+ })
            }
        }
    };
}

serialize_side_effect!(NoteHash { value, counter });
serialize_side_effect!(Nullifier { value, note_hash, counter });
serialize_side_effect!(PublicDataUpdateRequest { leaf_slot, new_value, counter });
serialize_side_effect!(PublicDataRead { leaf_slot, value, counter });
serialize_side_effect!(ReadRequest { value, counter });
