use alloc::string::ToString;
use core::fmt;

use crate::{
    ARCHIVE_TREE_DEPTH, L1_TO_L2_MESSAGE_TREE_DEPTH, LeafCodecError, NOTE_HASH_TREE_DEPTH,
    NULLIFIER_TREE_DEPTH, PUBLIC_DATA_TREE_DEPTH,
    utils::serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
};

// TREE KIND
// ================================================================================================

/// Identifies one of the trees that make up the world state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum TreeKind {
    Nullifier = 0,
    NoteHash = 1,
    PublicData = 2,
    L1ToL2Message = 3,
    Archive = 4,
}

impl TreeKind {
    /// All tree kinds, in tag order.
    pub const ALL: [TreeKind; 5] = [
        TreeKind::Nullifier,
        TreeKind::NoteHash,
        TreeKind::PublicData,
        TreeKind::L1ToL2Message,
        TreeKind::Archive,
    ];

    /// Returns true if leaves of this tree are linked by key (indexed tree) rather than simply
    /// appended.
    pub const fn is_indexed(&self) -> bool {
        matches!(self, TreeKind::Nullifier | TreeKind::PublicData)
    }

    /// Returns the protocol default depth of this tree.
    pub const fn default_depth(&self) -> u8 {
        match self {
            TreeKind::Nullifier => NULLIFIER_TREE_DEPTH,
            TreeKind::NoteHash => NOTE_HASH_TREE_DEPTH,
            TreeKind::PublicData => PUBLIC_DATA_TREE_DEPTH,
            TreeKind::L1ToL2Message => L1_TO_L2_MESSAGE_TREE_DEPTH,
            TreeKind::Archive => ARCHIVE_TREE_DEPTH,
        }
    }

    /// Returns the `u8` tag of this tree kind.
    pub const fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for TreeKind {
    type Error = LeafCodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        TreeKind::ALL
            .into_iter()
            .find(|kind| kind.as_u8() == value)
            .ok_or(LeafCodecError::UnknownTreeKind(value))
    }
}

impl fmt::Display for TreeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TreeKind::Nullifier => "nullifier tree",
            TreeKind::NoteHash => "note hash tree",
            TreeKind::PublicData => "public data tree",
            TreeKind::L1ToL2Message => "L1 to L2 message tree",
            TreeKind::Archive => "archive tree",
        };
        f.write_str(name)
    }
}

impl Serializable for TreeKind {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u8(self.as_u8());
    }
}

impl Deserializable for TreeKind {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let tag = source.read_u8()?;
        TreeKind::try_from(tag).map_err(|err| DeserializationError::InvalidValue(err.to_string()))
    }
}
