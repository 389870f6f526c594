use core::fmt;

use crate::utils::serde::{
    ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable,
};

// BLOCK NUMBER
// ================================================================================================

/// Height of a block in the chain a world state follows.
///
/// The trees as they are created form block `0`. Committing the uncommitted state or syncing a
/// block moves the world state to the following height.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockNumber(u32);

impl BlockNumber {
    pub const GENESIS: Self = Self(0);

    /// Returns the block built on top of this one.
    pub fn child(self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the block this one is built on, or `None` for the genesis block.
    pub fn parent(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }
}

impl From<u32> for BlockNumber {
    fn from(height: u32) -> Self {
        Self(height)
    }
}

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Serializable for BlockNumber {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u32(self.0);
    }
}

impl Deserializable for BlockNumber {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        source.read_u32().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::BlockNumber;

    #[test]
    fn parent_and_child_are_inverse() {
        let block = BlockNumber::from(7);

        assert_eq!(block.child().parent(), Some(block));
        assert_eq!(block.parent().map(BlockNumber::child), Some(block));
        assert_eq!(BlockNumber::GENESIS.parent(), None);
        assert_eq!(BlockNumber::GENESIS.child(), BlockNumber::from(1));
        assert!(block < block.child());
        assert_eq!(block.to_string(), "#7");
    }
}
