use alloc::vec::Vec;

use crate::{
    Felt,
    block::BlockNumber,
    tree::{PublicDataLeaf, StateReference},
    utils::serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
};

// TX EFFECT
// ================================================================================================

/// The state changes a single settled transaction applies to the world state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxEffect {
    pub note_hashes: Vec<Felt>,
    pub nullifiers: Vec<Felt>,
    /// Final public storage writes of the transaction, at most one per slot.
    pub public_data_writes: Vec<PublicDataLeaf>,
}

// L2 BLOCK DATA
// ================================================================================================

/// The data needed to bring the world state in line with a block produced elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L2BlockData {
    pub block_num: BlockNumber,
    /// State of every tree after the block has been applied, including the archive entry of the
    /// block itself.
    pub state_reference: StateReference,
    pub tx_effects: Vec<TxEffect>,
    pub l1_to_l2_messages: Vec<Felt>,
    pub block_hash: Felt,
}

impl L2BlockData {
    /// Returns the nullifiers of all transactions of the block, in transaction order.
    pub fn nullifiers(&self) -> impl Iterator<Item = Felt> + '_ {
        self.tx_effects.iter().flat_map(|effect| effect.nullifiers.iter().copied())
    }

    /// Returns the note hashes of all transactions of the block, in transaction order.
    pub fn note_hashes(&self) -> impl Iterator<Item = Felt> + '_ {
        self.tx_effects.iter().flat_map(|effect| effect.note_hashes.iter().copied())
    }
}

// SERIALIZATION
// ================================================================================================

impl Serializable for TxEffect {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_usize(self.note_hashes.len());
        target.write_many(&self.note_hashes);
        target.write_usize(self.nullifiers.len());
        target.write_many(&self.nullifiers);
        target.write_usize(self.public_data_writes.len());
        for write in &self.public_data_writes {
            target.write(write.slot);
            target.write(write.value);
        }
    }
}

impl Deserializable for TxEffect {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let num_note_hashes = source.read_usize()?;
        let note_hashes = source.read_many(num_note_hashes)?;
        let num_nullifiers = source.read_usize()?;
        let nullifiers = source.read_many(num_nullifiers)?;
        let num_writes = source.read_usize()?;
        let mut public_data_writes = Vec::with_capacity(num_writes);
        for _ in 0..num_writes {
            let slot = source.read()?;
            let value = source.read()?;
            public_data_writes.push(PublicDataLeaf::new(slot, value));
        }

        Ok(Self { note_hashes, nullifiers, public_data_writes })
    }
}

impl Serializable for L2BlockData {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.block_num.write_into(target);
        self.state_reference.write_into(target);
        target.write_usize(self.tx_effects.len());
        target.write_many(&self.tx_effects);
        target.write_usize(self.l1_to_l2_messages.len());
        target.write_many(&self.l1_to_l2_messages);
        target.write(self.block_hash);
    }
}

impl Deserializable for L2BlockData {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let block_num = source.read()?;
        let state_reference = source.read()?;
        let num_effects = source.read_usize()?;
        let tx_effects = source.read_many(num_effects)?;
        let num_messages = source.read_usize()?;
        let l1_to_l2_messages = source.read_many(num_messages)?;
        let block_hash = source.read()?;

        Ok(Self {
            block_num,
            state_reference,
            tx_effects,
            l1_to_l2_messages,
            block_hash,
        })
    }
}
