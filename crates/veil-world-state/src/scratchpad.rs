use std::collections::BTreeMap;

use tracing::debug;
use veil_objects::{
    Felt, PUBLIC_DATA_SUBTREE_HEIGHT, StarkField, ZERO,
    transaction::{PublicDataUpdateRequest, SideEffectCounter},
    tree::{Leaf, PublicDataLeaf, TreeKind},
};

use crate::{
    BatchInsertion, COMPONENT, MerkleTreeReadOperations, MerkleTreeWriteOperations,
    ScratchpadError,
};

// PUBLIC STATE SCRATCHPAD
// ================================================================================================

/// Buffers the public storage writes of a transaction on top of the public data tree.
///
/// Reads observe the latest buffered write made before them and fall back to the tree
/// otherwise. Nothing reaches the tree until [`PublicStateScratchpad::commit`].
#[derive(Debug, Clone, Default)]
pub struct PublicStateScratchpad {
    writes: Vec<PublicDataUpdateRequest>,
}

impl PublicStateScratchpad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers a write of `value` to `slot`.
    ///
    /// # Errors
    /// Returns an error if `counter` does not exceed the counter of the previous write.
    pub fn storage_write(
        &mut self,
        slot: Felt,
        value: Felt,
        counter: SideEffectCounter,
    ) -> Result<(), ScratchpadError> {
        if let Some(previous) = self.writes.last() {
            if counter <= previous.counter {
                return Err(ScratchpadError::CounterNotIncreasing {
                    previous: previous.counter,
                    current: counter,
                });
            }
        }

        self.writes.push(PublicDataUpdateRequest::new(slot, value, counter));
        Ok(())
    }

    /// Returns the value of `slot` as seen by a read with the given counter.
    ///
    /// # Errors
    /// Returns an error if the public data tree cannot be read.
    pub fn storage_read(
        &self,
        slot: Felt,
        counter: SideEffectCounter,
        state: &impl MerkleTreeReadOperations,
    ) -> Result<Felt, ScratchpadError> {
        let pending = self
            .writes
            .iter()
            .rev()
            .find(|write| write.leaf_slot == slot && write.counter < counter);
        if let Some(write) = pending {
            return Ok(write.new_value);
        }

        let low_leaf = state.get_previous_value_index(TreeKind::PublicData, slot)?;
        if !low_leaf.already_present {
            return Ok(ZERO);
        }
        let preimage = state.public_data_preimage(low_leaf.index)?;
        Ok(preimage.map(|preimage| preimage.value).unwrap_or(ZERO))
    }

    /// Returns every buffered write in the order it was made.
    pub fn pending_writes(&self) -> &[PublicDataUpdateRequest] {
        &self.writes
    }

    /// Returns the last buffered value of every written slot, sorted by slot.
    pub fn squashed_writes(&self) -> Vec<PublicDataLeaf> {
        let mut latest = BTreeMap::new();
        for write in &self.writes {
            let leaf = PublicDataLeaf::new(write.leaf_slot, write.new_value);
            latest.insert(write.leaf_slot.as_int(), leaf);
        }
        latest.into_values().collect()
    }

    /// Inserts the squashed writes into the public data tree of `state`, in subtrees of
    /// `2^PUBLIC_DATA_SUBTREE_HEIGHT` leaves with the last one padded.
    ///
    /// # Errors
    /// Returns an error if inserting any of the subtrees fails. No write reaches the tree then.
    pub fn commit(
        self,
        state: &mut impl MerkleTreeWriteOperations,
    ) -> Result<Vec<BatchInsertion>, ScratchpadError> {
        let subtree_size = 1usize << PUBLIC_DATA_SUBTREE_HEIGHT;
        let mut leaves: Vec<_> = self
            .squashed_writes()
            .into_iter()
            .map(|write| Some(Leaf::PublicData(write)))
            .collect();
        leaves.resize(leaves.len().next_multiple_of(subtree_size), None);

        let insertions = state.batch_insert_subtrees(
            TreeKind::PublicData,
            &leaves,
            PUBLIC_DATA_SUBTREE_HEIGHT,
        )?;

        debug!(
            target: COMPONENT,
            num_writes = self.writes.len(),
            num_subtrees = insertions.len(),
            "committed public state scratchpad"
        );
        Ok(insertions)
    }

    /// Discards every buffered write.
    pub fn rollback(self) {
        debug!(
            target: COMPONENT,
            num_writes = self.writes.len(),
            "rolled back public state scratchpad"
        );
    }
}
