use veil_objects::{
    Felt, ZERO,
    hints::{
        NullifierNonExistentReadRequestHints, NullifierNonExistentReadRequestHintsBuilder,
        NullifierReadRequestHints, NullifierReadRequestHintsBuilder, PublicDataLeafHint,
        PublicDataReadRequestHints, PublicDataReadRequestHintsBuilder, pad_public_data_hints,
    },
    transaction::{
        CircuitArray, Nullifier, PublicDataRead, PublicDataUpdateRequest, ReadRequest, SideEffect,
    },
    tree::TreeKind,
};
use veil_world_state::MerkleTreeReadOperations;

use crate::HintError;

// HINTS BUILDER
// ================================================================================================

/// Resolves the read requests of a transaction against its own pending side effects and the
/// settled state of a world state view.
///
/// Every resolver is a pure function of its inputs and the view, so a builder over a shared
/// [`veil_world_state::SnapshotView`] can be used from several threads at once.
#[derive(Debug)]
pub struct HintsBuilder<'a, T> {
    state: &'a T,
}

impl<'a, T: MerkleTreeReadOperations> HintsBuilder<'a, T> {
    /// Creates a builder reading settled state from `state`.
    pub fn new(state: &'a T) -> Self {
        Self { state }
    }

    // NULLIFIER READ REQUESTS
    // --------------------------------------------------------------------------------------------

    /// Builds the hints proving that every nullifier read request reads an existing nullifier.
    ///
    /// A read is satisfied by a pending nullifier with the same value and a smaller counter,
    /// otherwise by the nullifier tree leaf holding the value.
    ///
    /// # Errors
    /// Returns an error if:
    /// - a read is satisfied neither by a pending nor by a settled nullifier.
    /// - there are more read requests than the hint arrays can hold.
    pub fn nullifier_read_request_hints(
        &self,
        read_requests: &[ReadRequest],
        pending_nullifiers: &[Nullifier],
    ) -> Result<NullifierReadRequestHints, HintError> {
        let mut builder =
            NullifierReadRequestHintsBuilder::new(self.tree_depth(TreeKind::Nullifier));

        for (index, read) in read_requests.iter().enumerate() {
            if read.is_empty() {
                continue;
            }

            let pending = pending_nullifiers.iter().position(|nullifier| {
                !nullifier.is_empty()
                    && nullifier.value == read.value
                    && nullifier.counter < read.counter
            });
            if let Some(pending_index) = pending {
                builder.add_pending_read_request(index, pending_index)?;
                continue;
            }

            let low_leaf = self.state.get_previous_value_index(TreeKind::Nullifier, read.value)?;
            let preimage = match self.state.nullifier_preimage(low_leaf.index)? {
                Some(preimage) if low_leaf.already_present => preimage,
                _ => {
                    return Err(HintError::UnsatisfiedReadRequest {
                        array: CircuitArray::NullifierReadRequests,
                        read_request_index: index,
                        value: read.value,
                    });
                },
            };
            let witness = self.state.membership_witness(TreeKind::Nullifier, low_leaf.index)?;
            builder.add_settled_read_request(index, witness, preimage)?;
        }

        Ok(builder.build())
    }

    // NULLIFIER NON-EXISTENT READ REQUESTS
    // --------------------------------------------------------------------------------------------

    /// Builds the hints proving that the values of the non-existence read requests are neither
    /// pending nor settled nullifiers.
    ///
    /// # Errors
    /// Returns an error if:
    /// - a checked value equals a pending nullifier or is present in the nullifier tree.
    /// - there are more read requests or pending nullifiers than the hint arrays can hold.
    pub fn nullifier_non_existent_read_request_hints(
        &self,
        read_requests: &[ReadRequest],
        pending_nullifiers: &[Nullifier],
    ) -> Result<NullifierNonExistentReadRequestHints, HintError> {
        let mut builder = NullifierNonExistentReadRequestHintsBuilder::new(
            pending_nullifiers,
            self.tree_depth(TreeKind::Nullifier),
        )?;

        for (index, read) in read_requests.iter().enumerate() {
            if read.is_empty() {
                continue;
            }

            let unexpected = |pending| HintError::UnexpectedExistence {
                read_request_index: index,
                value: read.value,
                pending,
            };

            if builder.sorted_pending_values().iter().any(|nullifier| nullifier.value == read.value)
            {
                return Err(unexpected(true));
            }

            let low_leaf = self.state.get_previous_value_index(TreeKind::Nullifier, read.value)?;
            if low_leaf.already_present {
                return Err(unexpected(false));
            }

            // the low leaf of an existing key range is always occupied
            let Some(preimage) = self.state.nullifier_preimage(low_leaf.index)? else {
                return Err(HintError::UnsatisfiedReadRequest {
                    array: CircuitArray::NullifierNonExistentReadRequests,
                    read_request_index: index,
                    value: read.value,
                });
            };
            let witness = self.state.membership_witness(TreeKind::Nullifier, low_leaf.index)?;
            let next_pending_value_index = builder.next_pending_value_index(read.value);
            builder.add_hint(witness, preimage, next_pending_value_index)?;
        }

        Ok(builder.build())
    }

    // PUBLIC DATA
    // --------------------------------------------------------------------------------------------

    /// Builds one [`PublicDataLeafHint`] per distinct slot the transaction reads or writes, in
    /// first-seen order with reads before writes, padded to the hint array length.
    ///
    /// # Errors
    /// Returns an error if:
    /// - the public data tree has no leaf for a slot.
    /// - the distinct slots exceed the public data hint array.
    pub fn public_data_hints(
        &self,
        reads: &[PublicDataRead],
        update_requests: &[PublicDataUpdateRequest],
    ) -> Result<Vec<PublicDataLeafHint>, HintError> {
        let read_slots = reads.iter().filter(|read| !read.is_empty()).map(|read| read.leaf_slot);
        let write_slots = update_requests
            .iter()
            .filter(|write| !write.is_empty())
            .map(|write| write.leaf_slot);

        let mut slots: Vec<Felt> = Vec::new();
        for slot in read_slots.chain(write_slots) {
            if !slots.contains(&slot) {
                slots.push(slot);
            }
        }

        let hints = slots
            .into_iter()
            .map(|slot| self.public_data_hint(slot))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pad_public_data_hints(hints, self.tree_depth(TreeKind::PublicData))?)
    }

    /// Builds the hints proving the value of every public data read.
    ///
    /// A read observes the latest pending write to its slot with a smaller counter, otherwise
    /// the settled value held by the entry of `public_data_hints` for its slot.
    ///
    /// # Errors
    /// Returns an error if:
    /// - the value of a read differs from the value it observes.
    /// - `public_data_hints` has no entry for the slot of a settled read.
    /// - there are more reads than the hint arrays can hold.
    pub fn public_data_read_request_hints(
        &self,
        reads: &[PublicDataRead],
        update_requests: &[PublicDataUpdateRequest],
        public_data_hints: &[PublicDataLeafHint],
    ) -> Result<PublicDataReadRequestHints, HintError> {
        let mut builder = PublicDataReadRequestHintsBuilder::new();

        for (index, read) in reads.iter().enumerate() {
            if read.is_empty() {
                continue;
            }

            let unsatisfied = HintError::UnsatisfiedReadRequest {
                array: CircuitArray::PublicDataReads,
                read_request_index: index,
                value: read.value,
            };

            let pending = update_requests
                .iter()
                .enumerate()
                .filter(|(_, write)| {
                    !write.is_empty()
                        && write.leaf_slot == read.leaf_slot
                        && write.counter < read.counter
                })
                .max_by_key(|(_, write)| write.counter);

            if let Some((write_index, write)) = pending {
                if write.new_value != read.value {
                    return Err(unsatisfied);
                }
                builder.add_pending_read_request(index, write_index)?;
                continue;
            }

            let Some(hint_index) =
                public_data_hints.iter().position(|hint| hint.leaf_slot == read.leaf_slot)
            else {
                return Err(HintError::InvalidPublicDataHint { slot: read.leaf_slot });
            };
            if public_data_hints[hint_index].value != read.value {
                return Err(unsatisfied);
            }
            builder.add_leaf_data_read_request(index, hint_index)?;
        }

        Ok(builder.build())
    }

    // HELPERS
    // --------------------------------------------------------------------------------------------

    fn public_data_hint(&self, slot: Felt) -> Result<PublicDataLeafHint, HintError> {
        let low_leaf = self.state.get_previous_value_index(TreeKind::PublicData, slot)?;
        let Some(leaf_preimage) = self.state.public_data_preimage(low_leaf.index)? else {
            return Err(HintError::InvalidPublicDataHint { slot });
        };
        let value = if low_leaf.already_present { leaf_preimage.value } else { ZERO };
        let membership_witness =
            self.state.membership_witness(TreeKind::PublicData, low_leaf.index)?;

        Ok(PublicDataLeafHint {
            leaf_slot: slot,
            value,
            membership_witness,
            leaf_preimage,
        })
    }

    fn tree_depth(&self, tree: TreeKind) -> u8 {
        self.state.get_tree_info(tree).depth
    }
}
