use alloc::vec::Vec;

use crate::{
    AccumulatedDataError, Felt, MAX_PUBLIC_DATA_HINTS, MAX_PUBLIC_DATA_READS_PER_TX, ZERO,
    hints::{PendingReadHint, ReadRequestState, ReadRequestStatus},
    transaction::CircuitArray,
    tree::{IndexedLeafPreimage, MembershipWitness, PublicDataLeafPreimage},
    utils::serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
};

// PUBLIC DATA LEAF HINT
// ================================================================================================

/// The settled value of a public storage slot together with the leaf proving it.
///
/// If the slot was never written, `leaf_preimage` is its low leaf and `value` is zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicDataLeafHint {
    pub leaf_slot: Felt,
    pub value: Felt,
    pub membership_witness: MembershipWitness,
    pub leaf_preimage: PublicDataLeafPreimage,
}

impl PublicDataLeafHint {
    pub fn empty(tree_depth: u8) -> Self {
        Self {
            leaf_slot: ZERO,
            value: ZERO,
            membership_witness: MembershipWitness::empty(tree_depth),
            leaf_preimage: PublicDataLeafPreimage::empty(),
        }
    }

    pub fn to_fields(&self) -> Vec<Felt> {
        let mut fields = vec![self.leaf_slot, self.value];
        fields.extend(self.membership_witness.to_fields());
        fields.extend(self.leaf_preimage.to_fields());
        fields
    }
}

/// Pads public data hints to [`MAX_PUBLIC_DATA_HINTS`] entries.
///
/// # Errors
/// Returns an error if more than [`MAX_PUBLIC_DATA_HINTS`] hints are provided.
pub fn pad_public_data_hints(
    mut hints: Vec<PublicDataLeafHint>,
    tree_depth: u8,
) -> Result<Vec<PublicDataLeafHint>, AccumulatedDataError> {
    if hints.len() > MAX_PUBLIC_DATA_HINTS {
        return Err(AccumulatedDataError::CapacityExceeded {
            array: CircuitArray::PublicDataHints,
            limit: MAX_PUBLIC_DATA_HINTS,
            actual: hints.len(),
        });
    }
    hints.resize(MAX_PUBLIC_DATA_HINTS, PublicDataLeafHint::empty(tree_depth));
    Ok(hints)
}

// LEAF DATA READ HINT
// ================================================================================================

/// Links a public data read to the public data hint holding the settled value of its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafDataReadHint {
    pub read_request_index: u32,
    pub data_hint_index: u32,
}

impl LeafDataReadHint {
    pub fn nada(max_reads: usize) -> Self {
        Self { read_request_index: max_reads as u32, data_hint_index: 0 }
    }

    pub fn to_fields(&self) -> Vec<Felt> {
        vec![Felt::from(self.read_request_index), Felt::from(self.data_hint_index)]
    }
}

// PUBLIC DATA READ REQUEST HINTS
// ================================================================================================

/// Hints proving the value of every public data read of a transaction, either from an earlier
/// write of the same transaction or from the settled public data tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicDataReadRequestHints {
    read_request_statuses: Vec<ReadRequestStatus>,
    pending_read_hints: Vec<PendingReadHint>,
    leaf_data_read_hints: Vec<LeafDataReadHint>,
}

impl PublicDataReadRequestHints {
    pub fn empty() -> Self {
        PublicDataReadRequestHintsBuilder::new().build()
    }

    pub fn read_request_statuses(&self) -> &[ReadRequestStatus] {
        &self.read_request_statuses
    }

    pub fn pending_read_hints(&self) -> &[PendingReadHint] {
        &self.pending_read_hints
    }

    pub fn leaf_data_read_hints(&self) -> &[LeafDataReadHint] {
        &self.leaf_data_read_hints
    }

    /// Returns the index of the pending write the read at `read_request_index` observes, if the
    /// read is satisfied by a pending write.
    pub fn pending_write_index(&self, read_request_index: usize) -> Option<u32> {
        let status = self.read_request_statuses.get(read_request_index)?;
        if status.state != ReadRequestState::Pending {
            return None;
        }
        self.pending_read_hints
            .get(status.hint_index as usize)
            .map(|hint| hint.pending_value_index)
    }

    /// Returns the index of the public data hint the read at `read_request_index` observes, if
    /// the read is satisfied by settled state.
    pub fn data_hint_index(&self, read_request_index: usize) -> Option<u32> {
        let status = self.read_request_statuses.get(read_request_index)?;
        if status.state != ReadRequestState::Settled {
            return None;
        }
        self.leaf_data_read_hints
            .get(status.hint_index as usize)
            .map(|hint| hint.data_hint_index)
    }

    pub fn to_fields(&self) -> Vec<Felt> {
        let mut fields = Vec::new();
        for status in &self.read_request_statuses {
            fields.extend(status.to_fields());
        }
        for hint in &self.pending_read_hints {
            fields.extend(hint.to_fields());
        }
        for hint in &self.leaf_data_read_hints {
            fields.extend(hint.to_fields());
        }
        fields
    }
}

// BUILDER
// ================================================================================================

#[derive(Debug, Clone)]
pub struct PublicDataReadRequestHintsBuilder {
    read_request_statuses: Vec<ReadRequestStatus>,
    pending_read_hints: Vec<PendingReadHint>,
    leaf_data_read_hints: Vec<LeafDataReadHint>,
}

impl PublicDataReadRequestHintsBuilder {
    pub fn new() -> Self {
        Self {
            read_request_statuses: vec![ReadRequestStatus::default(); MAX_PUBLIC_DATA_READS_PER_TX],
            pending_read_hints: Vec::new(),
            leaf_data_read_hints: Vec::new(),
        }
    }

    /// Records that the read at `read_request_index` observes the pending write at
    /// `pending_value_index`.
    ///
    /// # Errors
    /// Returns an error if `read_request_index` is outside the read array.
    pub fn add_pending_read_request(
        &mut self,
        read_request_index: usize,
        pending_value_index: usize,
    ) -> Result<(), AccumulatedDataError> {
        check_read_index(read_request_index)?;
        let hint_index = self.pending_read_hints.len() as u32;
        self.pending_read_hints.push(PendingReadHint {
            read_request_index: read_request_index as u32,
            pending_value_index: pending_value_index as u32,
        });
        self.read_request_statuses[read_request_index] = ReadRequestStatus::pending(hint_index);
        Ok(())
    }

    /// Records that the read at `read_request_index` observes the settled value held by the
    /// public data hint at `data_hint_index`.
    ///
    /// # Errors
    /// Returns an error if `read_request_index` is outside the read array.
    pub fn add_leaf_data_read_request(
        &mut self,
        read_request_index: usize,
        data_hint_index: usize,
    ) -> Result<(), AccumulatedDataError> {
        check_read_index(read_request_index)?;
        let hint_index = self.leaf_data_read_hints.len() as u32;
        self.leaf_data_read_hints.push(LeafDataReadHint {
            read_request_index: read_request_index as u32,
            data_hint_index: data_hint_index as u32,
        });
        self.read_request_statuses[read_request_index] = ReadRequestStatus::settled(hint_index);
        Ok(())
    }

    pub fn build(mut self) -> PublicDataReadRequestHints {
        let max = MAX_PUBLIC_DATA_READS_PER_TX;
        self.pending_read_hints.resize(max, PendingReadHint::nada(max));
        self.leaf_data_read_hints.resize(max, LeafDataReadHint::nada(max));

        PublicDataReadRequestHints {
            read_request_statuses: self.read_request_statuses,
            pending_read_hints: self.pending_read_hints,
            leaf_data_read_hints: self.leaf_data_read_hints,
        }
    }
}

impl Default for PublicDataReadRequestHintsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn check_read_index(read_request_index: usize) -> Result<(), AccumulatedDataError> {
    let limit = CircuitArray::PublicDataReads.max_len();
    if read_request_index >= limit {
        return Err(AccumulatedDataError::CapacityExceeded {
            array: CircuitArray::PublicDataReads,
            limit,
            actual: read_request_index + 1,
        });
    }
    Ok(())
}

// SERIALIZATION
// ================================================================================================

impl Serializable for PublicDataLeafHint {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write(self.leaf_slot);
        target.write(self.value);
        self.membership_witness.write_into(target);
        self.leaf_preimage.write_into(target);
    }
}

impl Deserializable for PublicDataLeafHint {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            leaf_slot: source.read()?,
            value: source.read()?,
            membership_witness: source.read()?,
            leaf_preimage: source.read()?,
        })
    }
}

impl Serializable for LeafDataReadHint {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u32(self.read_request_index);
        target.write_u32(self.data_hint_index);
    }
}

impl Deserializable for LeafDataReadHint {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            read_request_index: source.read_u32()?,
            data_hint_index: source.read_u32()?,
        })
    }
}

impl Serializable for PublicDataReadRequestHints {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_many(&self.read_request_statuses);
        target.write_many(&self.pending_read_hints);
        target.write_many(&self.leaf_data_read_hints);
    }
}

impl Deserializable for PublicDataReadRequestHints {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let max = MAX_PUBLIC_DATA_READS_PER_TX;
        Ok(Self {
            read_request_statuses: source.read_many(max)?,
            pending_read_hints: source.read_many(max)?,
            leaf_data_read_hints: source.read_many(max)?,
        })
    }
}
