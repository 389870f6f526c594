use alloc::vec::Vec;

use crate::{
    AccumulatedDataError, Felt, MAX_NULLIFIER_READ_REQUESTS_PER_TX,
    transaction::CircuitArray,
    tree::{IndexedLeafPreimage, MembershipWitness, NullifierLeafPreimage},
    utils::serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
};

// READ REQUEST STATUS
// ================================================================================================

/// How a read request is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ReadRequestState {
    /// Padding, or a read request that has not been resolved.
    #[default]
    Nada = 0,
    /// Satisfied by a side effect of the same transaction.
    Pending = 1,
    /// Satisfied by a leaf of a committed tree.
    Settled = 2,
}

impl TryFrom<u8> for ReadRequestState {
    type Error = DeserializationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Nada),
            1 => Ok(Self::Pending),
            2 => Ok(Self::Settled),
            _ => Err(DeserializationError::InvalidValue(format!(
                "unknown read request state {value}"
            ))),
        }
    }
}

/// Points a read request at the hint that satisfies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadRequestStatus {
    pub state: ReadRequestState,
    /// Index into the pending or settled hints, depending on `state`.
    pub hint_index: u32,
}

impl ReadRequestStatus {
    pub fn pending(hint_index: u32) -> Self {
        Self { state: ReadRequestState::Pending, hint_index }
    }

    pub fn settled(hint_index: u32) -> Self {
        Self { state: ReadRequestState::Settled, hint_index }
    }

    pub fn to_fields(&self) -> Vec<Felt> {
        vec![Felt::from(self.state as u8), Felt::from(self.hint_index)]
    }
}

// PENDING READ HINT
// ================================================================================================

/// Links a read request to the pending side effect it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReadHint {
    pub read_request_index: u32,
    pub pending_value_index: u32,
}

impl PendingReadHint {
    /// Returns the padding hint of an array of read requests holding at most `max_reads`
    /// entries. Padding points one past the last read request.
    pub fn nada(max_reads: usize) -> Self {
        Self {
            read_request_index: max_reads as u32,
            pending_value_index: 0,
        }
    }

    pub fn to_fields(&self) -> Vec<Felt> {
        vec![Felt::from(self.read_request_index), Felt::from(self.pending_value_index)]
    }
}

// SETTLED READ HINT
// ================================================================================================

/// Links a nullifier read request to the committed leaf holding the nullifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledReadHint {
    pub read_request_index: u32,
    pub membership_witness: MembershipWitness,
    pub leaf_preimage: NullifierLeafPreimage,
}

impl SettledReadHint {
    pub fn nada(max_reads: usize, tree_depth: u8) -> Self {
        Self {
            read_request_index: max_reads as u32,
            membership_witness: MembershipWitness::empty(tree_depth),
            leaf_preimage: NullifierLeafPreimage::empty(),
        }
    }

    pub fn to_fields(&self) -> Vec<Felt> {
        let mut fields = vec![Felt::from(self.read_request_index)];
        fields.extend(self.membership_witness.to_fields());
        fields.extend(self.leaf_preimage.to_fields());
        fields
    }
}

// READ REQUEST RESOLUTION
// ================================================================================================

/// The resolution of a single nullifier read request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadRequestResolution<'a> {
    /// The read is satisfied by the pending nullifier at this index of the merged nullifiers.
    PendingMatch { pending_value_index: u32 },
    /// The read is satisfied by a committed leaf.
    Settled(&'a SettledReadHint),
}

// NULLIFIER READ REQUEST HINTS
// ================================================================================================

/// Hints proving that every nullifier read request of a transaction reads an existing
/// nullifier.
///
/// All arrays are padded to [`MAX_NULLIFIER_READ_REQUESTS_PER_TX`] entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullifierReadRequestHints {
    read_request_statuses: Vec<ReadRequestStatus>,
    pending_read_hints: Vec<PendingReadHint>,
    settled_read_hints: Vec<SettledReadHint>,
}

impl NullifierReadRequestHints {
    /// Returns hints for a transaction without nullifier read requests.
    pub fn empty(tree_depth: u8) -> Self {
        NullifierReadRequestHintsBuilder::new(tree_depth).build()
    }

    pub fn read_request_statuses(&self) -> &[ReadRequestStatus] {
        &self.read_request_statuses
    }

    pub fn pending_read_hints(&self) -> &[PendingReadHint] {
        &self.pending_read_hints
    }

    pub fn settled_read_hints(&self) -> &[SettledReadHint] {
        &self.settled_read_hints
    }

    /// Returns how the read request at `read_request_index` is satisfied, or `None` if it is
    /// padding.
    pub fn resolution(&self, read_request_index: usize) -> Option<ReadRequestResolution<'_>> {
        let status = self.read_request_statuses.get(read_request_index)?;
        match status.state {
            ReadRequestState::Nada => None,
            ReadRequestState::Pending => {
                let hint = self.pending_read_hints.get(status.hint_index as usize)?;
                Some(ReadRequestResolution::PendingMatch {
                    pending_value_index: hint.pending_value_index,
                })
            },
            ReadRequestState::Settled => self
                .settled_read_hints
                .get(status.hint_index as usize)
                .map(ReadRequestResolution::Settled),
        }
    }

    pub fn to_fields(&self) -> Vec<Felt> {
        let mut fields = Vec::new();
        for status in &self.read_request_statuses {
            fields.extend(status.to_fields());
        }
        for hint in &self.pending_read_hints {
            fields.extend(hint.to_fields());
        }
        for hint in &self.settled_read_hints {
            fields.extend(hint.to_fields());
        }
        fields
    }
}

// NULLIFIER READ REQUEST HINTS BUILDER
// ================================================================================================

/// Collects pending and settled hints for nullifier read requests and pads them on
/// [`NullifierReadRequestHintsBuilder::build`].
#[derive(Debug, Clone)]
pub struct NullifierReadRequestHintsBuilder {
    tree_depth: u8,
    read_request_statuses: Vec<ReadRequestStatus>,
    pending_read_hints: Vec<PendingReadHint>,
    settled_read_hints: Vec<SettledReadHint>,
}

impl NullifierReadRequestHintsBuilder {
    pub fn new(tree_depth: u8) -> Self {
        Self {
            tree_depth,
            read_request_statuses: vec![
                ReadRequestStatus::default();
                MAX_NULLIFIER_READ_REQUESTS_PER_TX
            ],
            pending_read_hints: Vec::new(),
            settled_read_hints: Vec::new(),
        }
    }

    /// Records that the read request at `read_request_index` reads the pending nullifier at
    /// `pending_value_index`.
    ///
    /// # Errors
    /// Returns an error if `read_request_index` is outside the read request array.
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

    /// Records that the read request at `read_request_index` reads a committed leaf.
    ///
    /// # Errors
    /// Returns an error if `read_request_index` is outside the read request array.
    pub fn add_settled_read_request(
        &mut self,
        read_request_index: usize,
        membership_witness: MembershipWitness,
        leaf_preimage: NullifierLeafPreimage,
    ) -> Result<(), AccumulatedDataError> {
        check_read_index(read_request_index)?;
        let hint_index = self.settled_read_hints.len() as u32;
        self.settled_read_hints.push(SettledReadHint {
            read_request_index: read_request_index as u32,
            membership_witness,
            leaf_preimage,
        });
        self.read_request_statuses[read_request_index] = ReadRequestStatus::settled(hint_index);
        Ok(())
    }

    pub fn build(mut self) -> NullifierReadRequestHints {
        let max = MAX_NULLIFIER_READ_REQUESTS_PER_TX;
        self.pending_read_hints.resize(max, PendingReadHint::nada(max));
        self.settled_read_hints.resize(max, SettledReadHint::nada(max, self.tree_depth));

        NullifierReadRequestHints {
            read_request_statuses: self.read_request_statuses,
            pending_read_hints: self.pending_read_hints,
            settled_read_hints: self.settled_read_hints,
        }
    }
}

fn check_read_index(read_request_index: usize) -> Result<(), AccumulatedDataError> {
    let limit = CircuitArray::NullifierReadRequests.max_len();
    if read_request_index >= limit {
        return Err(AccumulatedDataError::CapacityExceeded {
            array: CircuitArray::NullifierReadRequests,
            limit,
            actual: read_request_index + 1,
        });
    }
    Ok(())
}

// SERIALIZATION
// ================================================================================================

impl Serializable for ReadRequestStatus {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u8(self.state as u8);
        target.write_u32(self.hint_index);
    }
}

impl Deserializable for ReadRequestStatus {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let state = ReadRequestState::try_from(source.read_u8()?)?;
        let hint_index = source.read_u32()?;
        Ok(Self { state, hint_index })
    }
}

impl Serializable for PendingReadHint {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u32(self.read_request_index);
        target.write_u32(self.pending_value_index);
    }
}

impl Deserializable for PendingReadHint {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            read_request_index: source.read_u32()?,
            pending_value_index: source.read_u32()?,
        })
    }
}

impl Serializable for SettledReadHint {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u32(self.read_request_index);
        self.membership_witness.write_into(target);
        self.leaf_preimage.write_into(target);
    }
}

impl Deserializable for SettledReadHint {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            read_request_index: source.read_u32()?,
            membership_witness: source.read()?,
            leaf_preimage: source.read()?,
        })
    }
}

impl Serializable for NullifierReadRequestHints {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_many(&self.read_request_statuses);
        target.write_many(&self.pending_read_hints);
        target.write_many(&self.settled_read_hints);
    }
}

impl Deserializable for NullifierReadRequestHints {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let max = MAX_NULLIFIER_READ_REQUESTS_PER_TX;
        let read_request_statuses = source.read_many(max)?;
        let pending_read_hints = source.read_many(max)?;
        let settled_read_hints: Vec<SettledReadHint> = source.read_many(max)?;

        Ok(Self {
            read_request_statuses,
            pending_read_hints,
            settled_read_hints,
        })
    }
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    /// Tests that the builder pads every array and links statuses to their hints.
    #[test]
    fn builder_pads_and_links_hints() -> anyhow::Result<()> {
        let mut builder = NullifierReadRequestHintsBuilder::new(4);
        builder.add_pending_read_request(1, 5)?;
        builder.add_settled_read_request(
            0,
            MembershipWitness::empty(4),
            NullifierLeafPreimage { nullifier: Felt::new(3), ..Default::default() },
        )?;

        let hints = builder.build();

        assert_eq!(hints.read_request_statuses().len(), MAX_NULLIFIER_READ_REQUESTS_PER_TX);
        assert_eq!(hints.pending_read_hints().len(), MAX_NULLIFIER_READ_REQUESTS_PER_TX);
        assert_eq!(hints.settled_read_hints().len(), MAX_NULLIFIER_READ_REQUESTS_PER_TX);
        assert_eq!(
            hints.resolution(1),
            Some(ReadRequestResolution::PendingMatch { pending_value_index: 5 })
        );
        assert_matches!(
            hints.resolution(0),
            Some(ReadRequestResolution::Settled(hint)) if hint.leaf_preimage.nullifier == Felt::new(3)
        );
        assert_eq!(hints.resolution(2), None);
        assert_eq!(hints.to_fields().len(), NullifierReadRequestHints::empty(4).to_fields().len());

        Ok(())
    }

    /// Tests that read request indices outside of the array are rejected.
    #[test]
    fn builder_rejects_out_of_range_read_request() {
        let mut builder = NullifierReadRequestHintsBuilder::new(4);
        let error = builder
            .add_pending_read_request(MAX_NULLIFIER_READ_REQUESTS_PER_TX, 0)
            .unwrap_err();

        assert_matches!(error, AccumulatedDataError::CapacityExceeded { .. });
    }
}
