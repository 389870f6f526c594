use alloc::vec::Vec;

use crate::{
    AccumulatedDataError, Felt, MAX_NULLIFIER_NON_EXISTENT_READ_REQUESTS_PER_TX,
    MAX_NULLIFIERS_PER_TX, StarkField,
    transaction::{CircuitArray, Nullifier, SideEffect},
    tree::{IndexedLeafPreimage, MembershipWitness, NullifierLeafPreimage},
    utils::serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
};

// NON-MEMBERSHIP HINT
// ================================================================================================

/// Proves that a value is absent from the nullifier tree: the low leaf has a smaller key and
/// either points past the value or is the last leaf of the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonMembershipHint {
    pub membership_witness: MembershipWitness,
    pub leaf_preimage: NullifierLeafPreimage,
}

impl NonMembershipHint {
    pub fn empty(tree_depth: u8) -> Self {
        Self {
            membership_witness: MembershipWitness::empty(tree_depth),
            leaf_preimage: NullifierLeafPreimage::empty(),
        }
    }

    /// Returns true if this hint proves the absence of `value`.
    pub fn proves_absence_of(&self, value: Felt) -> bool {
        let value = value.as_int();
        let low = &self.leaf_preimage;
        low.nullifier.as_int() < value
            && (low.next_index == 0 || value < low.next_nullifier.as_int())
    }

    pub fn to_fields(&self) -> Vec<Felt> {
        let mut fields = self.membership_witness.to_fields();
        fields.extend(self.leaf_preimage.to_fields());
        fields
    }
}

// NULLIFIER NON-EXISTENT READ REQUEST HINTS
// ================================================================================================

/// Hints proving that the values of a transaction's non-existence read requests are neither in
/// the nullifier tree nor among the transaction's own pending nullifiers.
///
/// Absence from the pending nullifiers is proven against a copy of them sorted by value: for each
/// read, `next_pending_value_indices` points at the first sorted value greater than the read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullifierNonExistentReadRequestHints {
    non_membership_hints: Vec<NonMembershipHint>,
    sorted_pending_values: Vec<Nullifier>,
    sorted_pending_value_index_hints: Vec<u32>,
    next_pending_value_indices: Vec<u32>,
}

impl NullifierNonExistentReadRequestHints {
    /// Returns hints for a transaction without non-existence read requests or pending
    /// nullifiers.
    pub fn empty(tree_depth: u8) -> Self {
        NullifierNonExistentReadRequestHintsBuilder::sorted(&[], tree_depth).build()
    }

    pub fn non_membership_hints(&self) -> &[NonMembershipHint] {
        &self.non_membership_hints
    }

    pub fn sorted_pending_values(&self) -> &[Nullifier] {
        &self.sorted_pending_values
    }

    pub fn sorted_pending_value_index_hints(&self) -> &[u32] {
        &self.sorted_pending_value_index_hints
    }

    pub fn next_pending_value_indices(&self) -> &[u32] {
        &self.next_pending_value_indices
    }

    pub fn to_fields(&self) -> Vec<Felt> {
        let mut fields = Vec::new();
        for hint in &self.non_membership_hints {
            fields.extend(hint.to_fields());
        }
        for value in &self.sorted_pending_values {
            fields.extend(value.to_fields());
        }
        fields.extend(self.sorted_pending_value_index_hints.iter().copied().map(Felt::from));
        fields.extend(self.next_pending_value_indices.iter().copied().map(Felt::from));
        fields
    }
}

// BUILDER
// ================================================================================================

/// Sorts the pending nullifiers of a transaction and collects non-membership hints.
#[derive(Debug, Clone)]
pub struct NullifierNonExistentReadRequestHintsBuilder {
    tree_depth: u8,
    non_membership_hints: Vec<NonMembershipHint>,
    sorted_pending_values: Vec<Nullifier>,
    sorted_pending_value_index_hints: Vec<u32>,
    next_pending_value_indices: Vec<u32>,
}

impl NullifierNonExistentReadRequestHintsBuilder {
    /// Creates a builder for the provided pending nullifiers, which may contain padding.
    ///
    /// # Errors
    /// Returns an error if a non-empty nullifier sits beyond the nullifier array of a
    /// transaction, as it could not be given a sorted position in the hints.
    pub fn new(
        pending_nullifiers: &[Nullifier],
        tree_depth: u8,
    ) -> Result<Self, AccumulatedDataError> {
        let limit = CircuitArray::Nullifiers.max_len();
        let used = pending_nullifiers
            .iter()
            .rposition(|nullifier| !nullifier.is_empty())
            .map_or(0, |index| index + 1);
        if used > limit {
            return Err(AccumulatedDataError::CapacityExceeded {
                array: CircuitArray::Nullifiers,
                limit,
                actual: used,
            });
        }

        Ok(Self::sorted(pending_nullifiers, tree_depth))
    }

    /// Sorts pending nullifiers which are known to fit the nullifier array.
    fn sorted(pending_nullifiers: &[Nullifier], tree_depth: u8) -> Self {
        let mut order: Vec<usize> = (0..pending_nullifiers.len())
            .filter(|&index| !pending_nullifiers[index].is_empty())
            .collect();
        order.sort_by_key(|&index| pending_nullifiers[index].value.as_int());

        let mut sorted_pending_value_index_hints: Vec<u32> =
            (0..MAX_NULLIFIERS_PER_TX as u32).collect();
        for (sorted_index, &original_index) in order.iter().enumerate() {
            sorted_pending_value_index_hints[original_index] = sorted_index as u32;
        }

        let sorted_pending_values =
            order.into_iter().map(|index| pending_nullifiers[index]).collect();

        Self {
            tree_depth,
            non_membership_hints: Vec::new(),
            sorted_pending_values,
            sorted_pending_value_index_hints,
            next_pending_value_indices: Vec::new(),
        }
    }

    /// Returns the pending nullifiers sorted by value, without padding.
    pub fn sorted_pending_values(&self) -> &[Nullifier] {
        &self.sorted_pending_values
    }

    /// Returns the index of the first sorted pending value greater than `value`, or the number
    /// of pending values if there is none.
    pub fn next_pending_value_index(&self, value: Felt) -> usize {
        let value = value.as_int();
        self.sorted_pending_values.partition_point(|pending| pending.value.as_int() <= value)
    }

    /// Adds the hint for the next non-existence read request.
    ///
    /// # Errors
    /// Returns an error if the hint array is already full.
    pub fn add_hint(
        &mut self,
        membership_witness: MembershipWitness,
        leaf_preimage: NullifierLeafPreimage,
        next_pending_value_index: usize,
    ) -> Result<(), AccumulatedDataError> {
        let limit = CircuitArray::NullifierNonExistentReadRequests.max_len();
        if self.non_membership_hints.len() == limit {
            return Err(AccumulatedDataError::CapacityExceeded {
                array: CircuitArray::NullifierNonExistentReadRequests,
                limit,
                actual: limit + 1,
            });
        }

        self.non_membership_hints.push(NonMembershipHint { membership_witness, leaf_preimage });
        self.next_pending_value_indices.push(next_pending_value_index as u32);
        Ok(())
    }

    pub fn build(mut self) -> NullifierNonExistentReadRequestHints {
        let max_reads = MAX_NULLIFIER_NON_EXISTENT_READ_REQUESTS_PER_TX;
        self.non_membership_hints.resize(max_reads, NonMembershipHint::empty(self.tree_depth));
        self.next_pending_value_indices.resize(max_reads, 0);
        self.sorted_pending_values.resize(MAX_NULLIFIERS_PER_TX, Nullifier::empty());

        NullifierNonExistentReadRequestHints {
            non_membership_hints: self.non_membership_hints,
            sorted_pending_values: self.sorted_pending_values,
            sorted_pending_value_index_hints: self.sorted_pending_value_index_hints,
            next_pending_value_indices: self.next_pending_value_indices,
        }
    }
}

// SERIALIZATION
// ================================================================================================

impl Serializable for NonMembershipHint {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.membership_witness.write_into(target);
        self.leaf_preimage.write_into(target);
    }
}

impl Deserializable for NonMembershipHint {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            membership_witness: source.read()?,
            leaf_preimage: source.read()?,
        })
    }
}

impl Serializable for NullifierNonExistentReadRequestHints {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_many(&self.non_membership_hints);
        target.write_many(&self.sorted_pending_values);
        target.write_many(&self.sorted_pending_value_index_hints);
        target.write_many(&self.next_pending_value_indices);
    }
}

impl Deserializable for NullifierNonExistentReadRequestHints {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let max_reads = MAX_NULLIFIER_NON_EXISTENT_READ_REQUESTS_PER_TX;
        Ok(Self {
            non_membership_hints: source.read_many(max_reads)?,
            sorted_pending_values: source.read_many(MAX_NULLIFIERS_PER_TX)?,
            sorted_pending_value_index_hints: source.read_many(MAX_NULLIFIERS_PER_TX)?,
            next_pending_value_indices: source.read_many(max_reads)?,
        })
    }
}

// TESTS
// ================================================================================================
