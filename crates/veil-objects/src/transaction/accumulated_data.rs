use alloc::{string::ToString, vec::Vec};

use crate::{
    AccumulatedDataError, Felt,
    transaction::{CircuitArray, NoteHash, Nullifier, PublicDataUpdateRequest, SideEffect},
    utils::serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
};

// MERGER
// ================================================================================================

/// Merges the non-revertible and revertible parts of an accumulated array into one array sorted
/// by counter and padded to the fixed length of `array`.
///
/// Empty entries of either input are dropped before merging.
///
/// # Errors
/// Returns an error if:
/// - the inputs hold more non-empty entries than `array` can hold.
/// - two non-empty entries share a counter.
pub fn merge_accumulated_data<T: SideEffect>(
    non_revertible: &[T],
    revertible: &[T],
    array: CircuitArray,
) -> Result<Vec<T>, AccumulatedDataError> {
    let mut merged: Vec<T> = non_revertible
        .iter()
        .chain(revertible)
        .filter(|item| !item.is_empty())
        .cloned()
        .collect();

    let limit = array.max_len();
    if merged.len() > limit {
        return Err(AccumulatedDataError::CapacityExceeded { array, limit, actual: merged.len() });
    }

    sort_by_counter(&mut merged);
    if let Some(pair) = merged.windows(2).find(|pair| pair[0].counter() == pair[1].counter()) {
        return Err(AccumulatedDataError::DuplicateCounter { array, counter: pair[0].counter() });
    }

    merged.resize(limit, T::empty());
    Ok(merged)
}

/// Sorts side effects by ascending counter, moving empty entries to the end.
///
/// The sort is stable, so entries with equal counters keep their relative order.
pub fn sort_by_counter<T: SideEffect>(items: &mut [T]) {
    items.sort_by_key(|item| (item.is_empty(), item.counter()));
}

/// Pads `items` with empty entries to the fixed length of `array`.
///
/// # Errors
/// Returns an error if `items` is already longer than the array.
pub fn pad_to_max_len<T: SideEffect>(
    mut items: Vec<T>,
    array: CircuitArray,
) -> Result<Vec<T>, AccumulatedDataError> {
    let limit = array.max_len();
    if items.len() > limit {
        return Err(AccumulatedDataError::CapacityExceeded { array, limit, actual: items.len() });
    }
    items.resize(limit, T::empty());
    Ok(items)
}

/// Returns the field elements of `items` padded to the fixed length of `array`.
pub(crate) fn padded_fields<T: SideEffect>(items: &[T], array: CircuitArray) -> Vec<Felt> {
    debug_assert!(items.len() <= array.max_len(), "{array} exceeds its capacity");

    let mut fields = Vec::new();
    for item in items {
        fields.extend(item.to_fields());
    }
    let padding = T::empty().to_fields();
    for _ in items.len()..array.max_len() {
        fields.extend_from_slice(&padding);
    }
    fields
}

// ACCUMULATED DATA
// ================================================================================================

/// The side effects a transaction phase has accumulated so far.
///
/// Each array holds at most the number of entries of its [`CircuitArray`]; padding is only
/// materialized when the data is encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccumulatedData {
    note_hashes: Vec<NoteHash>,
    nullifiers: Vec<Nullifier>,
    public_data_update_requests: Vec<PublicDataUpdateRequest>,
}

impl AccumulatedData {
    /// Creates accumulated data from the provided side effects.
    ///
    /// # Errors
    /// Returns an error if any of the arrays exceeds its capacity.
    pub fn new(
        note_hashes: Vec<NoteHash>,
        nullifiers: Vec<Nullifier>,
        public_data_update_requests: Vec<PublicDataUpdateRequest>,
    ) -> Result<Self, AccumulatedDataError> {
        check_capacity(&note_hashes, CircuitArray::NoteHashes)?;
        check_capacity(&nullifiers, CircuitArray::Nullifiers)?;
        check_capacity(&public_data_update_requests, CircuitArray::PublicDataUpdateRequests)?;

        Ok(Self {
            note_hashes,
            nullifiers,
            public_data_update_requests,
        })
    }

    pub fn note_hashes(&self) -> &[NoteHash] {
        &self.note_hashes
    }

    pub fn nullifiers(&self) -> &[Nullifier] {
        &self.nullifiers
    }

    pub fn public_data_update_requests(&self) -> &[PublicDataUpdateRequest] {
        &self.public_data_update_requests
    }

    pub(crate) fn push_note_hash(
        &mut self,
        note_hash: NoteHash,
    ) -> Result<(), AccumulatedDataError> {
        push_checked(&mut self.note_hashes, note_hash, CircuitArray::NoteHashes)
    }

    pub(crate) fn push_nullifier(
        &mut self,
        nullifier: Nullifier,
    ) -> Result<(), AccumulatedDataError> {
        push_checked(&mut self.nullifiers, nullifier, CircuitArray::Nullifiers)
    }

    pub(crate) fn push_public_data_update_request(
        &mut self,
        request: PublicDataUpdateRequest,
    ) -> Result<(), AccumulatedDataError> {
        push_checked(
            &mut self.public_data_update_requests,
            request,
            CircuitArray::PublicDataUpdateRequests,
        )
    }

    /// Returns the padded field encoding of the accumulated arrays.
    pub fn to_fields(&self) -> Vec<Felt> {
        let mut fields = padded_fields(&self.note_hashes, CircuitArray::NoteHashes);
        fields.extend(padded_fields(&self.nullifiers, CircuitArray::Nullifiers));
        fields.extend(padded_fields(
            &self.public_data_update_requests,
            CircuitArray::PublicDataUpdateRequests,
        ));
        fields
    }
}

pub(crate) fn check_capacity<T>(
    items: &[T],
    array: CircuitArray,
) -> Result<(), AccumulatedDataError> {
    let limit = array.max_len();
    if items.len() > limit {
        return Err(AccumulatedDataError::CapacityExceeded { array, limit, actual: items.len() });
    }
    Ok(())
}

pub(crate) fn push_checked<T>(
    items: &mut Vec<T>,
    item: T,
    array: CircuitArray,
) -> Result<(), AccumulatedDataError> {
    let limit = array.max_len();
    if items.len() == limit {
        return Err(AccumulatedDataError::CapacityExceeded { array, limit, actual: limit + 1 });
    }
    items.push(item);
    Ok(())
}

impl Serializable for AccumulatedData {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_usize(self.note_hashes.len());
        target.write_many(&self.note_hashes);
        target.write_usize(self.nullifiers.len());
        target.write_many(&self.nullifiers);
        target.write_usize(self.public_data_update_requests.len());
        target.write_many(&self.public_data_update_requests);
    }
}

impl Deserializable for AccumulatedData {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let num_note_hashes = source.read_usize()?;
        let note_hashes = source.read_many(num_note_hashes)?;
        let num_nullifiers = source.read_usize()?;
        let nullifiers = source.read_many(num_nullifiers)?;
        let num_requests = source.read_usize()?;
        let requests = source.read_many(num_requests)?;

        Self::new(note_hashes, nullifiers, requests)
            .map_err(|err| DeserializationError::InvalidValue(err.to_string()))
    }
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rand::{SeedableRng, rngs::SmallRng, seq::SliceRandom};

    use super::*;
    use crate::{MAX_NOTE_HASHES_PER_TX, MAX_NULLIFIERS_PER_TX};

    fn note_hash(value: u64, counter: u32) -> NoteHash {
        NoteHash::new(Felt::new(value), counter)
    }

    /// Tests that `[a, b]` merged with `[c]` yields `[a, b, c]` followed by padding.
    #[test]
    fn merge_concatenates_and_pads() -> anyhow::Result<()> {
        let a = note_hash(10, 1);
        let b = note_hash(20, 2);
        let c = note_hash(30, 3);

        let merged = merge_accumulated_data(&[a, b], &[c], CircuitArray::NoteHashes)?;

        assert_eq!(merged.len(), MAX_NOTE_HASHES_PER_TX);
        assert_eq!(&merged[..4], &[a, b, c, NoteHash::empty()]);
        assert!(merged[3..].iter().all(NoteHash::is_empty));

        Ok(())
    }

    /// Tests that the merged array is sorted by counter even if the revertible part contains
    /// side effects that happened before non-revertible ones.
    #[test]
    fn merge_sorts_by_counter() -> anyhow::Result<()> {
        let non_revertible = [note_hash(1, 5), note_hash(2, 9)];
        let revertible = [note_hash(3, 2), NoteHash::empty(), note_hash(4, 7)];

        let merged = merge_accumulated_data(&non_revertible, &revertible, CircuitArray::NoteHashes)?;
        let counters: Vec<u32> = merged.iter().take(4).map(|item| item.counter).collect();

        assert_eq!(counters, [2, 5, 7, 9]);
        assert!(merged[4].is_empty());

        Ok(())
    }

    /// Tests that merging more side effects than the array can hold fails.
    #[test]
    fn merge_fails_on_capacity_overflow() {
        let nullifiers: Vec<Nullifier> = (1..=MAX_NULLIFIERS_PER_TX as u32 + 1)
            .map(|counter| Nullifier::new(Felt::from(counter), Felt::from(0u32), counter))
            .collect();
        let (first, second) = nullifiers.split_at(10);

        let error = merge_accumulated_data(first, second, CircuitArray::Nullifiers).unwrap_err();

        assert_matches!(
            error,
            AccumulatedDataError::CapacityExceeded { array: CircuitArray::Nullifiers, limit, actual }
                if limit == MAX_NULLIFIERS_PER_TX && actual == MAX_NULLIFIERS_PER_TX + 1
        );
    }

    /// Tests that two side effects with the same counter are rejected.
    #[test]
    fn merge_rejects_duplicate_counters() {
        let error = merge_accumulated_data(
            &[note_hash(1, 4)],
            &[note_hash(2, 4)],
            CircuitArray::NoteHashes,
        )
        .unwrap_err();

        assert_matches!(error, AccumulatedDataError::DuplicateCounter { counter: 4, .. });
    }

    /// Tests that sorting shuffled side effects restores counter order and keeps padding last.
    #[test]
    fn sort_by_counter_keeps_padding_last() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut items: Vec<NoteHash> = (1..=16).map(|counter| note_hash(counter as u64, counter)).collect();
        items.extend([NoteHash::empty(); 4]);
        items.shuffle(&mut rng);

        sort_by_counter(&mut items);

        let counters: Vec<u32> = items.iter().take(16).map(|item| item.counter).collect();
        assert_eq!(counters, (1..=16).collect::<Vec<_>>());
        assert!(items[16..].iter().all(NoteHash::is_empty));
    }

    /// Tests that the field encoding of accumulated data always has the padded length.
    #[test]
    fn accumulated_data_fields_are_padded() -> anyhow::Result<()> {
        let empty = AccumulatedData::default();
        let data = AccumulatedData::new(
            vec![note_hash(1, 1)],
            vec![Nullifier::new(Felt::new(3), Felt::new(1), 2)],
            vec![PublicDataUpdateRequest::new(Felt::new(5), Felt::new(6), 3)],
        )?;

        assert_eq!(data.to_fields().len(), empty.to_fields().len());

        Ok(())
    }
}
