use alloc::vec::Vec;

use rand::Rng;

use crate::{
    AccumulatedDataError, Felt,
    transaction::{PublicKernelOutput, SideEffectCounter, SideEffectKind, SideEffectRecord},
};

/// Shorthand for [`Felt::new`].
pub fn felt(value: u64) -> Felt {
    Felt::new(value)
}

/// Returns `count` distinct random keys from `2..max`, in random order.
///
/// Keys `0` and `1` are skipped because the indexed trees are prefilled with them.
pub fn random_keys<R: Rng>(rng: &mut R, count: usize, max: u64) -> Vec<Felt> {
    assert!(max - 2 >= count as u64, "not enough distinct keys below {max}");

    let mut keys: Vec<u64> = Vec::with_capacity(count);
    while keys.len() < count {
        let key = rng.random_range(2..max);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys.into_iter().map(Felt::new).collect()
}

// TX RECORDS BUILDER
// ================================================================================================

/// Builds the side effect records of a transaction, assigning increasing counters.
#[derive(Debug, Clone, Default)]
pub struct TxRecordsBuilder {
    counter: SideEffectCounter,
    revertible: bool,
    records: Vec<SideEffectRecord>,
}

impl TxRecordsBuilder {
    /// Creates a builder whose records start in the non-revertible phase.
    pub fn new() -> Self {
        Self { counter: 0, revertible: false, records: Vec::new() }
    }

    /// Marks all subsequently added records as revertible.
    pub fn revertible(mut self) -> Self {
        self.revertible = true;
        self
    }

    /// Returns the counter the next record will get.
    pub fn next_counter(&self) -> SideEffectCounter {
        self.counter + 1
    }

    pub fn emit_nullifier(self, nullifier: u64) -> Self {
        self.push(SideEffectKind::NullifierWrite, nullifier, 0)
    }

    pub fn read_nullifier(self, nullifier: u64) -> Self {
        self.push(SideEffectKind::NullifierRead, nullifier, 0)
    }

    pub fn check_nullifier_absent(self, nullifier: u64) -> Self {
        self.push(SideEffectKind::NullifierNonExistentRead, nullifier, 0)
    }

    pub fn emit_note_hash(self, note_hash: u64) -> Self {
        self.push(SideEffectKind::NoteHashWrite, note_hash, 0)
    }

    pub fn write_public(self, slot: u64, value: u64) -> Self {
        self.push(SideEffectKind::PublicDataWrite, slot, value)
    }

    pub fn read_public(self, slot: u64, value: u64) -> Self {
        self.push(SideEffectKind::PublicDataRead, slot, value)
    }

    pub fn build(self) -> Vec<SideEffectRecord> {
        self.records
    }

    /// Sorts the records into a kernel output.
    ///
    /// # Errors
    /// Returns an error if the records overflow any of the kernel output arrays.
    pub fn kernel_output(self) -> Result<PublicKernelOutput, AccumulatedDataError> {
        PublicKernelOutput::from_records(self.records)
    }

    fn push(mut self, kind: SideEffectKind, key: u64, value: u64) -> Self {
        self.counter += 1;
        let mut record =
            SideEffectRecord::new(kind, felt(key), self.counter).with_value(felt(value));
        if !self.revertible {
            record = record.non_revertible();
        }
        self.records.push(record);
        self
    }
}
