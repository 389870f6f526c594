use core::fmt;

use crate::{
    MAX_NOTE_HASHES_PER_TX, MAX_NULLIFIER_NON_EXISTENT_READ_REQUESTS_PER_TX,
    MAX_NULLIFIER_READ_REQUESTS_PER_TX, MAX_NULLIFIERS_PER_TX, MAX_PUBLIC_DATA_HINTS,
    MAX_PUBLIC_DATA_READS_PER_TX, MAX_PUBLIC_DATA_UPDATE_REQUESTS_PER_TX,
};

// CIRCUIT ARRAY
// ================================================================================================

/// The fixed-size arrays of the tail circuit inputs.
///
/// Every array is padded to its maximum length, so transactions producing more entries than
/// [`CircuitArray::max_len`] cannot be proven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitArray {
    NoteHashes,
    Nullifiers,
    PublicDataUpdateRequests,
    PublicDataReads,
    NullifierReadRequests,
    NullifierNonExistentReadRequests,
    PublicDataHints,
}

impl CircuitArray {
    /// Returns the fixed length of this array.
    pub const fn max_len(&self) -> usize {
        match self {
            CircuitArray::NoteHashes => MAX_NOTE_HASHES_PER_TX,
            CircuitArray::Nullifiers => MAX_NULLIFIERS_PER_TX,
            CircuitArray::PublicDataUpdateRequests => MAX_PUBLIC_DATA_UPDATE_REQUESTS_PER_TX,
            CircuitArray::PublicDataReads => MAX_PUBLIC_DATA_READS_PER_TX,
            CircuitArray::NullifierReadRequests => MAX_NULLIFIER_READ_REQUESTS_PER_TX,
            CircuitArray::NullifierNonExistentReadRequests => {
                MAX_NULLIFIER_NON_EXISTENT_READ_REQUESTS_PER_TX
            },
            CircuitArray::PublicDataHints => MAX_PUBLIC_DATA_HINTS,
        }
    }
}

impl fmt::Display for CircuitArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CircuitArray::NoteHashes => "note hashes",
            CircuitArray::Nullifiers => "nullifiers",
            CircuitArray::PublicDataUpdateRequests => "public data update requests",
            CircuitArray::PublicDataReads => "public data reads",
            CircuitArray::NullifierReadRequests => "nullifier read requests",
            CircuitArray::NullifierNonExistentReadRequests => "nullifier non-existent read requests",
            CircuitArray::PublicDataHints => "public data hints",
        };
        f.write_str(name)
    }
}
