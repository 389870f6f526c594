use thiserror::Error;

use crate::transaction::CircuitArray;

// LEAF CODEC ERROR
// ================================================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LeafCodecError {
    #[error("expected {expected} field elements to decode a leaf but got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("tree kind tag {0} is not a known tree kind")]
    UnknownTreeKind(u8),
}

// ACCUMULATED DATA ERROR
// ================================================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccumulatedDataError {
    #[error("{array} can hold at most {limit} entries but {actual} were provided")]
    CapacityExceeded {
        array: CircuitArray,
        limit: usize,
        actual: usize,
    },
    #[error("{array} contains more than one side effect with counter {counter}")]
    DuplicateCounter { array: CircuitArray, counter: u32 },
    #[error(
        "side effect counter {current} does not strictly increase over the previous counter {previous}"
    )]
    CounterNotIncreasing { previous: u32, current: u32 },
}
