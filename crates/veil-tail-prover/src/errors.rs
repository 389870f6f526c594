use thiserror::Error;
use veil_objects::{AccumulatedDataError, Felt, transaction::CircuitArray};
use veil_world_state::{ScratchpadError, WorldStateError};

// HINT ERROR
// ================================================================================================

#[derive(Debug, Error)]
pub enum HintError {
    #[error(
        "read request {read_request_index} of the {array} reads {value}, which is neither pending nor settled with that value"
    )]
    UnsatisfiedReadRequest {
        array: CircuitArray,
        read_request_index: usize,
        value: Felt,
    },

    #[error(
        "non-existent read request {read_request_index} checks nullifier {value}, which is already {}",
        existence(.pending)
    )]
    UnexpectedExistence {
        read_request_index: usize,
        value: Felt,
        pending: bool,
    },

    #[error("{array} exceeds its capacity of {limit} entries")]
    CapacityExceeded { array: CircuitArray, limit: usize },

    #[error("no public data hint covers slot {slot}")]
    InvalidPublicDataHint { slot: Felt },

    #[error("accumulated data of the previous kernel is invalid")]
    AccumulatedData(#[source] AccumulatedDataError),

    #[error("world state lookup failed")]
    WorldState(#[from] WorldStateError),
}

impl From<AccumulatedDataError> for HintError {
    fn from(err: AccumulatedDataError) -> Self {
        match err {
            AccumulatedDataError::CapacityExceeded { array, limit, .. } => {
                HintError::CapacityExceeded { array, limit }
            },
            other => HintError::AccumulatedData(other),
        }
    }
}

fn existence(pending: &bool) -> &'static str {
    if *pending { "pending" } else { "settled" }
}

// TAIL PHASE ERROR
// ================================================================================================

#[derive(Debug, Error)]
pub enum TailPhaseError {
    #[error("failed to resolve the tail circuit hints")]
    Hints(#[from] HintError),

    #[error("failed to merge the accumulated data of the previous kernel")]
    AccumulatedData(#[from] AccumulatedDataError),

    #[error("failed to commit the public state scratchpad")]
    Scratchpad(#[from] ScratchpadError),
}
