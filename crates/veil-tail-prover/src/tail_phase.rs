use tracing::{info, instrument};
use veil_objects::{
    hints::TailCircuitPrivateInputs,
    transaction::{CircuitArray, NoteHash, PreviousKernelData, SideEffect, merge_accumulated_data},
};
use veil_world_state::{MerkleTreeReadOperations, PublicStateScratchpad, WorldState};

use crate::{COMPONENT, HintsBuilder, TailPhaseError};

// TAIL OUTPUT
// ================================================================================================

/// The result of running the tail phase of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailOutput {
    /// Private inputs of the tail circuit.
    pub inputs: TailCircuitPrivateInputs,
    /// Note hashes of the transaction ordered by counter, without padding.
    pub sorted_note_hashes: Vec<NoteHash>,
}

// TAIL PHASE
// ================================================================================================

/// The last phase of a transaction: resolves the hints of the tail circuit and settles the
/// public writes buffered during execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct TailPhase;

impl TailPhase {
    pub fn new() -> Self {
        Self
    }

    /// Builds the tail circuit private inputs of `previous_kernel` against `state`.
    ///
    /// Pending nullifiers and public writes are the non-revertible and revertible accumulated
    /// data merged by counter. The start state is the partial state reference of `state`.
    ///
    /// # Errors
    /// Returns an error if the accumulated data exceeds its capacity or any read request cannot
    /// be resolved.
    #[instrument(target = COMPONENT, skip_all, err)]
    pub fn build_private_inputs(
        &self,
        previous_kernel: PreviousKernelData,
        state: &impl MerkleTreeReadOperations,
    ) -> Result<TailCircuitPrivateInputs, TailPhaseError> {
        let kernel_output = previous_kernel.public_inputs();
        let requests = kernel_output.validation_requests();
        let non_revertible = kernel_output.end_non_revertible_data();
        let revertible = kernel_output.end();

        let pending_nullifiers = merge_accumulated_data(
            non_revertible.nullifiers(),
            revertible.nullifiers(),
            CircuitArray::Nullifiers,
        )?;
        let pending_writes = merge_accumulated_data(
            non_revertible.public_data_update_requests(),
            revertible.public_data_update_requests(),
            CircuitArray::PublicDataUpdateRequests,
        )?;

        let hints = HintsBuilder::new(state);
        let nullifier_read_request_hints = hints
            .nullifier_read_request_hints(requests.nullifier_read_requests(), &pending_nullifiers)?;
        let nullifier_non_existent_read_request_hints = hints
            .nullifier_non_existent_read_request_hints(
                requests.nullifier_non_existent_read_requests(),
                &pending_nullifiers,
            )?;
        let public_data_hints =
            hints.public_data_hints(requests.public_data_reads(), &pending_writes)?;
        let public_data_read_request_hints = hints.public_data_read_request_hints(
            requests.public_data_reads(),
            &pending_writes,
            &public_data_hints,
        )?;

        let start_state = state.get_state_reference().partial;

        Ok(TailCircuitPrivateInputs::new(
            previous_kernel,
            nullifier_read_request_hints,
            nullifier_non_existent_read_request_hints,
            public_data_hints,
            public_data_read_request_hints,
            start_state,
        ))
    }

    /// Runs the tail phase against the latest state of `world_state`.
    ///
    /// On success the writes buffered in `scratchpad` are inserted into the public data tree
    /// of the uncommitted state. On failure they are discarded and the world state is left
    /// untouched.
    ///
    /// # Errors
    /// Returns an error if building the private inputs or committing the scratchpad fails.
    #[instrument(target = COMPONENT, skip_all, err)]
    pub fn handle(
        &self,
        world_state: &mut WorldState,
        scratchpad: PublicStateScratchpad,
        previous_kernel: PreviousKernelData,
    ) -> Result<TailOutput, TailPhaseError> {
        let output = match self.prepare(previous_kernel, world_state) {
            Ok(output) => output,
            Err(err) => {
                scratchpad.rollback();
                return Err(err);
            },
        };

        let insertions = scratchpad.commit(world_state)?;

        info!(
            target: COMPONENT,
            num_note_hashes = output.sorted_note_hashes.len(),
            num_public_data_subtrees = insertions.len(),
            "tail phase completed"
        );
        Ok(output)
    }

    // HELPERS
    // --------------------------------------------------------------------------------------------

    fn prepare(
        &self,
        previous_kernel: PreviousKernelData,
        world_state: &WorldState,
    ) -> Result<TailOutput, TailPhaseError> {
        let kernel_output = previous_kernel.public_inputs();
        let sorted_note_hashes = merge_accumulated_data(
            kernel_output.end_non_revertible_data().note_hashes(),
            kernel_output.end().note_hashes(),
            CircuitArray::NoteHashes,
        )?
        .into_iter()
        .filter(|note_hash| !note_hash.is_empty())
        .collect();

        let inputs = self.build_private_inputs(previous_kernel, &world_state.as_latest())?;
        Ok(TailOutput { inputs, sorted_note_hashes })
    }
}
