use assert_matches::assert_matches;
use veil_objects::{
    testing::{TxRecordsBuilder, felt},
    transaction::NoteHash,
    tree::TreeKind,
};
use veil_world_state::{MerkleTreeReadOperations, PublicStateScratchpad};

use super::utils::{previous_kernel, settled_state};
use crate::{HintError, TailPhase, TailPhaseError};

/// Tests that a successful tail phase settles the scratchpad writes in the uncommitted state
/// and returns the note hashes ordered by counter.
#[test]
fn handle_commits_scratchpad() -> anyhow::Result<()> {
    let mut state = settled_state();
    let start_state = state.get_state_reference(true).partial;

    let mut scratchpad = PublicStateScratchpad::new();
    scratchpad.storage_write(felt(3), felt(42), 2)?;
    let kernel = previous_kernel(
        TxRecordsBuilder::new()
            .emit_note_hash(8)
            .write_public(3, 42)
            .read_public(3, 42)
            .revertible()
            .emit_note_hash(7),
    );

    let output = TailPhase::new().handle(&mut state, scratchpad, kernel)?;

    assert_eq!(*output.inputs.start_state(), start_state);
    assert_eq!(output.sorted_note_hashes, [NoteHash::new(felt(8), 1), NoteHash::new(felt(7), 4)]);

    let latest = state.as_latest();
    let low_leaf = latest.get_previous_value_index(TreeKind::PublicData, felt(3))?;
    assert!(low_leaf.already_present);
    let preimage = latest.public_data_preimage(low_leaf.index)?.expect("slot 3 should be stored");
    assert_eq!(preimage.value, felt(42));

    // the committed state is untouched until the block is committed
    let committed = state.as_committed();
    assert!(!committed.get_previous_value_index(TreeKind::PublicData, felt(3))?.already_present);
    Ok(())
}

/// Tests that a failing tail phase discards the scratchpad and leaves the world state as it
/// was.
#[test]
fn handle_rolls_back_scratchpad_on_failure() -> anyhow::Result<()> {
    let mut state = settled_state();
    let before = state.get_state_reference(true);

    let mut scratchpad = PublicStateScratchpad::new();
    scratchpad.storage_write(felt(3), felt(42), 1)?;
    let kernel = previous_kernel(TxRecordsBuilder::new().write_public(3, 42).read_nullifier(99));

    let result = TailPhase::new().handle(&mut state, scratchpad, kernel);

    assert_matches!(
        result,
        Err(TailPhaseError::Hints(HintError::UnsatisfiedReadRequest { read_request_index: 0, .. }))
    );
    assert_eq!(state.get_state_reference(true), before);
    Ok(())
}

/// Tests that an empty transaction passes the tail phase without touching the world state.
#[test]
fn handle_accepts_empty_transaction() -> anyhow::Result<()> {
    let mut state = settled_state();
    let before = state.get_state_reference(true);

    let output = TailPhase::new().handle(
        &mut state,
        PublicStateScratchpad::new(),
        previous_kernel(TxRecordsBuilder::new()),
    )?;

    assert!(output.sorted_note_hashes.is_empty());
    assert_eq!(state.get_state_reference(true), before);
    Ok(())
}
