use assert_matches::assert_matches;
use veil_objects::{
    Felt, ZERO,
    tree::{PublicDataLeaf, TreeKind},
};

use super::utils::{chain_keys, world_state};
use crate::{
    MerkleTreeReadOperations, MerkleTreeWriteOperations, PublicStateScratchpad, ScratchpadError,
    TreeError, WorldStateError,
};

fn felt(value: u64) -> Felt {
    Felt::new(value)
}

/// Tests that reads observe the latest earlier write and fall back to settled state.
#[test]
fn reads_observe_earlier_writes() -> anyhow::Result<()> {
    let mut state = world_state(6);
    let mut settled = PublicStateScratchpad::new();
    settled.storage_write(felt(5), felt(50), 1)?;
    settled.commit(&mut state)?;
    state.commit()?;

    let mut scratchpad = PublicStateScratchpad::new();
    scratchpad.storage_write(felt(3), felt(42), 1)?;
    scratchpad.storage_write(felt(3), felt(43), 4)?;

    let view = state.as_latest();
    assert_eq!(scratchpad.storage_read(felt(3), 1, &view)?, ZERO);
    assert_eq!(scratchpad.storage_read(felt(3), 2, &view)?, felt(42));
    assert_eq!(scratchpad.storage_read(felt(3), 5, &view)?, felt(43));
    assert_eq!(scratchpad.storage_read(felt(5), 5, &view)?, felt(50));
    assert_eq!(scratchpad.storage_read(felt(6), 5, &view)?, ZERO);

    assert_matches!(
        scratchpad.storage_write(felt(9), felt(1), 4),
        Err(ScratchpadError::CounterNotIncreasing { previous: 4, current: 4 })
    );
    assert_eq!(scratchpad.pending_writes().len(), 2);
    Ok(())
}

/// Tests that committing inserts the last write of every slot in padded subtrees.
#[test]
fn commit_inserts_squashed_writes() -> anyhow::Result<()> {
    let mut state = world_state(6);
    let mut scratchpad = PublicStateScratchpad::new();
    scratchpad.storage_write(felt(9), felt(1), 1)?;
    scratchpad.storage_write(felt(4), felt(2), 2)?;
    scratchpad.storage_write(felt(9), felt(3), 3)?;
    scratchpad.storage_write(felt(7), felt(4), 4)?;

    assert_eq!(
        scratchpad.squashed_writes(),
        [
            PublicDataLeaf::new(felt(4), felt(2)),
            PublicDataLeaf::new(felt(7), felt(4)),
            PublicDataLeaf::new(felt(9), felt(3)),
        ]
    );

    let insertions = scratchpad.commit(&mut state)?;
    assert_eq!(insertions.len(), 2);

    let view = state.as_latest();
    assert_eq!(view.get_tree_info(TreeKind::PublicData).size, 6);
    assert_eq!(view.get_leaf_value(TreeKind::PublicData, 5), None);
    assert_eq!(chain_keys(&view, TreeKind::PublicData), [0, 1, 4, 7, 9]);
    assert_eq!(PublicStateScratchpad::new().storage_read(felt(9), 1, &view)?, felt(3));
    Ok(())
}

/// Tests that rolling back leaves the public data tree untouched.
#[test]
fn rollback_leaves_tree_untouched() -> anyhow::Result<()> {
    let state = world_state(6);
    let before = state.get_state_reference(true);

    let mut scratchpad = PublicStateScratchpad::new();
    scratchpad.storage_write(felt(3), felt(42), 1)?;
    scratchpad.rollback();

    assert_eq!(state.get_state_reference(true), before);
    assert_eq!(PublicStateScratchpad::new().storage_read(felt(3), 2, &state.as_latest())?, ZERO);
    Ok(())
}

/// Tests that a commit overflowing the tree in a later subtree leaves no write behind.
#[test]
fn failed_commit_leaves_tree_untouched() -> anyhow::Result<()> {
    // two sentinel leaves in a tree of four leaves only fit the first subtree
    let mut state = world_state(2);
    let before = state.get_state_reference(true);

    let mut scratchpad = PublicStateScratchpad::new();
    scratchpad.storage_write(felt(4), felt(40), 1)?;
    scratchpad.storage_write(felt(5), felt(50), 2)?;
    scratchpad.storage_write(felt(6), felt(60), 3)?;

    assert_matches!(
        scratchpad.commit(&mut state),
        Err(ScratchpadError::WorldState(WorldStateError::Tree {
            tree: TreeKind::PublicData,
            source: TreeError::CapacityExceeded { .. },
        }))
    );

    let view = state.as_latest();
    assert_eq!(view.get_tree_info(TreeKind::PublicData).size, 2);
    assert_eq!(chain_keys(&view, TreeKind::PublicData), [0, 1]);
    assert_eq!(state.get_state_reference(true), before);

    // the restored tree still accepts a commit that fits
    let mut scratchpad = PublicStateScratchpad::new();
    scratchpad.storage_write(felt(5), felt(50), 1)?;
    scratchpad.commit(&mut state)?;
    assert_eq!(chain_keys(&state.as_latest(), TreeKind::PublicData), [0, 1, 5]);
    Ok(())
}
