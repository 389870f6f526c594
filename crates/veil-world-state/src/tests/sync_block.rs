use assert_matches::assert_matches;
use veil_objects::{
    Felt,
    block::{BlockNumber, L2BlockData, TxEffect},
    tree::{Leaf, PublicDataLeaf, TreeKind},
};

use super::utils::{nullifier, nullifiers, world_state};
use crate::{
    MerkleTreeReadOperations, MerkleTreeWriteOperations, PublicStateScratchpad, WorldState,
    WorldStateError,
};

/// Applies a block's worth of effects to `state` the way a block builder would and returns the
/// block describing them. The state is left uncommitted.
fn build_block(state: &mut WorldState) -> anyhow::Result<L2BlockData> {
    let effect = TxEffect {
        note_hashes: vec![Felt::new(11), Felt::new(12)],
        nullifiers: vec![Felt::new(21), Felt::new(20)],
        public_data_writes: vec![
            PublicDataLeaf::new(Felt::new(3), Felt::new(30)),
            PublicDataLeaf::new(Felt::new(8), Felt::new(80)),
            PublicDataLeaf::new(Felt::new(9), Felt::new(90)),
        ],
    };
    let messages = vec![Felt::new(1000)];
    let block_hash = Felt::new(77);

    state.batch_insert(TreeKind::Nullifier, &nullifiers(&[21, 20]))?;
    let note_hashes: Vec<_> = effect.note_hashes.iter().copied().map(Leaf::Value).collect();
    state.append_leaves(TreeKind::NoteHash, &note_hashes)?;

    let mut scratchpad = PublicStateScratchpad::new();
    for (counter, write) in (1..).zip(&effect.public_data_writes) {
        scratchpad.storage_write(write.slot, write.value, counter)?;
    }
    scratchpad.commit(state)?;

    state.append_leaves(TreeKind::L1ToL2Message, &[Leaf::Value(messages[0])])?;
    state.append_leaves(TreeKind::Archive, &[Leaf::Value(block_hash)])?;

    Ok(L2BlockData {
        block_num: state.latest_block_number().child(),
        state_reference: state.get_state_reference(true),
        tx_effects: vec![effect],
        l1_to_l2_messages: messages,
        block_hash,
    })
}

/// Tests that a block built locally is committed as is and a block built elsewhere is
/// replayed to the same state.
#[test]
fn sync_block_commits_or_replays() -> anyhow::Result<()> {
    let mut builder = world_state(8);
    let block = build_block(&mut builder)?;
    assert!(builder.sync_block(&block)?);
    assert_eq!(builder.latest_block_number(), BlockNumber::from(1));

    let mut follower = world_state(8);
    follower.batch_insert(TreeKind::Nullifier, &nullifiers(&[99]))?;
    assert!(!follower.sync_block(&block)?);
    assert_eq!(follower.latest_block_number(), BlockNumber::from(1));
    assert_eq!(follower.get_state_reference(false), block.state_reference);
    let discarded = follower.as_latest().find_leaf_index(TreeKind::Nullifier, &nullifier(99))?;
    assert_eq!(discarded, None);
    Ok(())
}

/// Tests that a block whose state reference cannot be reproduced is rejected and leaves the
/// follower at its previous state, and that only the child of the latest block is synced.
#[test]
fn sync_block_rejects_mismatching_state() -> anyhow::Result<()> {
    let mut builder = world_state(8);
    let mut block = build_block(&mut builder)?;
    block.state_reference.partial.note_hash_tree.size += 1;

    let mut follower = world_state(8);
    let before = follower.get_state_reference(true);
    assert_matches!(
        follower.sync_block(&block),
        Err(WorldStateError::BlockStateMismatch { tree: TreeKind::NoteHash, .. })
    );
    assert_eq!(follower.get_state_reference(true), before);
    assert_eq!(follower.latest_block_number(), BlockNumber::GENESIS);

    for block_num in [BlockNumber::GENESIS, BlockNumber::from(2)] {
        block.block_num = block_num;
        assert_matches!(
            follower.sync_block(&block),
            Err(WorldStateError::UnexpectedBlockNumber { expected, actual })
                if expected == BlockNumber::from(1) && actual == block_num
        );
    }
    Ok(())
}
