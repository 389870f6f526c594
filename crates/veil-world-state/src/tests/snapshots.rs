use std::thread;

use assert_matches::assert_matches;
use veil_objects::{
    Felt, ZERO,
    block::BlockNumber,
    tree::{IndexedLeafPreimage, Leaf, LeafPreimage, NullifierLeafPreimage, TreeKind},
};

use super::utils::{chain_keys, nullifier, nullifiers, world_state};
use crate::{MerkleTreeReadOperations, MerkleTreeWriteOperations, WorldStateError};

/// Tests that a new world state holds the chained sentinels as committed genesis block.
#[test]
fn genesis_holds_sentinels() -> anyhow::Result<()> {
    let state = world_state(8);
    assert_eq!(state.latest_block_number(), BlockNumber::GENESIS);
    assert_eq!(state.get_state_reference(true), state.get_state_reference(false));

    let view = state.as_committed();
    assert_eq!(
        view.get_leaf_preimage(TreeKind::Nullifier, 0)?,
        Some(LeafPreimage::Nullifier(NullifierLeafPreimage {
            nullifier: ZERO,
            next_nullifier: Felt::new(1),
            next_index: 1,
        }))
    );
    assert_eq!(
        view.get_leaf_preimage(TreeKind::Nullifier, 1)?,
        Some(LeafPreimage::Nullifier(NullifierLeafPreimage {
            nullifier: Felt::new(1),
            next_nullifier: ZERO,
            next_index: 0,
        }))
    );
    assert_eq!(view.get_tree_info(TreeKind::PublicData).size, 2);
    assert_eq!(view.get_tree_info(TreeKind::NoteHash).size, 0);

    let genesis = state.snapshot_at(BlockNumber::GENESIS)?;
    assert_eq!(genesis.get_state_reference(), state.get_state_reference(false));
    Ok(())
}

/// Tests that snapshots and the committed view never observe later writes.
#[test]
fn snapshots_are_isolated_from_later_writes() -> anyhow::Result<()> {
    let mut state = world_state(8);
    state.batch_insert(TreeKind::Nullifier, &nullifiers(&[10, 30]))?;
    let block_num = state.commit()?;
    assert_eq!(block_num, BlockNumber::from(1));

    let snapshot = state.snapshot_at(block_num)?;
    let reference = snapshot.get_state_reference();
    // leaf 2 becomes the low leaf of 20 and slots 4 and 5 are filled later
    let paths = [2, 3, 4, 5]
        .map(|index| snapshot.get_sibling_path(TreeKind::Nullifier, index))
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    state.batch_insert(TreeKind::Nullifier, &nullifiers(&[20]))?;
    assert_eq!(
        state.as_committed().get_previous_value_index(TreeKind::Nullifier, Felt::new(20))?.index,
        2
    );
    let latest = state.as_latest().get_previous_value_index(TreeKind::Nullifier, Felt::new(20))?;
    assert!(latest.already_present);

    state.commit()?;
    state.batch_insert(TreeKind::Nullifier, &nullifiers(&[25]))?;

    assert_eq!(snapshot.get_state_reference(), reference);
    for (index, path) in [2, 3, 4, 5].into_iter().zip(&paths) {
        assert_eq!(&snapshot.get_sibling_path(TreeKind::Nullifier, index)?, path, "leaf {index}");
        assert_ne!(
            &state.as_latest().get_sibling_path(TreeKind::Nullifier, index)?,
            path,
            "leaf {index}"
        );
    }
    let witness = snapshot.membership_witness(TreeKind::Nullifier, 2)?;
    let low_leaf_hash = snapshot
        .nullifier_preimage(2)?
        .expect("leaf 2 should be occupied in the snapshot")
        .hash();
    assert_eq!(witness.compute_root(low_leaf_hash)?, reference.partial.nullifier_tree.root);

    let low_leaf = snapshot.get_previous_value_index(TreeKind::Nullifier, Felt::new(20))?;
    assert!(!low_leaf.already_present);
    assert_eq!(low_leaf.index, 2);
    assert_eq!(snapshot.find_leaf_index(TreeKind::Nullifier, &nullifier(20))?, None);
    assert_eq!(snapshot.get_leaf_value(TreeKind::Nullifier, 4), None);
    assert_eq!(chain_keys(&snapshot, TreeKind::Nullifier), [0, 1, 10, 30]);
    let next_snapshot = state.snapshot_at(BlockNumber::from(2))?;
    assert_eq!(chain_keys(&next_snapshot, TreeKind::Nullifier), [0, 1, 10, 20, 30]);
    Ok(())
}

/// Tests that rolling back discards uncommitted leaves and their keys.
#[test]
fn rollback_discards_uncommitted_state() -> anyhow::Result<()> {
    let mut state = world_state(8);
    let committed = state.get_state_reference(false);

    state.batch_insert(TreeKind::Nullifier, &nullifiers(&[7]))?;
    state.append_leaves(TreeKind::NoteHash, &[Leaf::Value(Felt::new(7))])?;
    assert_ne!(state.get_state_reference(true), committed);

    state.rollback()?;
    assert_eq!(state.get_state_reference(true), committed);
    assert_eq!(state.as_latest().find_leaf_index(TreeKind::Nullifier, &nullifier(7))?, None);

    // the key can be inserted again once its previous insertion is gone
    state.batch_insert(TreeKind::Nullifier, &nullifiers(&[7]))?;
    assert_eq!(state.as_latest().find_leaf_index(TreeKind::Nullifier, &nullifier(7))?, Some(2));
    Ok(())
}

/// Tests that unknown blocks are rejected and snapshots refuse writes.
#[test]
fn snapshots_are_read_only() -> anyhow::Result<()> {
    let state = world_state(4);
    assert_matches!(
        state.snapshot_at(BlockNumber::from(1)),
        Err(WorldStateError::UnknownBlock(block_num)) if block_num == BlockNumber::from(1)
    );

    let mut snapshot = state.snapshot_at(BlockNumber::GENESIS)?;
    assert_matches!(
        snapshot.batch_insert(TreeKind::Nullifier, &nullifiers(&[3])),
        Err(WorldStateError::ReadOnlyViolation(_))
    );
    assert_matches!(
        snapshot.batch_insert_subtrees(TreeKind::Nullifier, &nullifiers(&[3, 4]), 1),
        Err(WorldStateError::ReadOnlyViolation(_))
    );
    assert_matches!(snapshot.commit(), Err(WorldStateError::ReadOnlyViolation(_)));
    assert_matches!(snapshot.rollback(), Err(WorldStateError::ReadOnlyViolation(_)));
    Ok(())
}

/// Tests that a snapshot can be read from several threads while the world state keeps
/// changing.
#[test]
fn snapshot_is_shared_across_threads() -> anyhow::Result<()> {
    let mut state = world_state(10);
    state.batch_insert(TreeKind::Nullifier, &nullifiers(&[100, 200, 300]))?;
    let block_num = state.commit()?;
    let snapshot = state.snapshot_at(block_num)?;
    let reference = snapshot.get_state_reference();

    thread::scope(|scope| {
        let readers: Vec<_> = (0..4u64)
            .map(|offset| {
                let snapshot = &snapshot;
                scope.spawn(move || {
                    let key = Felt::new(150 + offset);
                    let low_leaf = snapshot.get_previous_value_index(TreeKind::Nullifier, key)?;
                    let witness = snapshot.membership_witness(TreeKind::Nullifier, low_leaf.index)?;
                    anyhow::Ok((low_leaf, witness, snapshot.get_state_reference()))
                })
            })
            .collect();

        state.batch_insert(TreeKind::Nullifier, &nullifiers(&[150, 151, 152, 153]))?;
        state.commit()?;

        for reader in readers {
            let (low_leaf, witness, seen) = reader.join().expect("reader should not panic")?;
            assert!(!low_leaf.already_present);
            assert_eq!(low_leaf.index, 2);
            assert_eq!(witness.leaf_index(), 2);
            assert_eq!(seen, reference);
        }
        anyhow::Ok(())
    })?;

    assert_eq!(snapshot.get_state_reference(), reference);
    Ok(())
}
