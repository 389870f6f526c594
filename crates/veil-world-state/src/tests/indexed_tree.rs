use assert_matches::assert_matches;
use rand::{SeedableRng, rngs::SmallRng};
use rstest::rstest;
use veil_objects::{
    Felt, Hasher, StarkField,
    testing::random_keys,
    tree::{
        IndexedLeafPreimage, Leaf, LeafPreimage, NullifierLeafPreimage, PublicDataLeafPreimage,
        TreeKind,
    },
};

use super::utils::{
    assert_paths_match_root, chain_keys, nullifier, nullifiers, occupied_leaves, public_write,
    world_state,
};
use crate::{
    BatchInsertion, MerkleTreeReadOperations, MerkleTreeWriteOperations, TreeError,
    WorldStateError, tree::LowLeafInfo,
};

/// Tests the low leaf lookups and witnesses of a small nullifier batch on a depth 4 tree.
#[test]
fn nullifier_batch_low_leaves() -> anyhow::Result<()> {
    let mut state = world_state(4);
    let root_before = state.as_latest().get_tree_info(TreeKind::Nullifier).root;

    let insertion = state.batch_insert(TreeKind::Nullifier, &nullifiers(&[5, 2, 9]))?;
    let BatchInsertion::Nullifier(result) = insertion else {
        anyhow::bail!("expected a nullifier insertion result");
    };

    // 2 is linked behind the sentinel 1, then 5 and 9 are linked behind the pending leaves.
    assert!(result.low_leaf_witnesses[0].is_none());
    assert!(result.low_leaf_witnesses[2].is_none());
    let witness = result.low_leaf_witnesses[1].as_ref().expect("2 should have a settled low leaf");
    assert_eq!(witness.index, 1);
    assert_eq!(
        witness.preimage,
        NullifierLeafPreimage {
            nullifier: Felt::new(1),
            next_nullifier: Felt::new(0),
            next_index: 0,
        }
    );
    assert_eq!(witness.membership_witness().compute_root(witness.preimage.hash())?, root_before);

    let keys: Vec<u64> =
        result.sorted_new_leaves.iter().map(|leaf| leaf.nullifier.as_int()).collect();
    assert_eq!(keys, [2, 5, 9]);
    assert_eq!(result.sorted_new_leaf_indices, [3, 2, 4]);
    assert!(result.new_subtree_sibling_path.is_none());

    let view = state.as_latest();
    assert_eq!(view.get_tree_info(TreeKind::Nullifier).size, 5);
    assert_eq!(
        view.get_previous_value_index(TreeKind::Nullifier, Felt::new(7))?,
        LowLeafInfo { index: 2, already_present: false }
    );
    assert_eq!(
        view.get_previous_value_index(TreeKind::Nullifier, Felt::new(2))?,
        LowLeafInfo { index: 3, already_present: true }
    );
    assert_eq!(chain_keys(&view, TreeKind::Nullifier), [0, 1, 2, 5, 9]);
    assert_paths_match_root(&view, TreeKind::Nullifier);
    Ok(())
}

/// Tests that random batches keep the chain sorted, the size exact and every path valid.
#[rstest]
#[case::single_leaf_batches(1)]
#[case::small_batches(4)]
#[case::odd_batches(7)]
fn random_batches_keep_tree_consistent(#[case] batch_size: usize) -> anyhow::Result<()> {
    let mut rng = SmallRng::seed_from_u64(batch_size as u64);
    let mut state = world_state(10);
    let keys = random_keys(&mut rng, 42, 1 << 20);

    let mut inserted: Vec<u64> = vec![0, 1];
    for batch in keys.chunks(batch_size) {
        let leaves: Vec<_> = batch.iter().map(|key| Some(nullifier(key.as_int()))).collect();
        state.batch_insert(TreeKind::Nullifier, &leaves)?;
        inserted.extend(batch.iter().map(|key| key.as_int()));

        let view = state.as_latest();
        let mut expected = inserted.clone();
        expected.sort_unstable();
        assert_eq!(view.get_tree_info(TreeKind::Nullifier).size, inserted.len() as u64);
        assert_eq!(chain_keys(&view, TreeKind::Nullifier), expected);
    }

    let view = state.as_latest();
    assert_eq!(occupied_leaves(&view, TreeKind::Nullifier), inserted.len());
    assert_paths_match_root(&view, TreeKind::Nullifier);

    for key in &keys {
        let first = view.get_previous_value_index(TreeKind::Nullifier, *key)?;
        let second = view.get_previous_value_index(TreeKind::Nullifier, *key)?;
        assert_eq!(first, second);
        assert!(first.already_present);
        let index = view.find_leaf_index(TreeKind::Nullifier, &nullifier(key.as_int()))?;
        assert_eq!(index, Some(first.index));
    }

    let absent = (2..).find(|key| !inserted.contains(key)).expect("some key should be absent");
    let low_leaf = view.get_previous_value_index(TreeKind::Nullifier, Felt::new(absent))?;
    assert!(!low_leaf.already_present);
    Ok(())
}

/// Tests that writing an existing public data slot updates its leaf in place and leaves the
/// reserved slot empty.
#[test]
fn public_data_updates_existing_slot_in_place() -> anyhow::Result<()> {
    let mut state = world_state(4);
    state.batch_insert(TreeKind::PublicData, &[Some(public_write(3, 42)), None])?;
    assert_eq!(state.as_latest().get_tree_info(TreeKind::PublicData).size, 4);

    let insertion = state.batch_insert(
        TreeKind::PublicData,
        &[Some(public_write(3, 7)), Some(public_write(8, 1))],
    )?;
    let BatchInsertion::PublicData(result) = insertion else {
        anyhow::bail!("expected a public data insertion result");
    };

    let update_witness =
        result.low_leaf_witnesses[0].as_ref().expect("update should have a witness");
    assert_eq!(update_witness.index, 2);
    assert_eq!(update_witness.preimage.value, Felt::new(42));
    let low_witness =
        result.low_leaf_witnesses[1].as_ref().expect("8 should have a settled low leaf");
    assert_eq!(low_witness.index, 2);
    assert_eq!(low_witness.preimage.value, Felt::new(7));
    assert_eq!(result.sorted_new_leaf_indices, [5]);

    let view = state.as_latest();
    assert_eq!(view.get_tree_info(TreeKind::PublicData).size, 6);
    assert_eq!(view.get_leaf_value(TreeKind::PublicData, 4), None);
    assert_eq!(
        view.get_leaf_preimage(TreeKind::PublicData, 2)?,
        Some(LeafPreimage::PublicData(PublicDataLeafPreimage {
            slot: Felt::new(3),
            value: Felt::new(7),
            next_slot: Felt::new(8),
            next_index: 5,
        }))
    );
    assert_eq!(view.find_leaf_index(TreeKind::PublicData, &public_write(3, 7))?, Some(2));
    assert_eq!(view.find_leaf_index(TreeKind::PublicData, &public_write(3, 42))?, None);
    assert_eq!(chain_keys(&view, TreeKind::PublicData), [0, 1, 3, 8]);
    assert_paths_match_root(&view, TreeKind::PublicData);
    Ok(())
}

/// Tests that rejected batches leave the tree untouched.
#[test]
fn rejected_batches_are_atomic() -> anyhow::Result<()> {
    let mut state = world_state(4);
    state.batch_insert(TreeKind::Nullifier, &nullifiers(&[5]))?;
    let before = state.get_state_reference(true);

    assert_matches!(
        state.batch_insert(TreeKind::Nullifier, &nullifiers(&[20, 5])),
        Err(WorldStateError::Tree {
            tree: TreeKind::Nullifier,
            source: TreeError::DuplicateKey(key),
        }) if key == Felt::new(5)
    );
    assert_matches!(
        state.batch_insert(TreeKind::Nullifier, &nullifiers(&[20, 21, 20])),
        Err(WorldStateError::Tree { source: TreeError::DuplicateKeyInBatch(_), .. })
    );
    assert_matches!(
        state.batch_insert(
            TreeKind::PublicData,
            &[Some(public_write(4, 1)), Some(public_write(4, 2))]
        ),
        Err(WorldStateError::Tree { source: TreeError::DuplicateKeyInBatch(_), .. })
    );

    assert_eq!(state.get_state_reference(true), before);
    assert_eq!(state.as_latest().find_leaf_index(TreeKind::Nullifier, &nullifier(20))?, None);
    Ok(())
}

/// Tests the shape checks and the sibling path returned by subtree insertions.
#[test]
fn subtree_insertion() -> anyhow::Result<()> {
    let mut state = world_state(3);

    assert_matches!(
        state.batch_insert_subtree(TreeKind::Nullifier, &nullifiers(&[10, 11, 12]), 1),
        Err(WorldStateError::Tree {
            source: TreeError::InvalidSubtreeSize { subtree_height: 1, actual: 3 },
            ..
        })
    );
    assert_matches!(
        state.batch_insert(TreeKind::Nullifier, &nullifiers(&[10, 11, 12, 13, 14, 15, 16])),
        Err(WorldStateError::Tree {
            source: TreeError::CapacityExceeded { capacity: 8, size: 2, additional: 7 },
            ..
        })
    );

    let insertion = state.batch_insert_subtree(TreeKind::Nullifier, &nullifiers(&[12, 10]), 1)?;
    let BatchInsertion::Nullifier(result) = insertion else {
        anyhow::bail!("expected a nullifier insertion result");
    };
    let path = result.new_subtree_sibling_path.expect("subtree insertion should return a path");
    assert_eq!(path.depth(), 2);

    let view = state.as_latest();
    let left = view.nullifier_preimage(2)?.expect("leaf 2 should be occupied");
    let right = view.nullifier_preimage(3)?.expect("leaf 3 should be occupied");
    let subtree_root = Hasher::merge(&[left.hash(), right.hash()]);
    assert_eq!(path.compute_root(1, subtree_root)?, view.get_tree_info(TreeKind::Nullifier).root);

    state.batch_insert(TreeKind::Nullifier, &nullifiers(&[20]))?;
    assert_matches!(
        state.batch_insert_subtree(TreeKind::Nullifier, &nullifiers(&[21, 22]), 1),
        Err(WorldStateError::Tree {
            source: TreeError::MisalignedBatch { size: 5, subtree_height: 1 },
            ..
        })
    );
    Ok(())
}

/// Tests that consecutive subtrees are inserted together, and that a failing subtree also
/// undoes the ones inserted before it.
#[test]
fn multi_subtree_insertion_is_all_or_nothing() -> anyhow::Result<()> {
    let mut state = world_state(3);
    let before = state.get_state_reference(true);

    assert_matches!(
        state.batch_insert_subtrees(TreeKind::Nullifier, &nullifiers(&[10, 11, 12, 10]), 1),
        Err(WorldStateError::Tree {
            tree: TreeKind::Nullifier,
            source: TreeError::DuplicateKey(key),
        }) if key == Felt::new(10)
    );
    assert_eq!(state.get_state_reference(true), before);
    assert_eq!(chain_keys(&state.as_latest(), TreeKind::Nullifier), [0, 1]);
    assert_eq!(state.as_latest().find_leaf_index(TreeKind::Nullifier, &nullifier(11))?, None);

    let insertions =
        state.batch_insert_subtrees(TreeKind::Nullifier, &nullifiers(&[10, 11, 12, 13]), 1)?;
    assert_eq!(insertions.len(), 2);
    assert_matches!(&insertions[1], BatchInsertion::Nullifier(result) => {
        assert_eq!(result.sorted_new_leaf_indices, [4, 5]);
    });

    let view = state.as_latest();
    assert_eq!(chain_keys(&view, TreeKind::Nullifier), [0, 1, 10, 11, 12, 13]);
    assert_paths_match_root(&view, TreeKind::Nullifier);

    assert_matches!(
        state.batch_insert_subtrees(TreeKind::NoteHash, &[None, None], 1),
        Err(WorldStateError::NotIndexed(TreeKind::NoteHash))
    );
    Ok(())
}

/// Tests the append-only trees and the operations they do not support.
#[test]
fn append_only_trees() -> anyhow::Result<()> {
    let mut state = world_state(4);
    let values = [10, 20, 10].map(|value| Leaf::Value(Felt::new(value)));

    assert_eq!(state.append_leaves(TreeKind::NoteHash, &values)?, 0);
    assert_eq!(state.append_leaves(TreeKind::NoteHash, &values[..1])?, 3);

    let subtree = [Some(Leaf::Value(Felt::new(30))), None, None, None];
    let insertion = state.batch_insert_subtree(TreeKind::NoteHash, &subtree, 2)?;
    assert_matches!(insertion, BatchInsertion::Appended { first_index: 4, .. });

    let view = state.as_latest();
    assert_eq!(view.get_tree_info(TreeKind::NoteHash).size, 8);
    assert_eq!(view.find_leaf_index(TreeKind::NoteHash, &Leaf::Value(Felt::new(10)))?, Some(0));
    assert_eq!(view.find_leaf_index(TreeKind::NoteHash, &Leaf::Value(Felt::new(30)))?, Some(4));
    assert_eq!(view.get_leaf_value(TreeKind::NoteHash, 1), Some(Leaf::Value(Felt::new(20))));
    assert_eq!(view.get_leaf_value(TreeKind::NoteHash, 5), None);
    assert_paths_match_root(&view, TreeKind::NoteHash);

    assert_matches!(
        view.get_previous_value_index(TreeKind::NoteHash, Felt::new(10)),
        Err(WorldStateError::NotIndexed(TreeKind::NoteHash))
    );
    assert_matches!(
        view.get_leaf_preimage(TreeKind::Archive, 0),
        Err(WorldStateError::NotIndexed(TreeKind::Archive))
    );
    assert_matches!(
        view.get_sibling_path(TreeKind::NoteHash, 16),
        Err(WorldStateError::Tree {
            source: TreeError::LeafIndexOutOfRange { index: 16, depth: 4 },
            ..
        })
    );
    assert_matches!(
        state.batch_insert(TreeKind::NoteHash, &[Some(Leaf::Value(Felt::new(1)))]),
        Err(WorldStateError::NotIndexed(TreeKind::NoteHash))
    );
    assert_matches!(
        state.append_leaves(TreeKind::Nullifier, &[Leaf::Value(Felt::new(1))]),
        Err(WorldStateError::LeafKindMismatch { tree: TreeKind::Nullifier, .. })
    );
    Ok(())
}
