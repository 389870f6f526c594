use veil_objects::{
    Felt, StarkField,
    tree::{Leaf, NullifierLeaf, PublicDataLeaf, TreeKind, hash_value_leaf},
};

use crate::{MerkleTreeReadOperations, WorldState, WorldStateConfig};

/// Returns a world state whose trees all have the given depth.
pub fn world_state(depth: u8) -> WorldState {
    WorldState::new(WorldStateConfig::default().with_uniform_depth(depth))
        .expect("test configuration should be valid")
}

pub fn nullifier(value: u64) -> Leaf {
    Leaf::Nullifier(NullifierLeaf::new(Felt::new(value)))
}

pub fn public_write(slot: u64, value: u64) -> Leaf {
    Leaf::PublicData(PublicDataLeaf::new(Felt::new(slot), Felt::new(value)))
}

pub fn nullifiers(values: &[u64]) -> Vec<Option<Leaf>> {
    values.iter().map(|value| Some(nullifier(*value))).collect()
}

/// Walks the linked list of an indexed tree from the first sentinel and returns the visited
/// keys.
pub fn chain_keys(state: &impl MerkleTreeReadOperations, tree: TreeKind) -> Vec<u64> {
    let mut keys = Vec::new();
    let mut index = 0;
    loop {
        let preimage = state
            .get_leaf_preimage(tree, index)
            .expect("tree should be indexed")
            .expect("chain should only point at occupied leaves");
        keys.push(preimage.key().as_int());
        if preimage.next_index() == 0 {
            return keys;
        }
        index = preimage.next_index();
    }
}

/// Asserts that the membership witness of every occupied leaf recomputes the tree root.
pub fn assert_paths_match_root(state: &impl MerkleTreeReadOperations, tree: TreeKind) {
    let info = state.get_tree_info(tree);
    for index in 0..info.size {
        let hash = match state.get_leaf_preimage(tree, index) {
            Ok(Some(preimage)) => preimage.hash(),
            Ok(None) => continue,
            Err(_) => match state.get_leaf_value(tree, index) {
                Some(Leaf::Value(value)) => hash_value_leaf(value),
                _ => continue,
            },
        };
        let witness = state.membership_witness(tree, index).expect("index should be in range");
        assert_eq!(witness.compute_root(hash).expect("path should fit"), info.root, "leaf {index}");
    }
}

/// Returns the number of occupied leaves of an indexed tree.
pub fn occupied_leaves(state: &impl MerkleTreeReadOperations, tree: TreeKind) -> usize {
    let size = state.get_tree_info(tree).size;
    (0..size)
        .filter(|index| matches!(state.get_leaf_preimage(tree, *index), Ok(Some(_))))
        .count()
}
