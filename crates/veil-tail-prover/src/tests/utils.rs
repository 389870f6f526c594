use veil_objects::{
    Digest,
    testing::{TxRecordsBuilder, felt},
    transaction::PreviousKernelData,
    tree::{Leaf, NullifierLeaf, TreeKind},
};
use veil_world_state::{
    MerkleTreeWriteOperations, PublicStateScratchpad, WorldState, WorldStateConfig,
};

/// Returns a committed world state of depth 8 holding the nullifiers `10` and `20` and the
/// public slot `5` set to `50`.
pub fn settled_state() -> WorldState {
    let mut state = WorldState::new(WorldStateConfig::default().with_uniform_depth(8))
        .expect("test configuration should be valid");

    let nullifiers = [10, 20].map(|value| Some(Leaf::Nullifier(NullifierLeaf::new(felt(value)))));
    state
        .batch_insert(TreeKind::Nullifier, &nullifiers)
        .expect("nullifiers should be insertable");

    let mut scratchpad = PublicStateScratchpad::new();
    scratchpad.storage_write(felt(5), felt(50), 1).expect("first write should succeed");
    scratchpad.commit(&mut state).expect("public write should be insertable");

    state.commit().expect("commit should succeed");
    state
}

pub fn previous_kernel(records: TxRecordsBuilder) -> PreviousKernelData {
    let output = records.kernel_output().expect("records should fit the kernel output");
    PreviousKernelData::new(output, Digest::default())
}
