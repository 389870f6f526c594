use thiserror::Error;
use veil_objects::{
    Felt, MAX_TREE_DEPTH,
    block::BlockNumber,
    transaction::SideEffectCounter,
    tree::{Leaf, TreeKind},
};

// TREE ERROR
// ================================================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error(
        "inserting {additional} leaves into a tree of size {size} exceeds its capacity of {capacity} leaves"
    )]
    CapacityExceeded { capacity: u128, size: u64, additional: usize },

    #[error("tree size {size} is not aligned to subtrees of height {subtree_height}")]
    MisalignedBatch { size: u64, subtree_height: u8 },

    #[error("subtree of height {subtree_height} cannot be built from {actual} leaves")]
    InvalidSubtreeSize { subtree_height: u8, actual: usize },

    #[error("tree has no leaf with a key lower than or equal to the requested key")]
    TreeEmpty,

    #[error("leaf index {index} is outside a tree of depth {depth}")]
    LeafIndexOutOfRange { index: u64, depth: u8 },

    #[error("key {0} is already present in the tree")]
    DuplicateKey(Felt),

    #[error("key {0} appears more than once in the same batch")]
    DuplicateKeyInBatch(Felt),
}

// WORLD STATE ERROR
// ================================================================================================

#[derive(Debug, Error)]
pub enum WorldStateError {
    #[error("operation on the {tree} failed")]
    Tree {
        tree: TreeKind,
        source: TreeError,
    },

    #[error("{0} is not an indexed tree")]
    NotIndexed(TreeKind),

    #[error("leaf {leaf:?} cannot be stored in the {tree}")]
    LeafKindMismatch { tree: TreeKind, leaf: Leaf },

    #[error("block {0} is not part of the world state history")]
    UnknownBlock(BlockNumber),

    #[error("snapshot of block {0} is read-only")]
    ReadOnlyViolation(BlockNumber),

    #[error("expected block {expected} to be synced next but got block {actual}")]
    UnexpectedBlockNumber {
        expected: BlockNumber,
        actual: BlockNumber,
    },

    #[error("applying block {block_num} produced a {tree} that differs from the block's state reference")]
    BlockStateMismatch { block_num: BlockNumber, tree: TreeKind },

    #[error("invalid world state configuration")]
    InvalidConfig(#[from] ConfigError),
}

// SCRATCHPAD ERROR
// ================================================================================================

#[derive(Debug, Error)]
pub enum ScratchpadError {
    #[error("storage write counter {current} does not exceed the previous write counter {previous}")]
    CounterNotIncreasing {
        previous: SideEffectCounter,
        current: SideEffectCounter,
    },

    #[error("world state operation of the scratchpad failed")]
    WorldState(#[from] WorldStateError),
}

// CONFIG ERROR
// ================================================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load the world state configuration")]
    Load(#[source] Box<figment::Error>),

    #[error("depth {depth} of the {tree} must be between 1 and {max}", max = MAX_TREE_DEPTH)]
    InvalidDepth { tree: TreeKind, depth: u8 },

    #[error(
        "initial size {initial_size} of the {tree} must be at least 1 and fit into a tree of depth {depth}"
    )]
    InvalidInitialSize {
        tree: TreeKind,
        initial_size: u64,
        depth: u8,
    },
}
