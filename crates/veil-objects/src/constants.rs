// TREE DEPTHS
// ================================================================================================

/// Depth of the nullifier tree.
pub const NULLIFIER_TREE_DEPTH: u8 = 20;

/// Depth of the note hash tree.
pub const NOTE_HASH_TREE_DEPTH: u8 = 32;

/// Depth of the public data tree.
pub const PUBLIC_DATA_TREE_DEPTH: u8 = 40;

/// Depth of the L1 to L2 message tree.
pub const L1_TO_L2_MESSAGE_TREE_DEPTH: u8 = 16;

/// Depth of the archive tree, which holds one block hash per block.
pub const ARCHIVE_TREE_DEPTH: u8 = 16;

/// Largest supported tree depth. Every leaf index of a tree this deep fits into a single field
/// element, which the `next_index` of an indexed leaf preimage relies on.
pub const MAX_TREE_DEPTH: u8 = 63;

// PREFILL
// ================================================================================================

/// Number of sentinel leaves the nullifier tree is created with.
///
/// The sentinels hold the keys `0..INITIAL_NULLIFIER_TREE_SIZE` so that every insertable key
/// always has a low leaf.
pub const INITIAL_NULLIFIER_TREE_SIZE: u64 = 2;

/// Number of sentinel leaves the public data tree is created with.
pub const INITIAL_PUBLIC_DATA_TREE_SIZE: u64 = 2;

// SUBTREE HEIGHTS
// ================================================================================================

/// Height of the subtrees the public state scratchpad inserts into the public data tree.
pub const PUBLIC_DATA_SUBTREE_HEIGHT: u8 = 1;

/// Height of the per-transaction nullifier subtree (`2^6 == MAX_NULLIFIERS_PER_TX`).
pub const NULLIFIER_SUBTREE_HEIGHT: u8 = 6;

/// Height of the per-transaction note hash subtree (`2^6 == MAX_NOTE_HASHES_PER_TX`).
pub const NOTE_HASH_SUBTREE_HEIGHT: u8 = 6;

// TRANSACTION LIMITS
// ================================================================================================

/// The maximum number of note hashes a single transaction can create.
pub const MAX_NOTE_HASHES_PER_TX: usize = 64;

/// The maximum number of nullifiers a single transaction can emit.
pub const MAX_NULLIFIERS_PER_TX: usize = 64;

/// The maximum number of public storage writes a single transaction can perform.
pub const MAX_PUBLIC_DATA_UPDATE_REQUESTS_PER_TX: usize = 32;

/// The maximum number of public storage reads a single transaction can perform.
pub const MAX_PUBLIC_DATA_READS_PER_TX: usize = 32;

/// The maximum number of nullifier membership reads a single transaction can perform.
pub const MAX_NULLIFIER_READ_REQUESTS_PER_TX: usize = 32;

/// The maximum number of nullifier non-membership reads a single transaction can perform.
pub const MAX_NULLIFIER_NON_EXISTENT_READ_REQUESTS_PER_TX: usize = 8;

/// The maximum number of distinct public data slots a transaction's hints can cover.
pub const MAX_PUBLIC_DATA_HINTS: usize =
    MAX_PUBLIC_DATA_READS_PER_TX + MAX_PUBLIC_DATA_UPDATE_REQUESTS_PER_TX;
