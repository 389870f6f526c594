//! Persistent Merkle trees backing the world state.

mod node;
pub use node::TreeVersion;

mod key_index;
pub(crate) use key_index::KeyIndex;

mod indexed;
pub use indexed::{BatchInsertionResult, IndexedTree, IndexedTreeView, LowLeafInfo, LowLeafWitness};

mod append_only;
pub use append_only::AppendOnlyTree;
