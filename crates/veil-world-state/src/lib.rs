mod config;
pub use config::{ENV_PREFIX, IndexedTreeConfig, TreeConfig, WorldStateConfig};

mod errors;
pub use errors::{ConfigError, ScratchpadError, TreeError, WorldStateError};

pub mod tree;

mod operations;
pub use operations::{BatchInsertion, MerkleTreeReadOperations, MerkleTreeWriteOperations};

mod view;
pub use view::WorldStateView;

mod world_state;
pub use world_state::WorldState;

mod snapshot;
pub use snapshot::SnapshotView;

mod scratchpad;
pub use scratchpad::PublicStateScratchpad;

#[cfg(test)]
mod tests;

/// Tracing target of this crate.
pub const COMPONENT: &str = "veil-world-state";
