use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use veil_objects::{
    INITIAL_NULLIFIER_TREE_SIZE, INITIAL_PUBLIC_DATA_TREE_SIZE, MAX_TREE_DEPTH, tree::TreeKind,
};

use crate::ConfigError;

/// Prefix of the environment variables overriding the configuration file.
///
/// Nested keys are separated by a double underscore, e.g.
/// `VEIL_WORLD_STATE_NULLIFIER_TREE__DEPTH=24`.
pub const ENV_PREFIX: &str = "VEIL_WORLD_STATE_";

// TREE CONFIGS
// ================================================================================================

/// Configuration of an append-only tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    pub depth: u8,
}

/// Configuration of an indexed tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedTreeConfig {
    pub depth: u8,
    /// Number of sentinel leaves, with keys `0..initial_size`, the tree starts with.
    pub initial_size: u64,
}

// WORLD STATE CONFIG
// ================================================================================================

/// Shape of every tree of the world state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldStateConfig {
    pub nullifier_tree: IndexedTreeConfig,
    pub public_data_tree: IndexedTreeConfig,
    pub note_hash_tree: TreeConfig,
    pub l1_to_l2_message_tree: TreeConfig,
    pub archive_tree: TreeConfig,
}

impl WorldStateConfig {
    /// Loads the configuration from the TOML file at `path`, overridden by environment
    /// variables starting with [`ENV_PREFIX`]. Keys missing from both fall back to
    /// [`WorldStateConfig::default`]. A missing file is treated as empty.
    ///
    /// # Errors
    /// Returns an error if the sources cannot be parsed or the result fails
    /// [`WorldStateConfig::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|err| ConfigError::Load(Box::new(err)))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks that every depth lies in `1..=MAX_TREE_DEPTH` and every initial size in
    /// `1..=2^depth`.
    ///
    /// # Errors
    /// Returns the first violation found, in [`TreeKind::ALL`] order.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for tree in TreeKind::ALL {
            let depth = self.depth(tree);
            if !(1..=MAX_TREE_DEPTH).contains(&depth) {
                return Err(ConfigError::InvalidDepth { tree, depth });
            }
        }

        for (tree, config) in [
            (TreeKind::Nullifier, self.nullifier_tree),
            (TreeKind::PublicData, self.public_data_tree),
        ] {
            let capacity = 1u128 << config.depth;
            if config.initial_size == 0 || config.initial_size as u128 > capacity {
                return Err(ConfigError::InvalidInitialSize {
                    tree,
                    initial_size: config.initial_size,
                    depth: config.depth,
                });
            }
        }

        Ok(())
    }

    /// Returns the configured depth of the given tree.
    pub fn depth(&self, tree: TreeKind) -> u8 {
        match tree {
            TreeKind::Nullifier => self.nullifier_tree.depth,
            TreeKind::PublicData => self.public_data_tree.depth,
            TreeKind::NoteHash => self.note_hash_tree.depth,
            TreeKind::L1ToL2Message => self.l1_to_l2_message_tree.depth,
            TreeKind::Archive => self.archive_tree.depth,
        }
    }

    /// Returns this configuration with the depth of `tree` replaced.
    pub fn with_depth(mut self, tree: TreeKind, depth: u8) -> Self {
        match tree {
            TreeKind::Nullifier => self.nullifier_tree.depth = depth,
            TreeKind::PublicData => self.public_data_tree.depth = depth,
            TreeKind::NoteHash => self.note_hash_tree.depth = depth,
            TreeKind::L1ToL2Message => self.l1_to_l2_message_tree.depth = depth,
            TreeKind::Archive => self.archive_tree.depth = depth,
        }
        self
    }

    /// Returns this configuration with every tree set to `depth`.
    pub fn with_uniform_depth(self, depth: u8) -> Self {
        TreeKind::ALL.into_iter().fold(self, |config, tree| config.with_depth(tree, depth))
    }
}

impl Default for WorldStateConfig {
    fn default() -> Self {
        Self {
            nullifier_tree: IndexedTreeConfig {
                depth: TreeKind::Nullifier.default_depth(),
                initial_size: INITIAL_NULLIFIER_TREE_SIZE,
            },
            public_data_tree: IndexedTreeConfig {
                depth: TreeKind::PublicData.default_depth(),
                initial_size: INITIAL_PUBLIC_DATA_TREE_SIZE,
            },
            note_hash_tree: TreeConfig { depth: TreeKind::NoteHash.default_depth() },
            l1_to_l2_message_tree: TreeConfig {
                depth: TreeKind::L1ToL2Message.default_depth(),
            },
            archive_tree: TreeConfig { depth: TreeKind::Archive.default_depth() },
        }
    }
}

// TESTS
// ================================================================================================
