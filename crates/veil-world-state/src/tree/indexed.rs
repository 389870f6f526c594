use std::collections::BTreeMap;

use veil_objects::{
    Felt, StarkField,
    tree::{IndexedLeafPreimage, MembershipWitness, SiblingPath, TreeInfo, TreeKind},
};

use super::{TreeVersion, key_index::KeyIndex};
use crate::TreeError;

// LOW LEAF
// ================================================================================================

/// The result of a low leaf lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LowLeafInfo {
    /// Index of the leaf holding the largest key lower than or equal to the requested key.
    pub index: u64,
    /// Whether the leaf at `index` holds exactly the requested key.
    pub already_present: bool,
}

/// A low leaf as it was right before a batch updated it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowLeafWitness<P> {
    pub index: u64,
    pub preimage: P,
    pub sibling_path: SiblingPath,
}

impl<P> LowLeafWitness<P> {
    pub fn membership_witness(&self) -> MembershipWitness {
        MembershipWitness::new(self.index, self.sibling_path.clone())
    }
}

/// Everything a circuit needs to verify a batch insertion into an indexed tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchInsertionResult<P> {
    /// One entry per input leaf, in input order. `None` for padding and for leaves whose low
    /// leaf was inserted earlier in the same batch.
    pub low_leaf_witnesses: Vec<Option<LowLeafWitness<P>>>,
    /// Final preimages of the newly inserted leaves, sorted by key.
    pub sorted_new_leaves: Vec<P>,
    /// Tree indices of `sorted_new_leaves`.
    pub sorted_new_leaf_indices: Vec<u64>,
    /// Sibling path of the inserted subtree root, for subtree insertions only.
    pub new_subtree_sibling_path: Option<SiblingPath>,
}

// INDEXED TREE VIEW
// ================================================================================================

/// Read access to one version of an indexed tree.
#[derive(Debug)]
pub struct IndexedTreeView<'a, P> {
    version: &'a TreeVersion<P>,
    keys: &'a KeyIndex,
}

impl<P> Clone for IndexedTreeView<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for IndexedTreeView<'_, P> {}

impl<'a, P: IndexedLeafPreimage> IndexedTreeView<'a, P> {
    pub(crate) fn new(version: &'a TreeVersion<P>, keys: &'a KeyIndex) -> Self {
        Self { version, keys }
    }

    pub fn version(&self) -> &'a TreeVersion<P> {
        self.version
    }

    pub fn info(&self, tree: TreeKind) -> TreeInfo {
        self.version.info(tree)
    }

    /// Finds the leaf holding the largest key lower than or equal to `key`.
    ///
    /// # Errors
    /// Returns an error if no leaf holds such a key, which only happens for a tree without
    /// leaves.
    pub fn find_low_leaf(&self, key: Felt) -> Result<LowLeafInfo, TreeError> {
        let key = key.as_int();
        self.keys
            .low_leaf(key, self.version.size())
            .map(|(low_key, index)| LowLeafInfo { index, already_present: low_key == key })
            .ok_or(TreeError::TreeEmpty)
    }

    pub fn preimage(&self, index: u64) -> Option<&'a P> {
        self.version.leaf(index)
    }

    /// Returns the index of the leaf holding exactly `leaf`.
    pub fn find_leaf_index(&self, leaf: &P::Leaf) -> Option<u64> {
        let index = self.keys.get(P::leaf_key(leaf).as_int(), self.version.size())?;
        self.preimage(index).filter(|preimage| preimage.leaf() == *leaf).map(|_| index)
    }
}

// INDEXED TREE
// ================================================================================================

/// A Merkle tree whose leaves form a linked list sorted by key.
///
/// Writes go to an uncommitted version which replaces the committed one on
/// [`IndexedTree::commit`].
#[derive(Debug)]
pub struct IndexedTree<P: IndexedLeafPreimage> {
    kind: TreeKind,
    committed: TreeVersion<P>,
    uncommitted: TreeVersion<P>,
    keys: KeyIndex,
}

impl<P: IndexedLeafPreimage> IndexedTree<P> {
    /// Creates a tree holding `initial_size` sentinel leaves with keys `0..initial_size`,
    /// chained in order and committed.
    ///
    /// # Errors
    /// Returns an error if the sentinels do not fit into a tree of the given depth.
    pub fn new(kind: TreeKind, depth: u8, initial_size: u64) -> Result<Self, TreeError> {
        let mut version = TreeVersion::empty(depth);
        if initial_size as u128 > version.capacity() {
            return Err(TreeError::CapacityExceeded {
                capacity: version.capacity(),
                size: 0,
                additional: initial_size as usize,
            });
        }

        for index in 0..initial_size {
            let (next_key, next_index) = if index + 1 < initial_size {
                (Felt::new(index + 1), index + 1)
            } else {
                (Felt::new(0), 0)
            };
            let preimage = P::new(P::leaf_with_key(Felt::new(index)), next_key, next_index);
            version = version.with_leaf(index, preimage.hash(), preimage)?;
        }

        let keys = KeyIndex::default();
        keys.insert_all((0..initial_size).map(|index| (index, index)));

        Ok(Self {
            kind,
            committed: version.clone(),
            uncommitted: version,
            keys,
        })
    }

    pub fn kind(&self) -> TreeKind {
        self.kind
    }

    pub fn version(&self, include_uncommitted: bool) -> &TreeVersion<P> {
        if include_uncommitted { &self.uncommitted } else { &self.committed }
    }

    pub fn view(&self, include_uncommitted: bool) -> IndexedTreeView<'_, P> {
        IndexedTreeView::new(self.version(include_uncommitted), &self.keys)
    }

    pub(crate) fn keys(&self) -> &KeyIndex {
        &self.keys
    }

    /// Appends a single leaf and returns its index.
    ///
    /// # Errors
    /// See [`IndexedTree::batch_insert`].
    pub fn append(&mut self, leaf: P::Leaf) -> Result<u64, TreeError> {
        self.append_leaves(&[leaf])
    }

    /// Appends leaves at consecutive indices and returns the index of the first one.
    ///
    /// # Errors
    /// See [`IndexedTree::batch_insert`].
    pub fn append_leaves(&mut self, leaves: &[P::Leaf]) -> Result<u64, TreeError> {
        let start = self.uncommitted.size();
        let leaves: Vec<_> = leaves.iter().copied().map(Some).collect();
        self.insert(&leaves, None)?;
        Ok(start)
    }

    /// Inserts `leaves` at consecutive indices starting at the current size. `None` entries
    /// leave their slot empty.
    ///
    /// # Errors
    /// Returns an error if:
    /// - the leaves do not fit into the tree.
    /// - the same key appears twice among `leaves`.
    /// - a key is already present in a tree whose leaves cannot be updated.
    ///
    /// The tree is left untouched on error.
    pub fn batch_insert(
        &mut self,
        leaves: &[Option<P::Leaf>],
    ) -> Result<BatchInsertionResult<P>, TreeError> {
        self.insert(leaves, None)
    }

    /// Inserts `leaves` as a complete subtree of height `subtree_height`.
    ///
    /// # Errors
    /// Returns an error if:
    /// - the leaves do not fit into the tree.
    /// - the number of leaves is not `2^subtree_height`.
    /// - the current size is not a multiple of `2^subtree_height`.
    /// - any of the conditions of [`IndexedTree::batch_insert`] is violated.
    pub fn batch_insert_subtree(
        &mut self,
        leaves: &[Option<P::Leaf>],
        subtree_height: u8,
    ) -> Result<BatchInsertionResult<P>, TreeError> {
        self.insert(leaves, Some(subtree_height))
    }

    /// Inserts `leaves` as consecutive complete subtrees of height `subtree_height` and returns
    /// one result per subtree.
    ///
    /// # Errors
    /// Returns an error if the leaves do not fit into the tree, their number is not a multiple
    /// of `2^subtree_height`, or inserting any of the subtrees fails. The tree is left
    /// untouched on error, including by the subtrees preceding the failing one.
    pub fn batch_insert_subtrees(
        &mut self,
        leaves: &[Option<P::Leaf>],
        subtree_height: u8,
    ) -> Result<Vec<BatchInsertionResult<P>>, TreeError> {
        check_batch_shape(&self.uncommitted, leaves.len(), None)?;
        let subtree_size = 1usize.checked_shl(subtree_height.into()).unwrap_or(usize::MAX);

        let saved = self.uncommitted.clone();
        let results = leaves
            .chunks(subtree_size)
            .map(|subtree| self.insert(subtree, Some(subtree_height)))
            .collect::<Result<Vec<_>, _>>();

        if results.is_err() {
            self.keys.truncate(saved.size());
            self.uncommitted = saved;
        }
        results
    }

    pub fn commit(&mut self) {
        self.committed = self.uncommitted.clone();
    }

    pub fn rollback(&mut self) {
        self.uncommitted = self.committed.clone();
        self.keys.truncate(self.committed.size());
    }

    // HELPERS
    // --------------------------------------------------------------------------------------------

    fn insert(
        &mut self,
        leaves: &[Option<P::Leaf>],
        subtree_height: Option<u8>,
    ) -> Result<BatchInsertionResult<P>, TreeError> {
        let start = self.uncommitted.size();
        check_batch_shape(&self.uncommitted, leaves.len(), subtree_height)?;

        let mut pending: Vec<(usize, u64, P::Leaf)> = leaves
            .iter()
            .enumerate()
            .filter_map(|(position, leaf)| {
                leaf.map(|leaf| (position, P::leaf_key(&leaf).as_int(), leaf))
            })
            .collect();
        pending.sort_by_key(|(_, key, _)| *key);

        for pair in pending.windows(2) {
            if pair[0].1 == pair[1].1 {
                return Err(TreeError::DuplicateKeyInBatch(Felt::new(pair[0].1)));
            }
        }
        if !P::UPDATABLE {
            if let Some((_, key, _)) =
                pending.iter().find(|(_, key, _)| self.keys.get(*key, start).is_some())
            {
                return Err(TreeError::DuplicateKey(Felt::new(*key)));
            }
        }

        let mut version = self.uncommitted.clone();
        let mut low_leaf_witnesses: Vec<Option<LowLeafWitness<P>>> = vec![None; leaves.len()];
        let mut new_leaves: Vec<Option<P>> = vec![None; leaves.len()];
        let mut last_new: Option<(usize, u64)> = None;

        for &(position, key, leaf) in &pending {
            let new_index = start + position as u64;
            let Some((low_key, low_index)) = self.keys.low_leaf(key, start) else {
                return Err(TreeError::TreeEmpty);
            };

            if low_key == key {
                // only reachable for updatable trees
                let preimage = existing_leaf(&version, low_index);
                low_leaf_witnesses[position] = Some(LowLeafWitness {
                    index: low_index,
                    preimage: preimage.clone(),
                    sibling_path: version.sibling_path(low_index)?,
                });
                let updated = preimage.with_leaf(leaf);
                version = version.with_leaf(low_index, updated.hash(), updated)?;
                continue;
            }

            match last_new {
                Some((low_position, pending_key)) if pending_key > low_key => {
                    let Some(low) = new_leaves[low_position].take() else {
                        panic!("pending leaf at batch position {low_position} is missing");
                    };
                    new_leaves[position] = Some(P::new(leaf, low.next_key(), low.next_index()));
                    new_leaves[low_position] = Some(low.with_next(Felt::new(key), new_index));
                },
                _ => {
                    let low = existing_leaf(&version, low_index);
                    assert!(
                        low.key_int() < key
                            && (low.next_index() == 0 || low.next_key().as_int() > key),
                        "indexed tree chain is corrupted at leaf {low_index}"
                    );
                    low_leaf_witnesses[position] = Some(LowLeafWitness {
                        index: low_index,
                        preimage: low.clone(),
                        sibling_path: version.sibling_path(low_index)?,
                    });
                    new_leaves[position] = Some(P::new(leaf, low.next_key(), low.next_index()));
                    let updated = low.with_next(Felt::new(key), new_index);
                    version = version.with_leaf(low_index, updated.hash(), updated)?;
                },
            }
            last_new = Some((position, key));
        }

        let mut inserted = BTreeMap::new();
        for (position, preimage) in new_leaves.into_iter().enumerate() {
            if let Some(preimage) = preimage {
                let index = start + position as u64;
                inserted.insert(preimage.key_int(), (index, preimage.clone()));
                version = version.with_leaf(index, preimage.hash(), preimage)?;
            }
        }
        let version = version.with_size(start + leaves.len() as u64);

        let new_subtree_sibling_path = match subtree_height {
            Some(height) => {
                let path = version.sibling_path(start)?;
                Some(SiblingPath::new(path.nodes()[height as usize..].to_vec()))
            },
            None => None,
        };

        self.keys.insert_all(inserted.iter().map(|(key, (index, _))| (*key, *index)));
        self.uncommitted = version;

        let (sorted_new_leaf_indices, sorted_new_leaves): (Vec<u64>, Vec<P>) =
            inserted.into_values().unzip();
        Ok(BatchInsertionResult {
            low_leaf_witnesses,
            sorted_new_leaves,
            sorted_new_leaf_indices,
            new_subtree_sibling_path,
        })
    }
}

/// Returns the leaf an up to date key index points at.
fn existing_leaf<P: IndexedLeafPreimage>(version: &TreeVersion<P>, index: u64) -> P {
    match version.leaf(index) {
        Some(leaf) => leaf.clone(),
        None => panic!("key index points at empty leaf slot {index}"),
    }
}

/// Checks that a batch of `len` leaves fits into `version`, and for subtree insertions that
/// the batch forms a complete, aligned subtree.
pub(super) fn check_batch_shape<L: Clone>(
    version: &TreeVersion<L>,
    len: usize,
    subtree_height: Option<u8>,
) -> Result<(), TreeError> {
    let size = version.size();
    if size as u128 + len as u128 > version.capacity() {
        return Err(TreeError::CapacityExceeded {
            capacity: version.capacity(),
            size,
            additional: len,
        });
    }

    if let Some(subtree_height) = subtree_height {
        if subtree_height >= 64 || len as u64 != 1 << subtree_height {
            return Err(TreeError::InvalidSubtreeSize { subtree_height, actual: len });
        }
        if size % (1 << subtree_height) != 0 {
            return Err(TreeError::MisalignedBatch { size, subtree_height });
        }
    }

    Ok(())
}
