mod leaf;
pub use leaf::{Leaf, NullifierLeaf, PublicDataLeaf, hash_value_leaf};

mod preimage;
pub use preimage::{
    IndexedLeafPreimage, LeafPreimage, NullifierLeafPreimage, PublicDataLeafPreimage,
};

mod sibling_path;
pub use sibling_path::{MembershipWitness, SiblingPath};

mod state_reference;
pub use state_reference::{PartialStateReference, StateReference, TreeInfo, TreeSnapshot};

mod tree_kind;
pub use tree_kind::TreeKind;
