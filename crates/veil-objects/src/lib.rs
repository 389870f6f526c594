#![no_std]

#[macro_use]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod block;
pub mod hints;
pub mod transaction;
pub mod tree;

#[cfg(any(feature = "testing", test))]
pub mod testing;

mod constants;
mod errors;

// RE-EXPORTS
// ================================================================================================

pub use constants::*;
pub use errors::{AccumulatedDataError, LeafCodecError};
pub use miden_crypto::{
    EMPTY_WORD, Felt, FieldElement, ONE, StarkField, Word, ZERO,
    hash::rpo::{Rpo256 as Hasher, RpoDigest as Digest},
};

pub mod crypto {
    pub use miden_crypto::{hash, merkle, utils};
}

pub mod utils {
    use alloc::vec::Vec;

    use crate::{Digest, Felt};

    pub mod serde {
        pub use miden_crypto::utils::{
            ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable,
        };
    }

    /// Appends the four elements of `digest` to `fields`.
    pub fn push_digest(fields: &mut Vec<Felt>, digest: &Digest) {
        fields.extend_from_slice(digest.as_elements());
    }

    /// Converts a `u64` into a field element.
    ///
    /// Callers must only pass values below the field modulus (leaf indices, sizes and counters
    /// always are), otherwise the value silently wraps around.
    pub fn felt_from_u64(value: u64) -> Felt {
        Felt::new(value)
    }
}
