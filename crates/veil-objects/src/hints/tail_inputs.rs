use alloc::vec::Vec;

use crate::{
    Felt, MAX_PUBLIC_DATA_HINTS,
    hints::{
        NullifierNonExistentReadRequestHints, NullifierReadRequestHints, PublicDataLeafHint,
        PublicDataReadRequestHints,
    },
    transaction::PreviousKernelData,
    tree::PartialStateReference,
    utils::serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
};

// TAIL CIRCUIT PRIVATE INPUTS
// ================================================================================================

/// Everything the tail circuit consumes besides its public inputs.
///
/// The field encoding concatenates, in order: the previous kernel data, the nullifier read
/// request hints, the nullifier non-existent read request hints, the public data hints, the
/// public data read request hints and the start state reference. Every part is padded, so the
/// encoding has the same length for every transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailCircuitPrivateInputs {
    previous_kernel: PreviousKernelData,
    nullifier_read_request_hints: NullifierReadRequestHints,
    nullifier_non_existent_read_request_hints: NullifierNonExistentReadRequestHints,
    public_data_hints: Vec<PublicDataLeafHint>,
    public_data_read_request_hints: PublicDataReadRequestHints,
    start_state: PartialStateReference,
}

impl TailCircuitPrivateInputs {
    /// Assembles the tail inputs.
    ///
    /// `public_data_hints` must already be padded to [`MAX_PUBLIC_DATA_HINTS`] entries.
    pub fn new(
        previous_kernel: PreviousKernelData,
        nullifier_read_request_hints: NullifierReadRequestHints,
        nullifier_non_existent_read_request_hints: NullifierNonExistentReadRequestHints,
        public_data_hints: Vec<PublicDataLeafHint>,
        public_data_read_request_hints: PublicDataReadRequestHints,
        start_state: PartialStateReference,
    ) -> Self {
        debug_assert_eq!(public_data_hints.len(), MAX_PUBLIC_DATA_HINTS);

        Self {
            previous_kernel,
            nullifier_read_request_hints,
            nullifier_non_existent_read_request_hints,
            public_data_hints,
            public_data_read_request_hints,
            start_state,
        }
    }

    pub fn previous_kernel(&self) -> &PreviousKernelData {
        &self.previous_kernel
    }

    pub fn nullifier_read_request_hints(&self) -> &NullifierReadRequestHints {
        &self.nullifier_read_request_hints
    }

    pub fn nullifier_non_existent_read_request_hints(
        &self,
    ) -> &NullifierNonExistentReadRequestHints {
        &self.nullifier_non_existent_read_request_hints
    }

    pub fn public_data_hints(&self) -> &[PublicDataLeafHint] {
        &self.public_data_hints
    }

    pub fn public_data_read_request_hints(&self) -> &PublicDataReadRequestHints {
        &self.public_data_read_request_hints
    }

    pub fn start_state(&self) -> &PartialStateReference {
        &self.start_state
    }

    /// Returns the fixed-layout field encoding of these inputs.
    pub fn to_fields(&self) -> Vec<Felt> {
        let mut fields = self.previous_kernel.to_fields();
        fields.extend(self.nullifier_read_request_hints.to_fields());
        fields.extend(self.nullifier_non_existent_read_request_hints.to_fields());
        for hint in &self.public_data_hints {
            fields.extend(hint.to_fields());
        }
        fields.extend(self.public_data_read_request_hints.to_fields());
        fields.extend(self.start_state.to_fields());
        fields
    }
}

impl Serializable for TailCircuitPrivateInputs {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.previous_kernel.write_into(target);
        self.nullifier_read_request_hints.write_into(target);
        self.nullifier_non_existent_read_request_hints.write_into(target);
        target.write_many(&self.public_data_hints);
        self.public_data_read_request_hints.write_into(target);
        self.start_state.write_into(target);
    }
}

impl Deserializable for TailCircuitPrivateInputs {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            previous_kernel: source.read()?,
            nullifier_read_request_hints: source.read()?,
            nullifier_non_existent_read_request_hints: source.read()?,
            public_data_hints: source.read_many(MAX_PUBLIC_DATA_HINTS)?,
            public_data_read_request_hints: source.read()?,
            start_state: source.read()?,
        })
    }
}
