use alloc::{string::ToString, vec::Vec};

use super::accumulated_data::{check_capacity, padded_fields, push_checked};
use crate::{
    AccumulatedDataError, Digest, Felt,
    transaction::{
        AccumulatedData, CircuitArray, NoteHash, Nullifier, PublicDataRead,
        PublicDataUpdateRequest, ReadRequest, SideEffectKind, SideEffectRecord,
    },
    utils::{
        push_digest,
        serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
    },
};

// VALIDATION REQUESTS
// ================================================================================================

/// The reads of a transaction which must be checked against pending or settled state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationRequests {
    nullifier_read_requests: Vec<ReadRequest>,
    nullifier_non_existent_read_requests: Vec<ReadRequest>,
    public_data_reads: Vec<PublicDataRead>,
}

impl ValidationRequests {
    /// # Errors
    /// Returns an error if any of the arrays exceeds its capacity.
    pub fn new(
        nullifier_read_requests: Vec<ReadRequest>,
        nullifier_non_existent_read_requests: Vec<ReadRequest>,
        public_data_reads: Vec<PublicDataRead>,
    ) -> Result<Self, AccumulatedDataError> {
        check_capacity(&nullifier_read_requests, CircuitArray::NullifierReadRequests)?;
        check_capacity(
            &nullifier_non_existent_read_requests,
            CircuitArray::NullifierNonExistentReadRequests,
        )?;
        check_capacity(&public_data_reads, CircuitArray::PublicDataReads)?;

        Ok(Self {
            nullifier_read_requests,
            nullifier_non_existent_read_requests,
            public_data_reads,
        })
    }

    pub fn nullifier_read_requests(&self) -> &[ReadRequest] {
        &self.nullifier_read_requests
    }

    pub fn nullifier_non_existent_read_requests(&self) -> &[ReadRequest] {
        &self.nullifier_non_existent_read_requests
    }

    pub fn public_data_reads(&self) -> &[PublicDataRead] {
        &self.public_data_reads
    }

    pub fn to_fields(&self) -> Vec<Felt> {
        let mut fields =
            padded_fields(&self.nullifier_read_requests, CircuitArray::NullifierReadRequests);
        fields.extend(padded_fields(
            &self.nullifier_non_existent_read_requests,
            CircuitArray::NullifierNonExistentReadRequests,
        ));
        fields.extend(padded_fields(&self.public_data_reads, CircuitArray::PublicDataReads));
        fields
    }
}

// PUBLIC KERNEL OUTPUT
// ================================================================================================

/// The public inputs the tail phase receives from the previous kernel iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicKernelOutput {
    validation_requests: ValidationRequests,
    end_non_revertible_data: AccumulatedData,
    end: AccumulatedData,
}

impl PublicKernelOutput {
    pub fn new(
        validation_requests: ValidationRequests,
        end_non_revertible_data: AccumulatedData,
        end: AccumulatedData,
    ) -> Self {
        Self {
            validation_requests,
            end_non_revertible_data,
            end,
        }
    }

    /// Sorts raw side effect records into the typed arrays of a kernel output.
    ///
    /// Reads become validation requests; writes are accumulated into the non-revertible or
    /// revertible data depending on the record.
    ///
    /// # Errors
    /// Returns an error if:
    /// - the counters of the records do not strictly increase.
    /// - any of the arrays exceeds its capacity.
    pub fn from_records(
        records: impl IntoIterator<Item = SideEffectRecord>,
    ) -> Result<Self, AccumulatedDataError> {
        let mut output = Self::default();
        let mut previous_counter = None;

        for record in records {
            match previous_counter {
                Some(previous) if record.counter <= previous => {
                    return Err(AccumulatedDataError::CounterNotIncreasing {
                        previous,
                        current: record.counter,
                    });
                },
                _ => (),
            }
            previous_counter = Some(record.counter);

            let data = if record.revertible {
                &mut output.end
            } else {
                &mut output.end_non_revertible_data
            };
            let requests = &mut output.validation_requests;

            match record.kind {
                SideEffectKind::NullifierRead => push_checked(
                    &mut requests.nullifier_read_requests,
                    ReadRequest::new(record.key, record.counter),
                    CircuitArray::NullifierReadRequests,
                )?,
                SideEffectKind::NullifierNonExistentRead => push_checked(
                    &mut requests.nullifier_non_existent_read_requests,
                    ReadRequest::new(record.key, record.counter),
                    CircuitArray::NullifierNonExistentReadRequests,
                )?,
                SideEffectKind::PublicDataRead => push_checked(
                    &mut requests.public_data_reads,
                    PublicDataRead::new(record.key, record.value, record.counter),
                    CircuitArray::PublicDataReads,
                )?,
                SideEffectKind::NullifierWrite => data
                    .push_nullifier(Nullifier::new(record.key, record.value, record.counter))?,
                SideEffectKind::NoteHashWrite => {
                    data.push_note_hash(NoteHash::new(record.key, record.counter))?
                },
                SideEffectKind::PublicDataWrite => data.push_public_data_update_request(
                    PublicDataUpdateRequest::new(record.key, record.value, record.counter),
                )?,
            }
        }

        Ok(output)
    }

    pub fn validation_requests(&self) -> &ValidationRequests {
        &self.validation_requests
    }

    pub fn end_non_revertible_data(&self) -> &AccumulatedData {
        &self.end_non_revertible_data
    }

    pub fn end(&self) -> &AccumulatedData {
        &self.end
    }

    pub fn to_fields(&self) -> Vec<Felt> {
        let mut fields = self.validation_requests.to_fields();
        fields.extend(self.end_non_revertible_data.to_fields());
        fields.extend(self.end.to_fields());
        fields
    }
}

// PREVIOUS KERNEL DATA
// ================================================================================================

/// The output of the previous kernel iteration together with a commitment to its proof.
///
/// The proof itself is produced and checked by the external prover; only its commitment is
/// carried into the tail inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviousKernelData {
    public_inputs: PublicKernelOutput,
    proof_commitment: Digest,
}

impl PreviousKernelData {
    pub fn new(public_inputs: PublicKernelOutput, proof_commitment: Digest) -> Self {
        Self { public_inputs, proof_commitment }
    }

    pub fn public_inputs(&self) -> &PublicKernelOutput {
        &self.public_inputs
    }

    pub fn proof_commitment(&self) -> Digest {
        self.proof_commitment
    }

    pub fn to_fields(&self) -> Vec<Felt> {
        let mut fields = self.public_inputs.to_fields();
        push_digest(&mut fields, &self.proof_commitment);
        fields
    }
}

// SERIALIZATION
// ================================================================================================

impl Serializable for ValidationRequests {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_usize(self.nullifier_read_requests.len());
        target.write_many(&self.nullifier_read_requests);
        target.write_usize(self.nullifier_non_existent_read_requests.len());
        target.write_many(&self.nullifier_non_existent_read_requests);
        target.write_usize(self.public_data_reads.len());
        target.write_many(&self.public_data_reads);
    }
}

impl Deserializable for ValidationRequests {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let num_reads = source.read_usize()?;
        let nullifier_read_requests = source.read_many(num_reads)?;
        let num_non_existent = source.read_usize()?;
        let nullifier_non_existent_read_requests = source.read_many(num_non_existent)?;
        let num_public_reads = source.read_usize()?;
        let public_data_reads = source.read_many(num_public_reads)?;

        Self::new(nullifier_read_requests, nullifier_non_existent_read_requests, public_data_reads)
            .map_err(|err| DeserializationError::InvalidValue(err.to_string()))
    }
}

impl Serializable for PublicKernelOutput {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.validation_requests.write_into(target);
        self.end_non_revertible_data.write_into(target);
        self.end.write_into(target);
    }
}

impl Deserializable for PublicKernelOutput {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            validation_requests: source.read()?,
            end_non_revertible_data: source.read()?,
            end: source.read()?,
        })
    }
}

impl Serializable for PreviousKernelData {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.public_inputs.write_into(target);
        target.write(self.proof_commitment);
    }
}

impl Deserializable for PreviousKernelData {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self {
            public_inputs: source.read()?,
            proof_commitment: source.read()?,
        })
    }
}

// TESTS
// ================================================================================================
