//! Witness structures the tail circuit uses to check a transaction's reads against pending and
//! settled state.

mod non_existent;
pub use non_existent::{
    NonMembershipHint, NullifierNonExistentReadRequestHints,
    NullifierNonExistentReadRequestHintsBuilder,
};

mod public_data;
pub use public_data::{
    LeafDataReadHint, PublicDataLeafHint, PublicDataReadRequestHints,
    PublicDataReadRequestHintsBuilder, pad_public_data_hints,
};

mod read_request;
pub use read_request::{
    NullifierReadRequestHints, NullifierReadRequestHintsBuilder, PendingReadHint,
    ReadRequestResolution, ReadRequestState, ReadRequestStatus, SettledReadHint,
};

mod tail_inputs;
pub use tail_inputs::TailCircuitPrivateInputs;
