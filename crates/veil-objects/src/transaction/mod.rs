mod accumulated_data;
pub use accumulated_data::{
    AccumulatedData, merge_accumulated_data, pad_to_max_len, sort_by_counter,
};

mod circuit_array;
pub use circuit_array::CircuitArray;

mod kernel_output;
pub use kernel_output::{PreviousKernelData, PublicKernelOutput, ValidationRequests};

mod side_effects;
pub use side_effects::{
    NoteHash, Nullifier, PublicDataRead, PublicDataUpdateRequest, ReadRequest, SideEffect,
    SideEffectCounter, SideEffectKind, SideEffectRecord,
};
