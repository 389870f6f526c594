mod errors;
pub use errors::{HintError, TailPhaseError};

mod hints_builder;
pub use hints_builder::HintsBuilder;

mod tail_phase;
pub use tail_phase::{TailOutput, TailPhase};

#[cfg(test)]
mod tests;

/// Tracing target of this crate.
pub const COMPONENT: &str = "veil-tail-prover";
