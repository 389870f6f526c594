mod tail_phase;
mod utils;
