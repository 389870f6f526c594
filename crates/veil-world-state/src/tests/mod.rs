mod indexed_tree;
mod scratchpad;
mod snapshots;
mod sync_block;
mod utils;
