mod block_number;
pub use block_number::BlockNumber;

mod l2_block;
pub use l2_block::{L2BlockData, TxEffect};
