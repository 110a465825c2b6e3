pub mod block;
pub mod model;
pub mod pow;
pub mod store;

pub use block::Block;
pub use model::Ledger;
pub use store::ChainStore;

/// Digest prefix a proof pair must produce (fixed difficulty).
pub const DIFFICULTY_PREFIX: &str = "00000";

/// Proof carried by the genesis block.
pub const GENESIS_PROOF: u64 = 1;

/// `previous_hash` of the genesis block, which has no predecessor.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Timestamp layout stored on every block (local time, microseconds).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
