use thiserror::Error;

/// Failures of the ledger core. Chain invalidity is not an error; see
/// [`crate::blockchain::Ledger::is_valid`].
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("chain file i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("chain serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("chain tip moved while the proof was being searched")]
    StaleTarget,

    #[error("proof {proof} does not satisfy the difficulty predicate for previous proof {previous_proof}")]
    InvalidProof { proof: u64, previous_proof: u64 },

    #[error("chain has no blocks")]
    EmptyChain,
}

pub type Result<T> = std::result::Result<T, LedgerError>;
