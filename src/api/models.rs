use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::blockchain::{Block, Ledger};
use crate::transaction::Transaction;

/// Shared application state: the ledger behind a short-held lock, and a
/// separate lock that keeps at most one proof search running.
pub struct AppState {
    pub ledger: Mutex<Ledger>,
    pub miner: Mutex<()>,
}

impl AppState {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            miner: Mutex::new(()),
        }
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse<'a> {
    pub chain: &'a [Block],
    pub length: usize,
}

#[derive(Serialize)]
pub struct ValidResponse {
    #[serde(rename = "Message")]
    pub message: &'static str,
    pub valid: bool,
}

#[derive(Serialize)]
pub struct MineResponse {
    #[serde(rename = "MESSAGE")]
    pub message: &'static str,
    #[serde(rename = "Index")]
    pub index: u64,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Proof")]
    pub proof: u64,
    #[serde(rename = "Previous_hash")]
    pub previous_hash: String,
    #[serde(rename = "Transactions")]
    pub transactions: Vec<Transaction>,
}

impl From<Block> for MineResponse {
    fn from(block: Block) -> Self {
        Self {
            message: "A block is mined successfully!",
            index: block.index,
            timestamp: block.timestamp,
            proof: block.proof,
            previous_hash: block.previous_hash,
            transactions: block.transactions,
        }
    }
}

/* ---------- TX API Models ---------- */

/// Raw form fields; presence and format are checked by the handler.
#[derive(Deserialize)]
pub struct AddTransactionForm {
    pub sender: Option<String>,
    pub receiver: Option<String>,
    pub amount: Option<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    #[serde(rename = "Message")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
