use std::mem;

use log::{debug, info, warn};

use super::{Block, ChainStore, pow};
use crate::error::{LedgerError, Result};
use crate::transaction::Transaction;

/// Tip snapshot a proof search works against.
#[derive(Debug, Clone, PartialEq)]
pub struct MiningTarget {
    /// Index the sealed block will get.
    pub index: u64,
    pub previous_proof: u64,
    pub previous_hash: String,
}

/// Persistent proof-of-work chain plus the buffer of pending transactions.
#[derive(Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    store: ChainStore,
}

impl Ledger {
    /// Load the chain from `store`, or seed and persist a genesis block
    /// when nothing usable is stored.
    pub fn open(store: ChainStore) -> Result<Self> {
        let chain = store.load();
        let mut ledger = Self {
            chain,
            pending: Vec::new(),
            store,
        };

        if ledger.chain.is_empty() {
            ledger.chain.push(Block::genesis());
            ledger.store.save(&ledger.chain)?;
            info!(
                "seeded genesis block into {}",
                ledger.store.path().display()
            );
        } else {
            info!(
                "loaded {} blocks from {}",
                ledger.chain.len(),
                ledger.store.path().display()
            );
        }
        Ok(ledger)
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("ledger always holds at least the genesis block")
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Index of the block the next mine will produce.
    pub fn next_index(&self) -> u64 {
        self.chain.len() as u64 + 1
    }

    /// Queue a transaction for the next block and return that block's index.
    pub fn add_transaction(
        &mut self,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: f64,
    ) -> u64 {
        self.pending.push(Transaction::new(sender, receiver, amount));
        let target = self.next_index();
        debug!(
            "queued transaction for block #{} (pending={})",
            target,
            self.pending.len()
        );
        target
    }

    /// Snapshot of the tip for an out-of-lock proof search.
    pub fn mining_target(&self) -> Result<MiningTarget> {
        let previous = self.chain.last().ok_or(LedgerError::EmptyChain)?;
        Ok(MiningTarget {
            index: self.next_index(),
            previous_proof: previous.proof,
            previous_hash: previous.digest(),
        })
    }

    /// Append a block carrying every pending transaction, using a proof
    /// found for `target`, and persist the chain.
    ///
    /// If saving fails the block is dropped and its transactions go back
    /// to the front of the pending buffer.
    pub fn seal_block(&mut self, target: &MiningTarget, proof: u64) -> Result<&Block> {
        let previous = self.chain.last().ok_or(LedgerError::EmptyChain)?;
        if previous.digest() != target.previous_hash {
            return Err(LedgerError::StaleTarget);
        }
        if !pow::satisfies(proof, previous.proof) {
            return Err(LedgerError::InvalidProof {
                proof,
                previous_proof: previous.proof,
            });
        }

        let transactions = mem::take(&mut self.pending);
        let block = Block::new(
            self.next_index(),
            proof,
            target.previous_hash.clone(),
            transactions,
        );
        self.chain.push(block);

        if let Err(e) = self.store.save(&self.chain) {
            warn!("failed to persist block #{}: {}", target.index, e);
            if let Some(block) = self.chain.pop() {
                let mut restored = block.transactions;
                restored.append(&mut self.pending);
                self.pending = restored;
            }
            return Err(e);
        }

        Ok(self.last_block())
    }

    /// Search a proof against the current tip and seal the pending
    /// transactions into a new block. Blocks the caller for the search.
    pub fn mine_block(&mut self) -> Result<&Block> {
        let target = self.mining_target()?;
        let proof = pow::solve(target.previous_proof);
        self.seal_block(&target, proof)
    }

    /// Validate this ledger's chain.
    pub fn is_valid_chain(&self) -> bool {
        Self::is_valid(&self.chain)
    }

    /// Check linkage and proof for every adjacent pair of `chain`.
    /// An empty chain is invalid; a lone genesis block is valid.
    pub fn is_valid(chain: &[Block]) -> bool {
        if chain.is_empty() {
            return false;
        }

        for pair in chain.windows(2) {
            let (prev, current) = (&pair[0], &pair[1]);

            if current.previous_hash != prev.digest() {
                debug!("block #{} does not link to its predecessor", current.index);
                return false;
            }

            if !pow::satisfies(current.proof, prev.proof) {
                debug!("block #{} carries an invalid proof", current.index);
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::{Ledger, MiningTarget};
    use crate::blockchain::{Block, ChainStore};
    use crate::error::LedgerError;
    use std::fs;
    use std::path::Path;

    const LEGACY_CHAIN: &str = include_str!("../../testdata/legacy_chain.json");

    fn open_in(dir: &Path) -> Ledger {
        Ledger::open(ChainStore::new(dir.join("blockchain.json"))).expect("open ledger")
    }

    #[test]
    fn fresh_ledger_seeds_and_persists_genesis() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger = open_in(dir.path());

        assert_eq!(ledger.len(), 1);
        let genesis = ledger.last_block();
        assert_eq!(genesis.index, 1);
        assert_eq!(genesis.proof, 1);
        assert_eq!(genesis.previous_hash, "0");
        assert!(genesis.transactions.is_empty());
        assert!(ledger.pending().is_empty());

        let stored = ChainStore::new(dir.path().join("blockchain.json")).load();
        assert_eq!(stored, ledger.chain());
    }

    #[test]
    fn reopening_never_creates_second_genesis() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = open_in(dir.path()).chain().to_vec();

        let reopened = open_in(dir.path());
        assert_eq!(reopened.chain(), first.as_slice());

        let mut ledger = reopened;
        ledger.mine_block().unwrap();
        let before = ledger.chain().to_vec();
        drop(ledger);

        let again = open_in(dir.path());
        assert_eq!(again.len(), 2);
        assert_eq!(again.chain(), before.as_slice());
        assert!(again.is_valid_chain());
    }

    #[test]
    fn corrupt_file_is_replaced_by_fresh_genesis() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("blockchain.json"), "[{\"index\": ").unwrap();

        let ledger = open_in(dir.path());
        assert_eq!(ledger.len(), 1);
        assert!(ledger.is_valid_chain());
    }

    #[test]
    fn chain_file_with_exponent_amounts_validates() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("blockchain.json"), LEGACY_CHAIN).unwrap();

        let mut ledger = open_in(dir.path());
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.chain()[1].transactions[0].amount, 0.00001);
        assert_eq!(ledger.chain()[1].transactions[1].amount, 1e16);
        assert_eq!(ledger.chain()[2].transactions[0].amount, 1e-07);
        assert!(ledger.is_valid_chain());
        assert_eq!(ledger.add_transaction("erin", "frank", 1.0), 4);
    }

    #[test]
    fn add_transaction_targets_next_block() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ledger = open_in(dir.path());

        assert_eq!(ledger.add_transaction("alice", "bob", 1.0), 2);
        assert_eq!(ledger.add_transaction("bob", "carol", 2.0), 2);
        assert_eq!(ledger.pending().len(), 2);
        // Queued transactions are not persisted until mined.
        assert_eq!(ledger.chain().len(), 1);
    }

    #[test]
    fn mining_drains_pending_buffer_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ledger = open_in(dir.path());

        ledger.add_transaction("alice", "bob", 1.0);
        ledger.add_transaction("bob", "carol", 2.0);
        ledger.add_transaction("carol", "dave", 3.0);

        let genesis_hash = ledger.last_block().digest();
        let block = ledger.mine_block().unwrap().clone();
        assert_eq!(block.index, 2);
        assert_eq!(block.proof, 632238);
        assert_eq!(block.previous_hash, genesis_hash);
        let senders: Vec<_> = block.transactions.iter().map(|t| t.sender.as_str()).collect();
        assert_eq!(senders, ["alice", "bob", "carol"]);
        assert!(ledger.pending().is_empty());

        assert_eq!(ledger.add_transaction("dave", "erin", 4.0), 3);
        assert_eq!(ledger.pending().len(), 1);
        assert_eq!(ledger.pending()[0].sender, "dave");

        let stored = ChainStore::new(dir.path().join("blockchain.json")).load();
        assert_eq!(stored.last(), Some(&block));
    }

    #[test]
    fn mined_chain_is_valid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ledger = open_in(dir.path());

        for i in 0..3 {
            ledger.add_transaction("miner", "pool", i as f64);
            ledger.mine_block().unwrap();
        }
        assert_eq!(ledger.len(), 4);
        assert!(ledger.is_valid_chain());
    }

    #[test]
    fn tampering_invalidates_chain() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ledger = open_in(dir.path());
        ledger.add_transaction("alice", "bob", 1.0);
        ledger.mine_block().unwrap();
        ledger.mine_block().unwrap();
        let chain = ledger.chain().to_vec();
        assert!(Ledger::is_valid(&chain));

        let mut forged = chain.clone();
        forged[2].proof += 1;
        assert!(!Ledger::is_valid(&forged));

        let mut forged = chain.clone();
        forged[1].previous_hash = "0".repeat(64);
        assert!(!Ledger::is_valid(&forged));

        // Editing a sealed transaction breaks the next block's link.
        let mut forged = chain.clone();
        forged[1].transactions[0].amount = 100.0;
        assert!(!Ledger::is_valid(&forged));
    }

    #[test]
    fn genesis_only_is_valid_and_empty_is_not() {
        assert!(Ledger::is_valid(&[Block::genesis()]));
        assert!(!Ledger::is_valid(&[]));
    }

    #[test]
    fn seal_rejects_stale_target() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ledger = open_in(dir.path());

        let target = ledger.mining_target().unwrap();
        let proof = crate::blockchain::pow::solve(target.previous_proof);
        ledger.mine_block().unwrap();

        match ledger.seal_block(&target, proof) {
            Err(LedgerError::StaleTarget) => {}
            other => panic!("expected stale target, got {other:?}"),
        }
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn seal_rejects_bad_proof_and_keeps_pending() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ledger = open_in(dir.path());
        ledger.add_transaction("alice", "bob", 1.0);

        let target = ledger.mining_target().unwrap();
        assert_eq!(
            target,
            MiningTarget {
                index: 2,
                previous_proof: 1,
                previous_hash: ledger.last_block().digest(),
            }
        );

        let err = ledger.seal_block(&target, 2).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidProof { proof: 2, previous_proof: 1 }));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.pending().len(), 1);
    }

    #[test]
    fn failed_save_rolls_back_block() {
        let dir = tempfile::tempdir().expect("tempdir");
        let chain_dir = dir.path().join("data");
        fs::create_dir(&chain_dir).unwrap();
        let mut ledger = open_in(&chain_dir);
        ledger.add_transaction("alice", "bob", 1.0);

        fs::remove_dir_all(&chain_dir).unwrap();
        assert!(ledger.mine_block().is_err());
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.pending().len(), 1);
        assert_eq!(ledger.pending()[0].receiver, "bob");
    }

    #[test]
    fn open_fails_when_genesis_cannot_be_persisted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope").join("blockchain.json");
        assert!(Ledger::open(ChainStore::new(missing)).is_err());
    }
}
