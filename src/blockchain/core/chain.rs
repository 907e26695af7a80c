use crate::mempool::Mempool;
use crate::transaction::types::update_str;
use crate::transaction::Transfer;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of a block.
pub type BlockHash = String;

/// Proof carried by the genesis block instead of a solved one.
pub const GENESIS_PROOF: u64 = 100;
/// `previous_hash` sentinel of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// Field order here is also the order used on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub transfers: Vec<Transfer>,
    pub proof: u64,
    pub previous_hash: BlockHash,
}

impl Block {
    pub fn new(index: u64, transfers: Vec<Transfer>, proof: u64, previous_hash: BlockHash) -> Self {
        let timestamp = chrono::Utc::now().timestamp_millis() as u64;

        Block {
            index,
            timestamp,
            transfers,
            proof,
            previous_hash,
        }
    }

    /// Canonical digest of every field, as lowercase hex.
    pub fn hash(&self) -> BlockHash {
        let mut hasher = Sha256::new();
        hasher.update(self.index.to_le_bytes());
        hasher.update(self.timestamp.to_le_bytes());
        hasher.update((self.transfers.len() as u64).to_le_bytes());
        for tx in &self.transfers {
            tx.hash_into(&mut hasher);
        }
        hasher.update(self.proof.to_le_bytes());
        update_str(&mut hasher, &self.previous_hash);
        hex::encode(hasher.finalize())
    }
}

/// The local ledger: the block sequence plus the pool of pending transfers.
#[derive(Debug, Clone)]
pub struct Blockchain {
    blocks: Vec<Block>,
    mempool: Mempool,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    /// Create a ledger holding only the genesis block.
    pub fn new() -> Self {
        let mut blockchain = Blockchain {
            blocks: Vec::new(),
            mempool: Mempool::new(),
        };
        blockchain.create_block(GENESIS_PROOF, Some(GENESIS_PREVIOUS_HASH.to_string()));
        blockchain
    }

    /// Seal the mempool into a new block and append it.
    ///
    /// The proof is trusted; callers check it with [`crate::miner::valid_proof`]
    /// or obtain it from [`crate::miner::proof_of_work`]. Without an explicit
    /// `previous_hash` the hash of the current last block is used.
    pub fn create_block(&mut self, proof: u64, previous_hash: Option<BlockHash>) -> Block {
        let previous_hash = previous_hash
            .or_else(|| self.blocks.last().map(Block::hash))
            .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_string());

        let block = Block::new(
            self.blocks.len() as u64 + 1,
            self.mempool.drain(),
            proof,
            previous_hash,
        );

        self.blocks.push(block.clone());
        block
    }

    /// Queue a transfer and return the index of the block it will land in.
    pub fn queue_transfer(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
    ) -> u64 {
        self.mempool.add_transaction(Transfer::new(sender, recipient, amount));
        self.last_block().index + 1
    }

    pub fn last_block(&self) -> &Block {
        // Construction always appends genesis and replacement never installs
        // an empty chain.
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn mempool(&self) -> &Mempool {
        &self.mempool
    }

    /// Swap in a whole new block sequence. Pending transfers are kept.
    ///
    /// Only consensus calls this, after the candidate passed validation.
    pub(crate) fn replace_chain(&mut self, blocks: Vec<Block>) {
        debug_assert!(!blocks.is_empty());
        self.blocks = blocks;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::proof_of_work;

    #[test]
    fn test_genesis_block() {
        let chain = Blockchain::new();
        assert_eq!(chain.len(), 1);

        let genesis = chain.last_block();
        assert_eq!(genesis.index, 1);
        assert_eq!(genesis.proof, GENESIS_PROOF);
        assert_eq!(genesis.previous_hash, GENESIS_PREVIOUS_HASH);
        assert!(genesis.transfers.is_empty());
        assert!(chain.mempool().is_empty());
    }

    #[test]
    fn test_hash_is_deterministic() {
        let chain = Blockchain::new();
        let block = chain.last_block().clone();
        assert_eq!(block.hash(), block.hash());
        assert_eq!(block.hash(), block.clone().hash());
        assert_eq!(block.hash().len(), 64);
        assert!(block.hash().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_changes_with_every_field() {
        let base = Block {
            index: 2,
            timestamp: 1_700_000_000_000,
            transfers: vec![Transfer::new("alice", "bob", 10.0)],
            proof: 35_293,
            previous_hash: "ab".repeat(32),
        };
        let original = base.hash();

        let mut changed = base.clone();
        changed.index += 1;
        assert_ne!(changed.hash(), original);

        let mut changed = base.clone();
        changed.timestamp += 1;
        assert_ne!(changed.hash(), original);

        let mut changed = base.clone();
        changed.transfers[0].amount = 11.0;
        assert_ne!(changed.hash(), original);

        let mut changed = base.clone();
        changed.transfers[0].sender = "carol".to_string();
        assert_ne!(changed.hash(), original);

        let mut changed = base.clone();
        changed.transfers[0].recipient = "carol".to_string();
        assert_ne!(changed.hash(), original);

        let mut changed = base.clone();
        changed.transfers.push(Transfer::new("bob", "alice", 1.0));
        assert_ne!(changed.hash(), original);

        let mut changed = base.clone();
        changed.proof += 1;
        assert_ne!(changed.hash(), original);

        let mut changed = base.clone();
        changed.previous_hash = "cd".repeat(32);
        assert_ne!(changed.hash(), original);
    }

    #[test]
    fn test_hash_survives_json_round_trip() {
        let amounts = [12.5, 1.0 / 11.0, 0.1 + 0.2, 2.0 / 11.0, -1.0 / 3.0, 1e-7, 123_456.789];

        let mut chain = Blockchain::new();
        for amount in amounts {
            chain.queue_transfer("alice", "bob", amount);
            let proof = proof_of_work(chain.last_block().proof);
            let block = chain.create_block(proof, None);

            let json = serde_json::to_string(&block).unwrap();
            let decoded: Block = serde_json::from_str(&json).unwrap();
            assert_eq!(decoded.transfers[0].amount.to_bits(), amount.to_bits());
            assert_eq!(decoded.hash(), block.hash());
        }

        // the whole chain still validates on the receiving side
        let json = serde_json::to_string(chain.blocks()).unwrap();
        let decoded: Vec<Block> = serde_json::from_str(&json).unwrap();
        assert!(crate::blockchain::is_valid_chain(chain.blocks()));
        assert!(crate::blockchain::is_valid_chain(&decoded));
    }

    #[test]
    fn test_queue_transfer_returns_next_index() {
        let mut chain = Blockchain::new();
        assert_eq!(chain.queue_transfer("alice", "bob", 10.0), 2);
        assert_eq!(chain.queue_transfer("bob", "carol", 5.0), 2);
        assert_eq!(chain.mempool().len(), 2);

        chain.create_block(proof_of_work(GENESIS_PROOF), None);
        assert_eq!(chain.queue_transfer("carol", "dave", 1.0), 3);
    }

    #[test]
    fn test_create_block_drains_mempool() {
        let mut chain = Blockchain::new();
        chain.queue_transfer("alice", "bob", 10.0);
        chain.queue_transfer("alice", "bob", 10.0);
        let pending = chain.mempool().get_all_transactions().to_vec();

        let genesis_hash = chain.last_block().hash();
        let block = chain.create_block(proof_of_work(GENESIS_PROOF), None);

        assert!(chain.mempool().is_empty());
        assert_eq!(block.transfers, pending);
        assert_eq!(block.index, 2);
        assert_eq!(block.previous_hash, genesis_hash);
        assert_eq!(chain.last_block(), &block);
    }

    #[test]
    fn test_create_block_trusts_explicit_previous_hash() {
        let mut chain = Blockchain::new();
        let block = chain.create_block(7, Some("deadbeef".to_string()));
        assert_eq!(block.previous_hash, "deadbeef");
        assert_eq!(block.proof, 7);
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_replace_chain_keeps_mempool() {
        let mut chain = Blockchain::new();
        let mut other = Blockchain::new();
        other.create_block(proof_of_work(GENESIS_PROOF), None);

        chain.queue_transfer("alice", "bob", 1.0);
        chain.replace_chain(other.blocks().to_vec());

        assert_eq!(chain.len(), 2);
        assert_eq!(chain.mempool().len(), 1);
        assert_eq!(chain.queue_transfer("bob", "alice", 1.0), 3);
    }
}
