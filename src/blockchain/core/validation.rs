use crate::error::ChainError;
use crate::miner::valid_proof;

use super::chain::Block;

/// Check hash linkage and proof-of-work continuity of a candidate chain.
///
/// The genesis block is taken as given; every later block must point at the
/// hash of its predecessor and carry a proof that solves the predecessor's
/// puzzle. The first failure is reported.
pub fn validate_chain(chain: &[Block]) -> Result<(), ChainError> {
    let mut last_block = chain
        .first()
        .ok_or_else(|| ChainError::InvalidChain("chain has no genesis block".to_string()))?;

    for block in &chain[1..] {
        let expected = last_block.hash();
        if block.previous_hash != expected {
            return Err(ChainError::InvalidBlockLinkage(format!(
                "block {} points at {}, expected {}",
                block.index, block.previous_hash, expected
            )));
        }

        if !valid_proof(last_block.proof, block.proof) {
            return Err(ChainError::InvalidProofOfWork(format!(
                "block {} proof {} does not solve previous proof {}",
                block.index, block.proof, last_block.proof
            )));
        }

        last_block = block;
    }

    Ok(())
}

pub fn is_valid_chain(chain: &[Block]) -> bool {
    match validate_chain(chain) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("rejected candidate chain: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Blockchain;
    use crate::miner::proof_of_work;

    fn mined_chain(extra_blocks: usize) -> Vec<Block> {
        let mut chain = Blockchain::new();
        for i in 0..extra_blocks {
            chain.queue_transfer("alice", "bob", i as f64);
            let proof = proof_of_work(chain.last_block().proof);
            chain.create_block(proof, None);
        }
        chain.blocks().to_vec()
    }

    #[test]
    fn test_genesis_only_chain_is_valid() {
        assert!(is_valid_chain(&mined_chain(0)));
    }

    #[test]
    fn test_empty_chain_is_rejected() {
        assert!(matches!(validate_chain(&[]), Err(ChainError::InvalidChain(_))));
        assert!(!is_valid_chain(&[]));
    }

    #[test]
    fn test_mined_chain_is_valid() {
        let chain = mined_chain(3);
        assert_eq!(chain.len(), 4);
        assert!(validate_chain(&chain).is_ok());
    }

    #[test]
    fn test_tampered_previous_hash_is_rejected() {
        let mut chain = mined_chain(2);
        chain[2].previous_hash = "0".repeat(64);
        assert!(matches!(
            validate_chain(&chain),
            Err(ChainError::InvalidBlockLinkage(_))
        ));
    }

    #[test]
    fn test_tampered_proof_is_rejected() {
        let mut chain = mined_chain(2);
        let last = chain.len() - 1;
        chain[last].proof += 1;
        assert!(!is_valid_chain(&chain));
    }

    #[test]
    fn test_tampered_proof_mid_chain_breaks_linkage() {
        let mut chain = mined_chain(2);
        chain[1].proof += 1;
        // block 2's digest changes, so block 3 no longer links to it
        assert!(matches!(
            validate_chain(&chain),
            Err(ChainError::InvalidBlockLinkage(_)) | Err(ChainError::InvalidProofOfWork(_))
        ));
    }

    #[test]
    fn test_tampered_transfer_is_rejected() {
        let mut chain = mined_chain(2);
        chain[1].transfers[0].amount = 1_000_000.0;
        assert!(!is_valid_chain(&chain));
    }

    #[test]
    fn test_validation_does_not_mutate() {
        let chain = mined_chain(1);
        let before = chain.clone();
        is_valid_chain(&chain);
        assert_eq!(chain, before);
    }
}
