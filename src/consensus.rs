//! Longest-valid-chain conflict resolution
//!
//! Every registered peer is asked for its chain. A peer chain replaces the
//! local one only when it is strictly longer than anything seen so far and
//! passes [`is_valid_chain`]. Peers that cannot be reached, answer with
//! garbage, or offer an invalid chain are skipped; resolution itself never
//! fails.

use crate::blockchain::{is_valid_chain, Block, Blockchain};
use crate::error::Result;
use crate::network::{ChainResponse, PeerSet};
use std::future::Future;

/// Transport used to read a peer's chain.
pub trait ChainSource {
    fn fetch_chain(&self, peer: &str) -> impl Future<Output = Result<ChainResponse>> + Send;
}

/// Consensus engine for selecting the canonical chain
pub struct Consensus;

impl Consensus {
    /// Fetch every peer's chain in peer-set order, dropping failed fetches and
    /// answers whose reported length disagrees with the blocks sent.
    pub async fn collect_candidates<S: ChainSource>(
        peers: &PeerSet,
        source: &S,
    ) -> Vec<ChainResponse> {
        let mut candidates = Vec::with_capacity(peers.len());

        for peer in peers.iter() {
            match source.fetch_chain(peer).await {
                Ok(response) if response.length != response.chain.len() => {
                    tracing::warn!(
                        peer = %peer,
                        reported = response.length,
                        actual = response.chain.len(),
                        "skipping peer: reported length does not match chain"
                    );
                }
                Ok(response) => candidates.push(response),
                Err(e) => {
                    tracing::warn!(peer = %peer, error = %e, "skipping unreachable peer");
                }
            }
        }

        candidates
    }

    /// Pick the longest valid candidate that beats `local_len`.
    ///
    /// Comparison is strictly greater, so among equally long winners the
    /// earliest candidate is kept.
    pub fn select_longest<I>(local_len: usize, candidates: I) -> Option<Vec<Block>>
    where
        I: IntoIterator<Item = ChainResponse>,
    {
        let mut best_length = local_len;
        let mut best_chain = None;

        for candidate in candidates {
            if candidate.length > best_length && is_valid_chain(&candidate.chain) {
                best_length = candidate.length;
                best_chain = Some(candidate.chain);
            }
        }

        best_chain
    }

    /// Replace the local chain with the best candidate, if any beats it.
    pub fn adopt_longest<I>(blockchain: &mut Blockchain, candidates: I) -> bool
    where
        I: IntoIterator<Item = ChainResponse>,
    {
        match Self::select_longest(blockchain.len(), candidates) {
            Some(chain) => {
                tracing::info!(
                    old_length = blockchain.len(),
                    new_length = chain.len(),
                    "replacing local chain with longer peer chain"
                );
                blockchain.replace_chain(chain);
                true
            }
            None => false,
        }
    }

    /// Poll all peers and adopt the longest valid chain.
    ///
    /// Holds `blockchain` for the whole network round; callers sharing the
    /// ledger behind a lock should use [`Self::collect_candidates`] and
    /// [`Self::adopt_longest`] separately.
    pub async fn resolve<S: ChainSource>(
        blockchain: &mut Blockchain,
        peers: &PeerSet,
        source: &S,
    ) -> bool {
        let candidates = Self::collect_candidates(peers, source).await;
        Self::adopt_longest(blockchain, candidates)
    }
}
