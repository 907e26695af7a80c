//! Peer bookkeeping and the HTTP transport used to read peer chains
//!
//! Peers are plain `host:port` strings. The set never owns or tracks a peer's
//! lifecycle; registering an address only means "ask it for its chain when
//! resolving conflicts".

use crate::blockchain::Block;
use crate::consensus::ChainSource;
use crate::error::{ChainError, Result};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Body of a chain read, served by `GET /chain` and consumed from peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainResponse {
    pub chain: Vec<Block>,
    pub length: usize,
}

impl ChainResponse {
    pub fn new(chain: Vec<Block>) -> Self {
        let length = chain.len();
        Self { chain, length }
    }
}

/// Reduce a peer URL to `host:port`, dropping scheme, credentials and path.
///
/// Bare `host:port` input is accepted as-is. When no port is given the
/// scheme's default port is used.
pub fn normalize_peer_address(address: &str) -> Result<String> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(ChainError::InvalidPeerAddress("empty address".to_string()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| ChainError::InvalidPeerAddress(format!("{}: {}", trimmed, e)))?;

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ChainError::InvalidPeerAddress(format!("{}: missing host", trimmed)))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| ChainError::InvalidPeerAddress(format!("{}: missing port", trimmed)))?;

    Ok(format!("{}:{}", host, port))
}

/// Deduplicated peer addresses, iterated in sorted order.
#[derive(Debug, Clone, Default)]
pub struct PeerSet {
    peers: BTreeSet<String>,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize and insert; returns `false` when the peer was already known.
    pub fn register(&mut self, address: &str) -> Result<bool> {
        let peer = normalize_peer_address(address)?;
        let added = self.peers.insert(peer.clone());
        if added {
            tracing::info!(peer = %peer, "registered peer");
        }
        Ok(added)
    }

    /// Register every address or none of them.
    pub fn register_all<I, S>(&mut self, addresses: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalized = addresses
            .into_iter()
            .map(|a| normalize_peer_address(a.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let mut added = 0;
        for peer in normalized {
            if self.peers.insert(peer.clone()) {
                tracing::info!(peer = %peer, "registered peer");
                added += 1;
            }
        }
        Ok(added)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.peers.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.peers.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

/// Reads peer chains over HTTP from `http://{peer}/chain`.
#[derive(Debug, Clone)]
pub struct HttpChainSource {
    client: Client,
}

impl HttpChainSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl ChainSource for HttpChainSource {
    async fn fetch_chain(&self, peer: &str) -> Result<ChainResponse> {
        let url = format!("http://{}/chain", peer);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChainError::NetworkError(format!(
                "{} answered with status {}",
                url, status
            )));
        }

        let body = response
            .json::<ChainResponse>()
            .await
            .map_err(|e| ChainError::NetworkError(format!("{} sent a malformed chain: {}", url, e)))?;
        Ok(body)
    }
}
