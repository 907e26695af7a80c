use crate::blockchain::Blockchain;
use crate::config::Config;
use crate::error::{ChainError, Result};
use crate::network::{HttpChainSource, PeerSet};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeState {
    Booting,
    Ready,
    Degraded,
}

/// Process-level owner of the ledger: built once at startup and kept alive
/// until the process exits.
pub struct Node {
    pub config: Config,
    pub node_id: String,
    pub blockchain: Arc<RwLock<Blockchain>>,
    pub peers: Arc<RwLock<PeerSet>>,
    pub state: Arc<RwLock<NodeState>>,
    chain_source: HttpChainSource,
}

/// Random identifier credited with this node's mining rewards.
pub fn generate_node_id() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

impl Node {
    pub fn init(config: Config) -> Result<Self> {
        config.validate()?;

        let node_id = config
            .miner
            .node_id
            .clone()
            .unwrap_or_else(generate_node_id);
        info!(node_id = %node_id, "starting ProofChain node");

        let blockchain = Arc::new(RwLock::new(Blockchain::new()));

        let mut peer_set = PeerSet::new();
        for peer in &config.network.bootstrap_peers {
            if let Err(e) = peer_set.register(peer) {
                warn!("Ignoring bootstrap peer {}: {}", peer, e);
            }
        }
        let peers = Arc::new(RwLock::new(peer_set));

        let chain_source = HttpChainSource::new(config.network.peer_timeout())?;
        let state = Arc::new(RwLock::new(NodeState::Booting));

        Ok(Self {
            config,
            node_id,
            blockchain,
            peers,
            state,
            chain_source,
        })
    }

    /// Address the API server binds to.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.config.network.bind_address.parse().map_err(|e| {
            ChainError::ConfigError(format!(
                "invalid bind address {}: {}",
                self.config.network.bind_address, e
            ))
        })?;
        Ok(SocketAddr::new(ip, self.config.network.api_port))
    }

    /// API handle sharing this node's ledger, peers and state.
    pub fn api_node(&self) -> crate::api::Node {
        crate::api::Node::new_shared(
            self.blockchain.clone(),
            self.peers.clone(),
            self.node_id.clone(),
            self.config.miner.reward,
            self.chain_source.clone(),
            Some(self.state.clone()),
        )
    }

    /// Serve the API until the listener fails.
    pub async fn start(self: Arc<Self>) -> Result<()> {
        let addr = self.bind_addr()?;
        let api_node = Arc::new(self.api_node());

        // Catch up with bootstrap peers before announcing readiness.
        if !self.peers.read().await.is_empty() {
            let replaced = api_node.resolve().await;
            info!(replaced, "initial conflict resolution finished");
        }

        *self.state.write().await = NodeState::Ready;
        info!(
            "Node ready: chain length = {}, peers = {}",
            self.blockchain.read().await.len(),
            self.peers.read().await.len()
        );

        let result = crate::api::run_api_server(api_node, addr).await;
        if let Err(e) = &result {
            error!("API server failed: {}", e);
            *self.state.write().await = NodeState::Degraded;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_hex() {
        let a = generate_node_id();
        let b = generate_node_id();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_init_registers_bootstrap_peers() {
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            let mut config = Config::default();
            config.network.bootstrap_peers = vec![
                "http://127.0.0.1:5001".to_string(),
                "127.0.0.1:5001".to_string(),
                "http://".to_string(),
            ];
            config.miner.node_id = Some("miner-1".to_string());

            let node = Node::init(config).unwrap();
            assert_eq!(node.node_id, "miner-1");
            assert_eq!(node.peers.read().await.to_vec(), vec!["127.0.0.1:5001"]);
            assert_eq!(*node.state.read().await, NodeState::Booting);
            assert_eq!(node.blockchain.read().await.len(), 1);
        })
        .await
        .expect("test_init_registers_bootstrap_peers timed out");
    }

    #[test]
    fn test_bind_addr_uses_config() {
        let mut config = Config::default();
        config.network.bind_address = "127.0.0.1".to_string();
        config.network.api_port = 5005;
        let node = Node::init(config).unwrap();
        assert_eq!(node.bind_addr().unwrap(), "127.0.0.1:5005".parse::<SocketAddr>().unwrap());

        let mut config = Config::default();
        config.network.bind_address = "not-an-ip".to_string();
        let node = Node::init(config).unwrap();
        assert!(matches!(node.bind_addr(), Err(ChainError::ConfigError(_))));
    }
}
