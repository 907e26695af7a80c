#![forbid(unsafe_code)]
//! ProofChain node: serves the ledger API and takes part in consensus

use clap::Parser;
use proofchain::config::{load_config, DEFAULT_CONFIG_PATH};
use proofchain::node::Node;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "proofchain-node", version, about = "Run a ProofChain ledger node")]
struct Cli {
    /// Port for the HTTP API (overrides network.api_port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to the TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Peer to register at startup; may be repeated
    #[arg(long = "peer")]
    peers: Vec<String>,

    /// Identifier credited with mining rewards (overrides miner.node_id)
    #[arg(long)]
    node_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;

    if let Some(port) = cli.port {
        config.network.api_port = port;
    }
    if cli.node_id.is_some() {
        config.miner.node_id = cli.node_id;
    }
    config.network.bootstrap_peers.extend(cli.peers);

    let node = Arc::new(Node::init(config)?);
    node.start().await?;

    Ok(())
}
