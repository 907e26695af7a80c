//! Configuration management for ProofChain

use crate::error::{ChainError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub miner: MinerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default)]
    pub bootstrap_peers: Vec<String>,
    #[serde(default = "default_peer_timeout")]
    pub peer_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_port: default_api_port(),
            bootstrap_peers: Vec::new(),
            peer_timeout_secs: default_peer_timeout(),
        }
    }
}

impl NetworkConfig {
    pub fn peer_timeout(&self) -> Duration {
        Duration::from_secs(self.peer_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MinerConfig {
    /// Fixed payout granted to this node for every block it mines.
    #[serde(default = "default_reward")]
    pub reward: f64,
    /// Identifier credited with mining rewards; generated when absent.
    #[serde(default)]
    pub node_id: Option<String>,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            reward: default_reward(),
            node_id: None,
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    5000
}

fn default_peer_timeout() -> u64 {
    10
}

fn default_reward() -> f64 {
    50.0
}

/// Load configuration from `path`, falling back to defaults when the file is
/// absent. Present but unparsable files are an error.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let config = if path.exists() {
        let config_str = fs::read_to_string(path)?;
        toml::from_str(&config_str)?
    } else {
        Config::default()
    };

    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate critical values
    pub fn validate(&self) -> Result<()> {
        if self.network.bind_address.trim().is_empty() {
            return Err(ChainError::ConfigError(
                "network.bind_address must not be empty".to_string(),
            ));
        }

        if !self.miner.reward.is_finite() {
            return Err(ChainError::ConfigError(
                "miner.reward must be a finite number".to_string(),
            ));
        }

        if matches!(&self.miner.node_id, Some(id) if id.trim().is_empty()) {
            return Err(ChainError::ConfigError(
                "miner.node_id must not be empty when set".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.network.api_port, 5000);
        assert_eq!(config.network.bind_address, "0.0.0.0");
        assert_eq!(config.network.peer_timeout(), Duration::from_secs(10));
        assert!(config.network.bootstrap_peers.is_empty());
        assert_eq!(config.miner.reward, 50.0);
        assert!(config.miner.node_id.is_none());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[network]\napi_port = 5001\nbootstrap_peers = [\"http://127.0.0.1:5000\"]\n"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.network.api_port, 5001);
        assert_eq!(config.network.bootstrap_peers, vec!["http://127.0.0.1:5000"]);
        assert_eq!(config.network.bind_address, "0.0.0.0");
        assert_eq!(config.miner.reward, 50.0);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[network]\nbind_address = \"\"\n").unwrap();
        assert!(matches!(load_config(file.path()), Err(ChainError::ConfigError(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[miner]\nnode_id = \" \"\n").unwrap();
        assert!(matches!(load_config(file.path()), Err(ChainError::ConfigError(_))));
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[network\napi_port = ").unwrap();
        assert!(matches!(load_config(file.path()), Err(ChainError::ConfigError(_))));
    }
}
