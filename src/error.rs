//! Error types for ProofChain

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ChainError {
    InvalidBlockLinkage(String),
    InvalidProofOfWork(String),
    InvalidChain(String),
    InvalidPeerAddress(String),
    NetworkError(String),
    ConfigError(String),
    IoError(String),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChainError::InvalidBlockLinkage(msg) => write!(f, "Invalid block linkage: {}", msg),
            ChainError::InvalidProofOfWork(msg) => write!(f, "Invalid proof of work: {}", msg),
            ChainError::InvalidChain(msg) => write!(f, "Invalid chain: {}", msg),
            ChainError::InvalidPeerAddress(msg) => write!(f, "Invalid peer address: {}", msg),
            ChainError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            ChainError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            ChainError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for ChainError {}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

impl From<reqwest::Error> for ChainError {
    fn from(err: reqwest::Error) -> Self {
        ChainError::NetworkError(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::ConfigError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
