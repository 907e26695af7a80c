//! ProofChain - a minimal proof-of-work ledger node
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, block hashing, the ledger and chain validation
//! - [`transaction`] - Transfer type
//! - [`mempool`] - Pending transfers
//!
//! ## Consensus & Mining
//! - [`miner`] - Proof-of-work puzzle and solver
//! - [`consensus`] - Longest-valid-chain conflict resolution
//!
//! ## Networking & Integration
//! - [`network`] - Peer set and HTTP chain fetching
//! - [`api`] - REST API
//! - [`node`] - Process-level orchestration
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod mempool;
pub mod transaction;

// ============================================================================
// Consensus & Mining
// ============================================================================
pub mod consensus;
pub mod miner;

// ============================================================================
// Networking & Integration
// ============================================================================
pub mod api;
pub mod network;
pub mod node;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
