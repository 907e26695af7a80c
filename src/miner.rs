//! Proof-of-work puzzle
//!
//! A proof is valid for the previous block's proof when
//! `sha256("{proof}{last_proof}")` rendered as hex starts with
//! [`DIFFICULTY_PREFIX`]. Difficulty is fixed.

use sha2::{Digest, Sha256};

/// Leading hex digits every valid puzzle digest must carry.
pub const DIFFICULTY_PREFIX: &str = "0000";

/// Check whether `proof` solves the puzzle posed by `last_proof`.
pub fn valid_proof(last_proof: u64, proof: u64) -> bool {
    let guess = format!("{}{}", proof, last_proof);
    let digest = hex::encode(Sha256::digest(guess.as_bytes()));
    digest.starts_with(DIFFICULTY_PREFIX)
}

/// Brute-force the smallest proof that solves the puzzle for `last_proof`.
///
/// The search is unbounded and has no cancellation; callers running inside an
/// async runtime should move it onto a blocking thread.
pub fn proof_of_work(last_proof: u64) -> u64 {
    let mut proof = 0;
    while !valid_proof(last_proof, proof) {
        proof += 1;
    }
    proof
}
