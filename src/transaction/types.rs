/// Transfer types for ProofChain
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Sender used for the mining payout; no real account ever has this identifier.
pub const REWARD_SENDER: &str = "0";

/// A value transfer between two identifiers.
///
/// Nothing about a transfer is validated: duplicates, self-transfers and
/// negative amounts are all accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
}

impl Transfer {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
        Transfer {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }

    /// Whether this is a mining payout rather than a user transfer.
    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER
    }

    /// Feed this transfer into a block digest in canonical field order.
    pub(crate) fn hash_into(&self, hasher: &mut Sha256) {
        update_str(hasher, &self.sender);
        update_str(hasher, &self.recipient);
        hasher.update(self.amount.to_le_bytes());
    }
}

/// Length-prefix strings so adjacent fields can never run into each other.
pub(crate) fn update_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}
