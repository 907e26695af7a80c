//! Pending transfers waiting for the next mined block

use crate::transaction::Transfer;

#[derive(Debug, Clone, Default)]
pub struct Mempool {
    transactions: Vec<Transfer>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transfer; arrival order is preserved.
    pub fn add_transaction(&mut self, tx: Transfer) {
        self.transactions.push(tx);
    }

    pub fn get_all_transactions(&self) -> &[Transfer] {
        &self.transactions
    }

    /// Take every pending transfer and leave the pool empty.
    pub fn drain(&mut self) -> Vec<Transfer> {
        std::mem::take(&mut self.transactions)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_pool_in_order() {
        let mut pool = Mempool::new();
        pool.add_transaction(Transfer::new("a", "b", 1.0));
        pool.add_transaction(Transfer::new("c", "d", 2.0));
        assert_eq!(pool.len(), 2);

        let drained = pool.drain();
        assert_eq!(drained[0].sender, "a");
        assert_eq!(drained[1].sender, "c");
        assert!(pool.is_empty());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut pool = Mempool::new();
        let tx = Transfer::new("a", "b", 1.0);
        pool.add_transaction(tx.clone());
        pool.add_transaction(tx);
        assert_eq!(pool.len(), 2);
    }
}
