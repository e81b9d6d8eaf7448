use std::collections::HashMap;
use std::sync::Arc;

use super::LockTable;
use crate::common::{BlockId, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockType {
    Shared,
    Exclusive,
}

/// The locks held by one transaction.
///
/// Locks are only released all together, at commit or rollback.
pub struct ConcurrencyManager {
    lock_table: Arc<LockTable>,
    locks: HashMap<BlockId, LockType>,
}

impl ConcurrencyManager {
    pub fn new(lock_table: Arc<LockTable>) -> Self {
        Self {
            lock_table,
            locks: HashMap::new(),
        }
    }

    pub fn slock(&mut self, block: &BlockId) -> Result<()> {
        if !self.locks.contains_key(block) {
            self.lock_table.slock(block)?;
            self.locks.insert(block.clone(), LockType::Shared);
        }
        Ok(())
    }

    pub fn xlock(&mut self, block: &BlockId) -> Result<()> {
        if self.lock_type(block) != Some(LockType::Exclusive) {
            self.slock(block)?;
            self.lock_table.xlock(block)?;
            self.locks.insert(block.clone(), LockType::Exclusive);
        }
        Ok(())
    }

    pub fn release(&mut self) {
        for block in self.locks.keys() {
            self.lock_table.unlock(block);
        }
        self.locks.clear();
    }

    pub fn lock_type(&self, block: &BlockId) -> Option<LockType> {
        self.locks.get(block).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::DbError;
    use std::time::Duration;

    #[test]
    fn test_repeated_requests_take_one_lock() {
        let table = Arc::new(LockTable::new(Duration::from_millis(50)));
        let block = BlockId::new("f", 0);
        let mut cm = ConcurrencyManager::new(Arc::clone(&table));
        cm.slock(&block).unwrap();
        cm.slock(&block).unwrap();
        cm.xlock(&block).unwrap();
        cm.xlock(&block).unwrap();
        assert_eq!(cm.lock_type(&block), Some(LockType::Exclusive));

        let mut other = ConcurrencyManager::new(Arc::clone(&table));
        assert!(matches!(other.slock(&block), Err(DbError::LockAbort(_))));

        cm.release();
        assert_eq!(cm.lock_type(&block), None);
        other.xlock(&block).unwrap();
    }
}
