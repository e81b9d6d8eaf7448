use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::warn;

use crate::common::{BlockId, DbError, Result};

const EXCLUSIVE: i32 = -1;

/// LockTable grants block-level shared and exclusive locks.
///
/// Each entry holds the number of shared holders, or -1 while the block is
/// exclusively locked. A request that cannot be granted waits until the
/// timeout and then fails with `DbError::LockAbort`; the caller is expected
/// to roll back, which breaks any deadlock it was part of.
pub struct LockTable {
    locks: Mutex<HashMap<BlockId, i32>>,
    /// Signalled on every unlock
    released: Condvar,
    timeout: Duration,
}

impl LockTable {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            released: Condvar::new(),
            timeout,
        }
    }

    /// Grants a shared lock once no exclusive lock is held on `block`.
    pub fn slock(&self, block: &BlockId) -> Result<()> {
        let deadline = Instant::now() + self.timeout;
        let mut locks = self.locks.lock();
        while Self::lock_value(&locks, block) == EXCLUSIVE {
            if self.released.wait_until(&mut locks, deadline).timed_out()
                && Self::lock_value(&locks, block) == EXCLUSIVE
            {
                warn!(%block, "shared lock request timed out");
                return Err(DbError::LockAbort(block.clone()));
            }
        }
        *locks.entry(block.clone()).or_insert(0) += 1;
        Ok(())
    }

    /// Upgrades the caller's shared lock on `block` to exclusive once it is
    /// the only holder.
    pub fn xlock(&self, block: &BlockId) -> Result<()> {
        let deadline = Instant::now() + self.timeout;
        let mut locks = self.locks.lock();
        while Self::lock_value(&locks, block) > 1 {
            if self.released.wait_until(&mut locks, deadline).timed_out()
                && Self::lock_value(&locks, block) > 1
            {
                warn!(%block, "exclusive lock request timed out");
                return Err(DbError::LockAbort(block.clone()));
            }
        }
        locks.insert(block.clone(), EXCLUSIVE);
        Ok(())
    }

    /// Releases one lock on `block`.
    pub fn unlock(&self, block: &BlockId) {
        let mut locks = self.locks.lock();
        match locks.get_mut(block) {
            Some(value) if *value > 1 => *value -= 1,
            Some(_) => {
                locks.remove(block);
            }
            None => return,
        }
        self.released.notify_all();
    }

    fn lock_value(locks: &HashMap<BlockId, i32>, block: &BlockId) -> i32 {
        locks.get(block).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_shared_locks_are_compatible() {
        let table = LockTable::new(Duration::from_millis(50));
        let block = BlockId::new("f", 1);
        table.slock(&block).unwrap();
        table.slock(&block).unwrap();
        assert!(matches!(table.xlock(&block), Err(DbError::LockAbort(_))));
        table.unlock(&block);
        table.xlock(&block).unwrap();
    }

    #[test]
    fn test_exclusive_blocks_shared() {
        let table = LockTable::new(Duration::from_millis(50));
        let block = BlockId::new("f", 1);
        table.slock(&block).unwrap();
        table.xlock(&block).unwrap();
        assert!(matches!(table.slock(&block), Err(DbError::LockAbort(_))));
        table.unlock(&block);
        table.slock(&block).unwrap();
    }

    #[test]
    fn test_waiter_is_woken_by_unlock() {
        let table = Arc::new(LockTable::new(Duration::from_secs(5)));
        let block = BlockId::new("f", 1);
        table.slock(&block).unwrap();
        table.xlock(&block).unwrap();

        let waiter = {
            let table = Arc::clone(&table);
            let block = block.clone();
            thread::spawn(move || table.slock(&block))
        };
        thread::sleep(Duration::from_millis(20));
        table.unlock(&block);
        assert!(waiter.join().unwrap().is_ok());
    }
}
