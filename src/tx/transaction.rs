use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::recovery::RecoveryManager;
use super::{BufferList, ConcurrencyManager, LockTable};
use crate::buffer::{BufferPoolManager, Frame};
use crate::common::{BlockId, DbError, Result, TxNum};
use crate::log::LogManager;
use crate::storage::disk::FileManager;

/// A unit of work with strict two-phase locking and undo logging.
///
/// Reads take a shared lock on the block, writes an exclusive one, and all
/// locks are held until `commit` or `rollback`. Blocks must be pinned with
/// `pin` before they are read or written. Once committed or rolled back the
/// transaction rejects further work with `DbError::TransactionClosed`.
///
/// A transaction is meant to be driven by one thread at a time; it is
/// shared as `Arc<Transaction>` between the scans working on its behalf.
/// Dropping an open transaction rolls it back.
pub struct Transaction {
    txnum: TxNum,
    file_manager: Arc<FileManager>,
    buffer_pool: Arc<BufferPoolManager>,
    recovery: RecoveryManager,
    concurrency: Mutex<ConcurrencyManager>,
    buffers: Mutex<BufferList>,
    closed: AtomicBool,
}

impl Transaction {
    pub fn new(
        txnum: TxNum,
        file_manager: Arc<FileManager>,
        log_manager: Arc<LogManager>,
        buffer_pool: Arc<BufferPoolManager>,
        lock_table: Arc<LockTable>,
    ) -> Result<Self> {
        let recovery = RecoveryManager::new(txnum, log_manager, Arc::clone(&buffer_pool))?;
        debug!(txnum, "transaction started");
        Ok(Self {
            txnum,
            file_manager,
            buffers: Mutex::new(BufferList::new(Arc::clone(&buffer_pool))),
            buffer_pool,
            recovery,
            concurrency: Mutex::new(ConcurrencyManager::new(lock_table)),
            closed: AtomicBool::new(false),
        })
    }

    pub fn txnum(&self) -> TxNum {
        self.txnum
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Flushes the transaction's changes, writes COMMIT and releases
    /// everything the transaction holds.
    pub fn commit(&self) -> Result<()> {
        self.ensure_open()?;
        self.recovery.commit()?;
        self.finish();
        debug!(txnum = self.txnum, "transaction committed");
        Ok(())
    }

    /// Restores every value the transaction changed, writes ROLLBACK and
    /// releases everything the transaction holds.
    pub fn rollback(&self) -> Result<()> {
        self.ensure_open()?;
        let result = self.recovery.rollback(self);
        self.finish();
        debug!(txnum = self.txnum, ok = result.is_ok(), "transaction rolled back");
        result
    }

    /// Undoes all unfinished transactions found in the log. Run once at
    /// startup, before any other transaction exists.
    pub fn recover(&self) -> Result<()> {
        self.ensure_open()?;
        self.buffer_pool.flush_all(self.txnum)?;
        self.recovery.recover(self)
    }

    pub fn pin(&self, block: &BlockId) -> Result<()> {
        self.ensure_open()?;
        self.buffers.lock().pin(block)
    }

    /// Releases one pin on `block`. A no-op once the transaction is closed.
    pub fn unpin(&self, block: &BlockId) {
        self.buffers.lock().unpin(block);
    }

    pub fn get_int(&self, block: &BlockId, offset: usize) -> Result<i32> {
        self.ensure_open()?;
        self.concurrency.lock().slock(block)?;
        let frame = self.pinned_frame(block)?;
        // bound so the page guard is dropped before `frame`
        let value = frame.read_page().get_int(offset);
        value
    }

    pub fn get_string(&self, block: &BlockId, offset: usize) -> Result<String> {
        self.ensure_open()?;
        self.concurrency.lock().slock(block)?;
        let frame = self.pinned_frame(block)?;
        // bound so the page guard is dropped before `frame`
        let value = frame.read_page().get_string(offset);
        value
    }

    /// Writes `value` at `offset` of `block`. With `ok_to_log` the old value
    /// is logged first; without it the write is not undoable.
    pub fn set_int(&self, block: &BlockId, offset: usize, value: i32, ok_to_log: bool) -> Result<()> {
        self.ensure_open()?;
        self.concurrency.lock().xlock(block)?;
        let frame = self.pinned_frame(block)?;
        if ok_to_log {
            self.recovery.set_int(&frame, offset, value)
        } else {
            frame.write_page().set_int(offset, value)?;
            frame.set_modified(self.txnum, -1);
            Ok(())
        }
    }

    pub fn set_string(
        &self,
        block: &BlockId,
        offset: usize,
        value: &str,
        ok_to_log: bool,
    ) -> Result<()> {
        self.ensure_open()?;
        self.concurrency.lock().xlock(block)?;
        let frame = self.pinned_frame(block)?;
        if ok_to_log {
            self.recovery.set_string(&frame, offset, value)
        } else {
            frame.write_page().set_string(offset, value)?;
            frame.set_modified(self.txnum, -1);
            Ok(())
        }
    }

    /// Number of blocks in `file_name`.
    pub fn size(&self, file_name: &str) -> Result<i32> {
        self.ensure_open()?;
        self.concurrency
            .lock()
            .slock(&BlockId::end_of_file(file_name))?;
        self.file_manager.block_length(file_name)
    }

    /// Appends a zeroed block to `file_name`.
    pub fn append(&self, file_name: &str) -> Result<BlockId> {
        self.ensure_open()?;
        self.concurrency
            .lock()
            .xlock(&BlockId::end_of_file(file_name))?;
        self.file_manager.extend_file(file_name)
    }

    pub fn block_size(&self) -> usize {
        self.file_manager.block_size()
    }

    pub fn available_buffers(&self) -> usize {
        self.buffer_pool.available()
    }

    fn pinned_frame(&self, block: &BlockId) -> Result<Arc<Frame>> {
        self.buffers
            .lock()
            .get(block)
            .cloned()
            .ok_or_else(|| DbError::BlockNotPinned(block.clone()))
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(DbError::TransactionClosed(self.txnum));
        }
        Ok(())
    }

    fn finish(&self) {
        self.concurrency.lock().release();
        self.buffers.lock().unpin_all();
        self.closed.store(true, Ordering::Release);
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.is_closed() {
            if let Err(e) = self.rollback() {
                warn!(txnum = self.txnum, error = %e, "rollback of dropped transaction failed");
            }
        }
    }
}
