use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use super::LogRecord;
use crate::buffer::{BufferPoolManager, Frame};
use crate::common::{DbError, Result, TxNum};
use crate::log::LogManager;
use crate::tx::Transaction;

/// Undo-only recovery for one transaction.
///
/// Every change is preceded by a log record holding the old value. Commit
/// forces the transaction's pages to disk before its COMMIT record, so a
/// committed transaction never needs redo; recovery only has to undo the
/// changes of transactions that never finished.
pub struct RecoveryManager {
    txnum: TxNum,
    log_manager: Arc<LogManager>,
    buffer_pool: Arc<BufferPoolManager>,
}

impl RecoveryManager {
    /// Writes the START record of `txnum`.
    pub fn new(
        txnum: TxNum,
        log_manager: Arc<LogManager>,
        buffer_pool: Arc<BufferPoolManager>,
    ) -> Result<Self> {
        let lsn = LogRecord::Start(txnum).write_to_log(&log_manager)?;
        log_manager.flush_lsn(lsn)?;
        Ok(Self {
            txnum,
            log_manager,
            buffer_pool,
        })
    }

    pub fn commit(&self) -> Result<()> {
        self.buffer_pool.flush_all(self.txnum)?;
        let lsn = LogRecord::Commit(self.txnum).write_to_log(&self.log_manager)?;
        self.log_manager.flush_lsn(lsn)
    }

    pub fn rollback(&self, tx: &Transaction) -> Result<()> {
        self.undo_own_changes(tx)?;
        self.buffer_pool.flush_all(self.txnum)?;
        let lsn = LogRecord::Rollback(self.txnum).write_to_log(&self.log_manager)?;
        self.log_manager.flush_lsn(lsn)
    }

    /// Undoes every unfinished transaction back to the last checkpoint and
    /// writes a new checkpoint.
    pub fn recover(&self, tx: &Transaction) -> Result<()> {
        self.undo_unfinished(tx)?;
        self.buffer_pool.flush_all(self.txnum)?;
        let lsn = LogRecord::Checkpoint.write_to_log(&self.log_manager)?;
        self.log_manager.flush_lsn(lsn)
    }

    /// Logs the old integer at `offset` and writes `new_value` in its place.
    pub fn set_int(&self, frame: &Frame, offset: usize, new_value: i32) -> Result<()> {
        let block = frame
            .block()
            .ok_or_else(|| DbError::Config("frame holds no block".into()))?;
        let mut page = frame.write_page();
        let old_value = page.get_int(offset)?;
        let lsn = LogRecord::SetInt {
            txnum: self.txnum,
            block,
            offset: offset as i32,
            old_value,
        }
        .write_to_log(&self.log_manager)?;
        page.set_int(offset, new_value)?;
        drop(page);
        frame.set_modified(self.txnum, lsn);
        Ok(())
    }

    /// Logs the old string at `offset` and writes `new_value` in its place.
    pub fn set_string(&self, frame: &Frame, offset: usize, new_value: &str) -> Result<()> {
        let block = frame
            .block()
            .ok_or_else(|| DbError::Config("frame holds no block".into()))?;
        let mut page = frame.write_page();
        let old_value = page.get_string(offset)?;
        let lsn = LogRecord::SetString {
            txnum: self.txnum,
            block,
            offset: offset as i32,
            old_value,
        }
        .write_to_log(&self.log_manager)?;
        page.set_string(offset, new_value)?;
        drop(page);
        frame.set_modified(self.txnum, lsn);
        Ok(())
    }

    fn undo_own_changes(&self, tx: &Transaction) -> Result<()> {
        let mut undone = 0usize;
        for bytes in self.log_manager.iter()? {
            let record = LogRecord::from_bytes(&bytes?)?;
            if record.txnum() != Some(self.txnum) {
                continue;
            }
            if let LogRecord::Start(_) = record {
                break;
            }
            record.undo(tx)?;
            undone += 1;
        }
        debug!(txnum = self.txnum, undone, "rolled back changes");
        Ok(())
    }

    fn undo_unfinished(&self, tx: &Transaction) -> Result<()> {
        let mut finished = HashSet::new();
        let mut undone = 0usize;
        for bytes in self.log_manager.iter()? {
            let record = LogRecord::from_bytes(&bytes?)?;
            match record {
                LogRecord::Checkpoint => break,
                LogRecord::Commit(txnum) | LogRecord::Rollback(txnum) => {
                    finished.insert(txnum);
                }
                _ => {
                    if let Some(txnum) = record.txnum() {
                        if !finished.contains(&txnum) {
                            record.undo(tx)?;
                            undone += 1;
                        }
                    }
                }
            }
        }
        info!(undone, "recovery undid unfinished changes");
        Ok(())
    }
}
