use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::LogIterator;
use crate::common::{BlockId, DbError, Lsn, Result, INVALID_LSN};
use crate::storage::disk::FileManager;
use crate::storage::page::{Page, INT_SIZE};

struct LogState {
    /// In-memory copy of the last log block
    page: Page,
    current_block: BlockId,
    latest_lsn: Lsn,
    last_saved_lsn: Lsn,
}

/// LogManager appends records to the log file and assigns their LSNs.
///
/// Each log block starts with a 4-byte boundary: the offset of the most
/// recently written record. Records fill the block from the end towards the
/// front, each stored as `[u32 length][payload]`, so reading from the
/// boundary to the end of a block yields newest-first order.
pub struct LogManager {
    file_manager: Arc<FileManager>,
    log_file: String,
    state: Mutex<LogState>,
}

impl LogManager {
    pub fn new(file_manager: Arc<FileManager>, log_file: impl Into<String>) -> Result<Self> {
        let log_file = log_file.into();
        let mut page = file_manager.create_page()?;
        let num_blocks = file_manager.block_length(&log_file)?;
        let current_block = if num_blocks == 0 {
            Self::append_new_block(&file_manager, &log_file, &mut page)?
        } else {
            let block = BlockId::new(&log_file, num_blocks - 1);
            file_manager.read(&block, &mut page)?;
            block
        };

        Ok(Self {
            file_manager,
            log_file,
            state: Mutex::new(LogState {
                page,
                current_block,
                latest_lsn: INVALID_LSN,
                last_saved_lsn: INVALID_LSN,
            }),
        })
    }

    /// Appends a record and returns its LSN. The record is not durable until
    /// a flush covers its LSN.
    pub fn append(&self, record: &[u8]) -> Result<Lsn> {
        let block_size = self.file_manager.block_size();
        let needed = INT_SIZE + record.len();
        if needed + INT_SIZE > block_size {
            return Err(DbError::RecordTooLong {
                size: needed,
                max: block_size - INT_SIZE,
            });
        }

        let mut state = self.state.lock();
        let mut boundary = Self::boundary(&state.page, block_size)?;
        if boundary < needed + INT_SIZE {
            self.flush_locked(&mut state)?;
            let LogState {
                page,
                current_block,
                ..
            } = &mut *state;
            *current_block = Self::append_new_block(&self.file_manager, &self.log_file, page)?;
            debug!(block = current_block.number(), "log moved to new block");
            boundary = block_size;
        }

        let record_pos = boundary - needed;
        state.page.set_bytes(record_pos, record)?;
        state.page.set_int(0, record_pos as i32)?;
        state.latest_lsn += 1;
        Ok(state.latest_lsn)
    }

    /// Makes every record up to `lsn` durable.
    pub fn flush_lsn(&self, lsn: Lsn) -> Result<()> {
        let mut state = self.state.lock();
        if lsn >= state.last_saved_lsn {
            self.flush_locked(&mut state)?;
        }
        Ok(())
    }

    /// Writes the current log block to disk.
    pub fn flush(&self) -> Result<()> {
        let mut state = self.state.lock();
        self.flush_locked(&mut state)
    }

    /// Iterates over every record in the log, newest first.
    pub fn iter(&self) -> Result<LogIterator> {
        let mut state = self.state.lock();
        self.flush_locked(&mut state)?;
        LogIterator::new(Arc::clone(&self.file_manager), state.current_block.clone())
    }

    pub fn latest_lsn(&self) -> Lsn {
        self.state.lock().latest_lsn
    }

    pub fn last_saved_lsn(&self) -> Lsn {
        self.state.lock().last_saved_lsn
    }

    pub fn log_file(&self) -> &str {
        &self.log_file
    }

    fn flush_locked(&self, state: &mut LogState) -> Result<()> {
        self.file_manager.write(&state.current_block, &state.page)?;
        state.last_saved_lsn = state.latest_lsn;
        Ok(())
    }

    fn append_new_block(
        file_manager: &FileManager,
        log_file: &str,
        page: &mut Page,
    ) -> Result<BlockId> {
        let block = file_manager.extend_file(log_file)?;
        page.clear();
        page.set_int(0, file_manager.block_size() as i32)?;
        file_manager.write(&block, page)?;
        Ok(block)
    }

    pub(crate) fn boundary(page: &Page, block_size: usize) -> Result<usize> {
        let boundary = page.get_int(0)?;
        match usize::try_from(boundary) {
            Ok(b) if (INT_SIZE..=block_size).contains(&b) => Ok(b),
            _ => Err(DbError::MalformedLogRecord(format!(
                "log block boundary {boundary} outside 4..={block_size}"
            ))),
        }
    }
}
