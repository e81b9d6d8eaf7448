use std::sync::Arc;

use super::LogManager;
use crate::common::{BlockId, Result};
use crate::storage::disk::FileManager;
use crate::storage::page::{Page, INT_SIZE};

/// Walks the log backwards, yielding record payloads newest first.
pub struct LogIterator {
    file_manager: Arc<FileManager>,
    block: BlockId,
    page: Page,
    current_pos: usize,
    failed: bool,
}

impl LogIterator {
    pub(crate) fn new(file_manager: Arc<FileManager>, block: BlockId) -> Result<Self> {
        let page = file_manager.create_page()?;
        let mut iter = Self {
            file_manager,
            block: block.clone(),
            page,
            current_pos: 0,
            failed: false,
        };
        iter.move_to_block(block)?;
        Ok(iter)
    }

    fn move_to_block(&mut self, block: BlockId) -> Result<()> {
        self.file_manager.read(&block, &mut self.page)?;
        self.current_pos = LogManager::boundary(&self.page, self.file_manager.block_size())?;
        self.block = block;
        Ok(())
    }

    fn advance(&mut self) -> Result<Option<Vec<u8>>> {
        while self.current_pos >= self.file_manager.block_size() {
            if self.block.number() == 0 {
                return Ok(None);
            }
            let previous = BlockId::new(self.block.file_name(), self.block.number() - 1);
            self.move_to_block(previous)?;
        }
        let record = self.page.get_bytes(self.current_pos)?.to_vec();
        self.current_pos += INT_SIZE + record.len();
        Ok(Some(record))
    }
}

impl Iterator for LogIterator {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.advance().transpose();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}
