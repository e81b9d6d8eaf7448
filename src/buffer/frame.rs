use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::{BlockId, FrameId, Lsn, Result, TxNum};
use crate::log::LogManager;
use crate::storage::disk::FileManager;
use crate::storage::page::Page;

const NONE: i32 = -1;

/// Frame is a single buffer-pool slot: a page plus the bookkeeping needed
/// to pin it and to write it back in WAL order.
#[derive(Debug)]
pub struct Frame {
    /// The frame ID (index in the buffer pool)
    frame_id: FrameId,
    /// The block held by this frame, if any
    block: RwLock<Option<BlockId>>,
    /// Number of outstanding pins
    pin_count: AtomicU32,
    /// Transaction that last modified the page, or -1 if clean
    modifying_tx: AtomicI32,
    /// Largest LSN of a log record describing a change to the page, or -1
    dirty_lsn: AtomicI32,
    page: RwLock<Page>,
}

impl Frame {
    pub fn new(frame_id: FrameId, page: Page) -> Self {
        Self {
            frame_id,
            block: RwLock::new(None),
            pin_count: AtomicU32::new(0),
            modifying_tx: AtomicI32::new(NONE),
            dirty_lsn: AtomicI32::new(NONE),
            page: RwLock::new(page),
        }
    }

    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    pub fn block(&self) -> Option<BlockId> {
        self.block.read().clone()
    }

    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Acquire)
    }

    pub fn is_pinned(&self) -> bool {
        self.pin_count() > 0
    }

    /// Increments the pin count and returns the new value.
    pub(crate) fn pin(&self) -> u32 {
        self.pin_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrements the pin count and returns the new value.
    /// Returns None if the pin count was already 0.
    pub(crate) fn unpin(&self) -> Option<u32> {
        loop {
            let current = self.pin_count.load(Ordering::Acquire);
            if current == 0 {
                return None;
            }
            if self
                .pin_count
                .compare_exchange(current, current - 1, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                return Some(current - 1);
            }
        }
    }

    /// Records that `txnum` changed the page. `lsn` is the LSN of the log
    /// record describing the change, or negative for an unlogged change.
    pub fn set_modified(&self, txnum: TxNum, lsn: Lsn) {
        self.modifying_tx.store(txnum, Ordering::Release);
        if lsn >= 0 {
            self.dirty_lsn.fetch_max(lsn, Ordering::AcqRel);
        }
    }

    pub fn modifying_tx(&self) -> Option<TxNum> {
        match self.modifying_tx.load(Ordering::Acquire) {
            NONE => None,
            txnum => Some(txnum),
        }
    }

    pub fn dirty_lsn(&self) -> Option<Lsn> {
        match self.dirty_lsn.load(Ordering::Acquire) {
            NONE => None,
            lsn => Some(lsn),
        }
    }

    pub fn read_page(&self) -> RwLockReadGuard<'_, Page> {
        self.page.read()
    }

    pub fn write_page(&self) -> RwLockWriteGuard<'_, Page> {
        self.page.write()
    }

    /// Writes the page to its block if it is dirty, flushing the log through
    /// the page's LSN first.
    pub(crate) fn flush(&self, file_manager: &FileManager, log_manager: &LogManager) -> Result<()> {
        if self.modifying_tx().is_none() {
            return Ok(());
        }
        if let Some(lsn) = self.dirty_lsn() {
            log_manager.flush_lsn(lsn)?;
        }
        if let Some(block) = self.block() {
            file_manager.write(&block, &self.page.read())?;
        }
        self.modifying_tx.store(NONE, Ordering::Release);
        self.dirty_lsn.store(NONE, Ordering::Release);
        Ok(())
    }

    /// Reads `block` into the page. The frame must be clean and unpinned.
    pub(crate) fn load(&self, block: BlockId, file_manager: &FileManager) -> Result<()> {
        *self.block.write() = None;
        file_manager.read(&block, &mut self.page.write())?;
        *self.block.write() = Some(block);
        self.pin_count.store(0, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::new(FrameId::new(0), Page::new(64))
    }

    #[test]
    fn test_frame_new() {
        let frame = frame();
        assert_eq!(frame.frame_id(), FrameId::new(0));
        assert_eq!(frame.block(), None);
        assert_eq!(frame.pin_count(), 0);
        assert_eq!(frame.modifying_tx(), None);
        assert_eq!(frame.dirty_lsn(), None);
    }

    #[test]
    fn test_frame_pin_unpin() {
        let frame = frame();

        assert_eq!(frame.pin(), 1);
        assert_eq!(frame.pin(), 2);
        assert!(frame.is_pinned());

        assert_eq!(frame.unpin(), Some(1));
        assert_eq!(frame.unpin(), Some(0));
        assert_eq!(frame.unpin(), None);
    }

    #[test]
    fn test_set_modified_keeps_largest_lsn() {
        let frame = frame();
        frame.set_modified(3, 10);
        frame.set_modified(3, 7);
        assert_eq!(frame.dirty_lsn(), Some(10));
        frame.set_modified(4, -1);
        assert_eq!(frame.modifying_tx(), Some(4));
        assert_eq!(frame.dirty_lsn(), Some(10));
    }
}
