use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::warn;

use super::{Frame, LruKReplacer, NaiveReplacer, Replacer};
use crate::common::{BlockId, DbError, FrameId, ReplacerKind, Result, TxNum};
use crate::log::LogManager;
use crate::storage::disk::FileManager;

/// Frame metadata guarded by the pool mutex
struct PoolState {
    /// Maps assigned blocks to the frames holding them
    block_table: HashMap<BlockId, FrameId>,
    /// Frames that have never held a block
    free_list: VecDeque<FrameId>,
    /// Eviction policy over unpinned frames
    replacer: Box<dyn Replacer>,
    /// Number of frames with a pin count of zero
    num_available: usize,
}

/// BufferPoolManager caches blocks in a fixed set of frames.
///
/// A caller pins a block to get its frame and unpins it when done. When no
/// frame is free, `pin` waits for an unpin up to the configured timeout and
/// then fails with `DbError::BufferAbort`. A dirty frame is only written
/// back after the log has been flushed through its LSN.
pub struct BufferPoolManager {
    frames: Vec<Arc<Frame>>,
    state: Mutex<PoolState>,
    /// Signalled whenever a frame becomes unpinned
    unpinned: Condvar,
    file_manager: Arc<FileManager>,
    log_manager: Arc<LogManager>,
    timeout: Duration,
}

impl BufferPoolManager {
    pub fn new(
        file_manager: Arc<FileManager>,
        log_manager: Arc<LogManager>,
        num_buffers: usize,
        replacer: ReplacerKind,
        timeout: Duration,
    ) -> Result<Self> {
        if num_buffers == 0 {
            return Err(DbError::Config("buffer count must be positive".into()));
        }

        let mut frames = Vec::with_capacity(num_buffers);
        let mut free_list = VecDeque::with_capacity(num_buffers);
        for i in 0..num_buffers {
            let frame_id = FrameId::new(i as u32);
            frames.push(Arc::new(Frame::new(frame_id, file_manager.create_page()?)));
            free_list.push_back(frame_id);
        }

        let replacer: Box<dyn Replacer> = match replacer {
            ReplacerKind::Naive => Box::new(NaiveReplacer::new(num_buffers)),
            ReplacerKind::LruK(k) => Box::new(LruKReplacer::new(k, num_buffers)),
        };

        Ok(Self {
            frames,
            state: Mutex::new(PoolState {
                block_table: HashMap::new(),
                free_list,
                replacer,
                num_available: num_buffers,
            }),
            unpinned: Condvar::new(),
            file_manager,
            log_manager,
            timeout,
        })
    }

    pub fn num_buffers(&self) -> usize {
        self.frames.len()
    }

    /// Number of unpinned frames.
    pub fn available(&self) -> usize {
        self.state.lock().num_available
    }

    /// Pins `block`, reading it into a frame if it is not already cached.
    pub fn pin(&self, block: &BlockId) -> Result<Arc<Frame>> {
        let deadline = Instant::now() + self.timeout;
        let mut state = self.state.lock();
        loop {
            if let Some(frame) = self.try_to_pin(&mut state, block)? {
                return Ok(frame);
            }
            if self.unpinned.wait_until(&mut state, deadline).timed_out() {
                return match self.try_to_pin(&mut state, block)? {
                    Some(frame) => Ok(frame),
                    None => {
                        warn!(%block, "buffer pin timed out");
                        Err(DbError::BufferAbort(block.clone()))
                    }
                };
            }
        }
    }

    /// Releases one pin on `frame`.
    pub fn unpin(&self, frame: &Frame) {
        let mut state = self.state.lock();
        if let Some(0) = frame.unpin() {
            state.num_available += 1;
            state.replacer.set_evictable(frame.frame_id(), true);
            self.unpinned.notify_all();
        }
    }

    /// Writes back every frame modified by `txnum`.
    pub fn flush_all(&self, txnum: TxNum) -> Result<()> {
        let _state = self.state.lock();
        for frame in &self.frames {
            if frame.modifying_tx() == Some(txnum) {
                frame.flush(&self.file_manager, &self.log_manager)?;
            }
        }
        Ok(())
    }

    fn try_to_pin(&self, state: &mut PoolState, block: &BlockId) -> Result<Option<Arc<Frame>>> {
        let frame_id = match state.block_table.get(block) {
            Some(&frame_id) => frame_id,
            None => match self.assign_frame(state, block)? {
                Some(frame_id) => frame_id,
                None => return Ok(None),
            },
        };

        let frame = &self.frames[frame_id.as_usize()];
        if frame.pin() == 1 {
            state.num_available -= 1;
            state.replacer.set_evictable(frame_id, false);
        }
        state.replacer.record_access(frame_id);
        Ok(Some(Arc::clone(frame)))
    }

    /// Finds an unpinned frame, writes back its old contents and loads `block`.
    fn assign_frame(&self, state: &mut PoolState, block: &BlockId) -> Result<Option<FrameId>> {
        let frame_id = match state.free_list.pop_front() {
            Some(frame_id) => frame_id,
            None => match state.replacer.evict() {
                Some(frame_id) => frame_id,
                None => return Ok(None),
            },
        };
        let frame = &self.frames[frame_id.as_usize()];

        if let Some(old_block) = frame.block() {
            if let Err(e) = frame.flush(&self.file_manager, &self.log_manager) {
                state.replacer.set_evictable(frame_id, true);
                return Err(e);
            }
            state.block_table.remove(&old_block);
        }
        if let Err(e) = frame.load(block.clone(), &self.file_manager) {
            state.free_list.push_back(frame_id);
            return Err(e);
        }
        state.block_table.insert(block.clone(), frame_id);
        Ok(Some(frame_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_bpm(num_buffers: usize, timeout_ms: u64) -> (BufferPoolManager, Arc<LogManager>, TempDir) {
        let dir = TempDir::new().unwrap();
        let fm = Arc::new(FileManager::new(dir.path(), 128, false).unwrap());
        let lm = Arc::new(LogManager::new(Arc::clone(&fm), "log").unwrap());
        let bpm = BufferPoolManager::new(
            fm,
            Arc::clone(&lm),
            num_buffers,
            ReplacerKind::Naive,
            Duration::from_millis(timeout_ms),
        )
        .unwrap();
        (bpm, lm, dir)
    }

    #[test]
    fn test_pin_same_block_shares_frame() {
        let (bpm, _lm, _dir) = create_bpm(3, 100);
        let block = BlockId::new("f", 0);
        let a = bpm.pin(&block).unwrap();
        let b = bpm.pin(&block).unwrap();
        assert_eq!(a.frame_id(), b.frame_id());
        assert_eq!(a.pin_count(), 2);
        assert_eq!(bpm.available(), 2);

        bpm.unpin(&a);
        assert_eq!(bpm.available(), 2);
        bpm.unpin(&b);
        assert_eq!(bpm.available(), 3);
    }

    #[test]
    fn test_full_pool_aborts_after_timeout() {
        let (bpm, _lm, _dir) = create_bpm(2, 50);
        let _a = bpm.pin(&BlockId::new("f", 0)).unwrap();
        let _b = bpm.pin(&BlockId::new("f", 1)).unwrap();
        let start = Instant::now();
        let err = bpm.pin(&BlockId::new("f", 2)).unwrap_err();
        assert!(matches!(err, DbError::BufferAbort(_)));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_evicting_dirty_frame_flushes_log_first() {
        let (bpm, lm, _dir) = create_bpm(1, 50);
        let block = BlockId::new("f", 0);
        let frame = bpm.pin(&block).unwrap();
        for _ in 0..5 {
            lm.append(b"change").unwrap();
        }
        frame.write_page().set_int(0, 77).unwrap();
        frame.set_modified(1, 3);
        bpm.unpin(&frame);
        assert_eq!(lm.last_saved_lsn(), 0);

        let other = bpm.pin(&BlockId::new("f", 1)).unwrap();
        assert!(lm.last_saved_lsn() >= 3);
        bpm.unpin(&other);

        let frame = bpm.pin(&block).unwrap();
        assert_eq!(frame.read_page().get_int(0).unwrap(), 77);
        assert_eq!(frame.modifying_tx(), None);
    }
}
