use std::collections::HashMap;
use std::sync::Arc;

use crate::buffer::{BufferPoolManager, Frame};
use crate::common::{BlockId, Result};

/// The frames pinned by one transaction, with how many times each is pinned.
pub struct BufferList {
    buffer_pool: Arc<BufferPoolManager>,
    pins: HashMap<BlockId, (Arc<Frame>, usize)>,
}

impl BufferList {
    pub fn new(buffer_pool: Arc<BufferPoolManager>) -> Self {
        Self {
            buffer_pool,
            pins: HashMap::new(),
        }
    }

    pub fn get(&self, block: &BlockId) -> Option<&Arc<Frame>> {
        self.pins.get(block).map(|(frame, _)| frame)
    }

    pub fn pin(&mut self, block: &BlockId) -> Result<()> {
        let frame = self.buffer_pool.pin(block)?;
        self.pins
            .entry(block.clone())
            .or_insert((frame, 0))
            .1 += 1;
        Ok(())
    }

    pub fn unpin(&mut self, block: &BlockId) {
        if let Some((frame, count)) = self.pins.get_mut(block) {
            self.buffer_pool.unpin(frame);
            *count -= 1;
            if *count == 0 {
                self.pins.remove(block);
            }
        }
    }

    pub fn unpin_all(&mut self) {
        for (_, (frame, count)) in self.pins.drain() {
            for _ in 0..count {
                self.buffer_pool.unpin(&frame);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}
