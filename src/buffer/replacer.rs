use crate::common::FrameId;

/// Chooses which unpinned frame the buffer pool reuses.
///
/// The buffer pool calls every method while holding its own mutex.
pub trait Replacer: Send {
    /// Notes that the frame was pinned.
    fn record_access(&mut self, frame_id: FrameId);

    /// Marks the frame as a candidate for eviction, or withdraws it.
    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool);

    /// Picks a victim among the evictable frames and withdraws it.
    fn evict(&mut self) -> Option<FrameId>;

    /// Number of evictable frames.
    fn size(&self) -> usize;
}

/// Picks the lowest-numbered unpinned frame.
pub struct NaiveReplacer {
    evictable: Vec<bool>,
    num_evictable: usize,
}

impl NaiveReplacer {
    pub fn new(num_frames: usize) -> Self {
        Self {
            evictable: vec![false; num_frames],
            num_evictable: 0,
        }
    }
}

impl Replacer for NaiveReplacer {
    fn record_access(&mut self, _frame_id: FrameId) {}

    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        if let Some(slot) = self.evictable.get_mut(frame_id.as_usize()) {
            if *slot != evictable {
                *slot = evictable;
                if evictable {
                    self.num_evictable += 1;
                } else {
                    self.num_evictable -= 1;
                }
            }
        }
    }

    fn evict(&mut self) -> Option<FrameId> {
        let index = self.evictable.iter().position(|&e| e)?;
        self.evictable[index] = false;
        self.num_evictable -= 1;
        Some(FrameId::new(index as u32))
    }

    fn size(&self) -> usize {
        self.num_evictable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naive_replacer_picks_lowest_frame() {
        let mut replacer = NaiveReplacer::new(4);
        assert_eq!(replacer.evict(), None);

        replacer.set_evictable(FrameId::new(2), true);
        replacer.set_evictable(FrameId::new(1), true);
        assert_eq!(replacer.size(), 2);

        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
        assert_eq!(replacer.evict(), Some(FrameId::new(2)));
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_naive_replacer_ignores_unknown_frames() {
        let mut replacer = NaiveReplacer::new(1);
        replacer.set_evictable(FrameId::new(5), true);
        assert_eq!(replacer.size(), 0);
    }
}
