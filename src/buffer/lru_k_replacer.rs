use std::collections::{HashMap, VecDeque};

use super::Replacer;
use crate::common::FrameId;

type Timestamp = u64;

/// Tracks access history for a single frame
#[derive(Debug, Default)]
struct FrameAccessInfo {
    /// History of access timestamps (most recent at back)
    history: VecDeque<Timestamp>,
    is_evictable: bool,
}

impl FrameAccessInfo {
    fn record_access(&mut self, timestamp: Timestamp, k: usize) {
        self.history.push_back(timestamp);
        while self.history.len() > k {
            self.history.pop_front();
        }
    }

    /// Backward k-distance, or None (+inf) with fewer than k accesses
    fn k_distance(&self, now: Timestamp, k: usize) -> Option<Timestamp> {
        if self.history.len() < k {
            None
        } else {
            Some(now - self.history[self.history.len() - k])
        }
    }

    fn earliest_timestamp(&self) -> Option<Timestamp> {
        self.history.front().copied()
    }
}

/// LRU-K Replacement Policy
///
/// Evicts the evictable frame whose backward k-distance is the largest.
/// Backward k-distance is the time since the kth most recent access; frames
/// with fewer than k accesses have +inf distance, and ties among those are
/// broken by the earliest recorded access.
pub struct LruKReplacer {
    k: usize,
    max_frames: usize,
    /// Logical clock, advanced on every access
    current_timestamp: Timestamp,
    frame_info: HashMap<FrameId, FrameAccessInfo>,
    num_evictable: usize,
}

impl LruKReplacer {
    pub fn new(k: usize, max_frames: usize) -> Self {
        Self {
            k,
            max_frames,
            current_timestamp: 0,
            frame_info: HashMap::new(),
            num_evictable: 0,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Removes a frame from the replacer entirely.
    pub fn remove(&mut self, frame_id: FrameId) {
        if let Some(info) = self.frame_info.remove(&frame_id) {
            if info.is_evictable {
                self.num_evictable -= 1;
            }
        }
    }

    fn is_better_victim(
        current: Option<(Option<Timestamp>, Option<Timestamp>)>,
        k_dist: Option<Timestamp>,
        earliest: Option<Timestamp>,
    ) -> bool {
        let Some((victim_dist, victim_earliest)) = current else {
            return true;
        };
        match (victim_dist, k_dist) {
            (None, Some(_)) => false,
            (Some(_), None) => true,
            (None, None) => match (victim_earliest, earliest) {
                (Some(v), Some(c)) => c < v,
                (None, Some(_)) => true,
                _ => false,
            },
            (Some(v), Some(c)) => c > v,
        }
    }
}

impl Replacer for LruKReplacer {
    fn record_access(&mut self, frame_id: FrameId) {
        if frame_id.as_usize() >= self.max_frames {
            return;
        }
        let timestamp = self.current_timestamp;
        self.current_timestamp += 1;
        self.frame_info
            .entry(frame_id)
            .or_default()
            .record_access(timestamp, self.k);
    }

    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        if frame_id.as_usize() >= self.max_frames {
            return;
        }
        let info = self.frame_info.entry(frame_id).or_default();
        if info.is_evictable != evictable {
            info.is_evictable = evictable;
            if evictable {
                self.num_evictable += 1;
            } else {
                self.num_evictable -= 1;
            }
        }
    }

    fn evict(&mut self) -> Option<FrameId> {
        if self.num_evictable == 0 {
            return None;
        }

        let mut victim: Option<FrameId> = None;
        let mut victim_rank = None;
        for (&frame_id, info) in &self.frame_info {
            if !info.is_evictable {
                continue;
            }
            let k_dist = info.k_distance(self.current_timestamp, self.k);
            let earliest = info.earliest_timestamp();
            if Self::is_better_victim(victim_rank, k_dist, earliest) {
                victim = Some(frame_id);
                victim_rank = Some((k_dist, earliest));
            }
        }

        if let Some(frame_id) = victim {
            self.frame_info.remove(&frame_id);
            self.num_evictable -= 1;
        }
        victim
    }

    fn size(&self) -> usize {
        self.num_evictable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evictable(replacer: &mut LruKReplacer, frames: &[u32]) {
        for &f in frames {
            replacer.set_evictable(FrameId::new(f), true);
        }
    }

    #[test]
    fn test_evict_empty() {
        let mut replacer = LruKReplacer::new(2, 10);
        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.k(), 2);
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_infinite_distance_evicts_earliest_access() {
        let mut replacer = LruKReplacer::new(2, 10);
        for f in 0..3 {
            replacer.record_access(FrameId::new(f));
        }
        evictable(&mut replacer, &[0, 1, 2]);
        assert_eq!(replacer.evict(), Some(FrameId::new(0)));
        assert_eq!(replacer.size(), 2);
    }

    #[test]
    fn test_fewer_than_k_accesses_goes_first() {
        let mut replacer = LruKReplacer::new(2, 10);
        replacer.record_access(FrameId::new(0));
        replacer.record_access(FrameId::new(0));
        replacer.record_access(FrameId::new(1));
        evictable(&mut replacer, &[0, 1]);
        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
    }

    #[test]
    fn test_largest_k_distance() {
        let mut replacer = LruKReplacer::new(2, 10);
        for f in 0..3 {
            replacer.record_access(FrameId::new(f));
            replacer.record_access(FrameId::new(f));
        }
        evictable(&mut replacer, &[0, 1, 2]);
        assert_eq!(replacer.evict(), Some(FrameId::new(0)));
        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
    }

    #[test]
    fn test_toggle_and_remove() {
        let mut replacer = LruKReplacer::new(2, 10);
        replacer.record_access(FrameId::new(0));
        replacer.set_evictable(FrameId::new(0), true);
        replacer.set_evictable(FrameId::new(0), false);
        assert_eq!(replacer.evict(), None);

        replacer.set_evictable(FrameId::new(0), true);
        replacer.remove(FrameId::new(0));
        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.evict(), None);
    }
}
