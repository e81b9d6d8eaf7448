use std::alloc::{self, Layout as AllocLayout};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::slice;

use crate::common::{DbError, Result};

/// A zeroed heap buffer whose start address is a multiple of `align`.
///
/// O_DIRECT reads and writes require the user buffer to be aligned to the
/// device's logical block size, which `Vec<u8>` does not guarantee.
pub struct AlignedBuffer {
    ptr: NonNull<u8>,
    layout: AllocLayout,
}

// The buffer exclusively owns its allocation.
unsafe impl Send for AlignedBuffer {}
unsafe impl Sync for AlignedBuffer {}

impl AlignedBuffer {
    pub fn new(size: usize, align: usize) -> Result<Self> {
        if size == 0 {
            return Err(DbError::Config("aligned buffer size must be positive".into()));
        }
        let layout = AllocLayout::from_size_align(size, align)
            .map_err(|e| DbError::Config(format!("bad buffer alignment {align}: {e}")))?;
        // SAFETY: layout has a non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = match NonNull::new(raw) {
            Some(ptr) => ptr,
            None => alloc::handle_alloc_error(layout),
        };
        Ok(Self { ptr, layout })
    }

    pub fn align(&self) -> usize {
        self.layout.align()
    }
}

impl Deref for AlignedBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        // SAFETY: ptr is valid for layout.size() initialized bytes for the life of self.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl DerefMut for AlignedBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        // SAFETY: as above, and &mut self guarantees exclusive access.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        // SAFETY: ptr was allocated with exactly this layout.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_buffer_is_aligned_and_zeroed() {
        let mut buf = AlignedBuffer::new(8192, 4096).unwrap();
        assert_eq!(buf.as_ptr() as usize % 4096, 0);
        assert_eq!(buf.len(), 8192);
        assert!(buf.iter().all(|&b| b == 0));
        buf[10] = 7;
        assert_eq!(buf[10], 7);
    }

    #[test]
    fn test_aligned_buffer_rejects_bad_alignment() {
        assert!(AlignedBuffer::new(4096, 3).is_err());
        assert!(AlignedBuffer::new(0, 4096).is_err());
    }
}
