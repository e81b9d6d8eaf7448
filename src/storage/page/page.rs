use std::io;

use bytes::{Buf, BufMut};

use super::AlignedBuffer;
use crate::common::{DbError, Result};

/// Size in bytes of an encoded `i32`.
pub const INT_SIZE: usize = 4;

enum PageBuffer {
    Heap(Box<[u8]>),
    Aligned(AlignedBuffer),
}

/// A block-sized byte buffer with big-endian accessors.
///
/// Integers are stored as 4-byte two's complement. Byte arrays and strings
/// are stored as a 4-byte unsigned length followed by the payload. Every
/// accessor is bounds-checked against the page capacity.
pub struct Page {
    buf: PageBuffer,
}

impl Page {
    /// Creates a zeroed page of `block_size` bytes.
    pub fn new(block_size: usize) -> Self {
        Self {
            buf: PageBuffer::Heap(vec![0u8; block_size].into_boxed_slice()),
        }
    }

    /// Creates a zeroed page whose buffer is aligned for direct I/O.
    pub fn new_aligned(block_size: usize, align: usize) -> Result<Self> {
        Ok(Self {
            buf: PageBuffer::Aligned(AlignedBuffer::new(block_size, align)?),
        })
    }

    /// Creates a heap page holding a copy of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            buf: PageBuffer::Heap(bytes.to_vec().into_boxed_slice()),
        }
    }

    /// Bytes needed to store a string of `len` bytes.
    pub fn max_length(len: usize) -> usize {
        INT_SIZE + len
    }

    pub fn capacity(&self) -> usize {
        self.contents().len()
    }

    pub fn contents(&self) -> &[u8] {
        match &self.buf {
            PageBuffer::Heap(b) => b,
            PageBuffer::Aligned(b) => b,
        }
    }

    pub fn contents_mut(&mut self) -> &mut [u8] {
        match &mut self.buf {
            PageBuffer::Heap(b) => b,
            PageBuffer::Aligned(b) => b,
        }
    }

    /// Zero-fills the page.
    pub fn clear(&mut self) {
        self.contents_mut().fill(0);
    }

    pub fn get_int(&self, offset: usize) -> Result<i32> {
        let mut src = self.slice(offset, INT_SIZE)?;
        Ok(src.get_i32())
    }

    pub fn set_int(&mut self, offset: usize, val: i32) -> Result<()> {
        let mut dst = self.slice_mut(offset, INT_SIZE)?;
        dst.put_i32(val);
        Ok(())
    }

    pub fn get_bytes(&self, offset: usize) -> Result<&[u8]> {
        let mut src = self.slice(offset, INT_SIZE)?;
        let len = src.get_u32() as usize;
        self.slice(offset + INT_SIZE, len)
    }

    pub fn set_bytes(&mut self, offset: usize, val: &[u8]) -> Result<()> {
        let len = u32::try_from(val.len()).map_err(|_| self.out_of_range(offset, val.len()))?;
        let mut dst = self.slice_mut(offset, INT_SIZE + val.len())?;
        dst.put_u32(len);
        dst.put_slice(val);
        Ok(())
    }

    pub fn get_string(&self, offset: usize) -> Result<String> {
        let bytes = self.get_bytes(offset)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| DbError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }

    pub fn set_string(&mut self, offset: usize, val: &str) -> Result<()> {
        self.set_bytes(offset, val.as_bytes())
    }

    fn slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let end = self.end_of(offset, len)?;
        Ok(&self.contents()[offset..end])
    }

    fn slice_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8]> {
        let end = self.end_of(offset, len)?;
        Ok(&mut self.contents_mut()[offset..end])
    }

    fn end_of(&self, offset: usize, len: usize) -> Result<usize> {
        match offset.checked_add(len) {
            Some(end) if end <= self.capacity() => Ok(end),
            _ => Err(self.out_of_range(offset, len)),
        }
    }

    fn out_of_range(&self, offset: usize, len: usize) -> DbError {
        DbError::OutOfRange {
            offset,
            len,
            capacity: self.capacity(),
        }
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("capacity", &self.capacity())
            .finish()
    }
}
