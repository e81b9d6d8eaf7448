use std::fmt;
use std::sync::Arc;

/// Log sequence number. `INVALID_LSN` means "not logged".
pub type Lsn = i32;

/// Transaction number.
pub type TxNum = i32;

/// LSN value meaning no record has been assigned.
pub const INVALID_LSN: Lsn = 0;

/// Block number of the synthetic end-of-file block used to serialize
/// `size` against `append`.
pub const END_OF_FILE_BLOCK: i32 = -1;

/// Identifies a block of a file: `(file_name, block_number)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId {
    file_name: Arc<str>,
    number: i32,
}

impl BlockId {
    pub fn new(file_name: impl AsRef<str>, number: i32) -> Self {
        Self {
            file_name: Arc::from(file_name.as_ref()),
            number,
        }
    }

    /// The pseudo-block locked by `Transaction::size` and `Transaction::append`.
    pub fn end_of_file(file_name: impl AsRef<str>) -> Self {
        Self::new(file_name, END_OF_FILE_BLOCK)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn number(&self) -> i32 {
        self.number
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[file {}, block {}]", self.file_name, self.number)
    }
}

/// Frame identifier type - identifies a buffer frame in the buffer pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u32);

impl FrameId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameId({})", self.0)
    }
}

/// Record identifier - block number within the table file and slot within the block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub block_number: i32,
    pub slot: usize,
}

impl RecordId {
    pub fn new(block_number: i32, slot: usize) -> Self {
        Self { block_number, slot }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.block_number, self.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_id_equality_and_display() {
        let a = BlockId::new("t.tbl", 3);
        let b = BlockId::new(String::from("t.tbl"), 3);
        assert_eq!(a, b);
        assert_ne!(a, BlockId::new("t.tbl", 4));
        assert_eq!(a.to_string(), "[file t.tbl, block 3]");
        assert_eq!(BlockId::end_of_file("t.tbl").number(), END_OF_FILE_BLOCK);
    }
}
