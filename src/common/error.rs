use thiserror::Error;

use super::types::{BlockId, TxNum};

/// Coarse classification of a [`DbError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Io,
    OutOfRange,
    BufferAbort,
    LockAbort,
    Parse,
    NotUpdatable,
    TooLongRecord,
    InvalidUpcast,
    Catalog,
}

/// Database error types
#[derive(Error, Debug)]
pub enum DbError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("offset {offset} with length {len} is out of range for page of {capacity} bytes")]
    OutOfRange {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    #[error("malformed log record: {0}")]
    MalformedLogRecord(String),

    #[error("timed out waiting for a buffer to pin {0}")]
    BufferAbort(BlockId),

    #[error("timed out waiting for a lock on {0}")]
    LockAbort(BlockId),

    #[error("syntax error: {0}")]
    Parse(String),

    #[error("scan is not updatable: {0}")]
    NotUpdatable(String),

    #[error("log record of {size} bytes does not fit in a {max} byte block")]
    RecordTooLong { size: usize, max: usize },

    #[error("value of {len} bytes exceeds varchar({max}) field {field}")]
    StringTooLong {
        field: String,
        len: usize,
        max: usize,
    },

    #[error("field {field} is not of type {expected}")]
    InvalidUpcast {
        field: String,
        expected: &'static str,
    },

    #[error("transaction {0} is closed")]
    TransactionClosed(TxNum),

    #[error("scan is closed")]
    ScanClosed,

    #[error("scan is not positioned on a record")]
    NoCurrentRecord,

    #[error("block {0} is not pinned by this transaction")]
    BlockNotPinned(BlockId),

    #[error("table {0} not found")]
    TableNotFound(String),

    #[error("table {0} already exists")]
    TableAlreadyExists(String),

    #[error("view {0} not found")]
    ViewNotFound(String),

    #[error("field {0} not found")]
    FieldNotFound(String),

    #[error("operation not supported: {0}")]
    Unsupported(String),
}

impl DbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::Config(_) | DbError::TransactionClosed(_) | DbError::ScanClosed => {
                ErrorKind::Config
            }
            DbError::Io(_) => ErrorKind::Io,
            DbError::OutOfRange { .. }
            | DbError::MalformedLogRecord(_)
            | DbError::NoCurrentRecord => ErrorKind::OutOfRange,
            DbError::BufferAbort(_) => ErrorKind::BufferAbort,
            DbError::LockAbort(_) => ErrorKind::LockAbort,
            DbError::Parse(_) => ErrorKind::Parse,
            DbError::NotUpdatable(_) => ErrorKind::NotUpdatable,
            DbError::RecordTooLong { .. } | DbError::StringTooLong { .. } => {
                ErrorKind::TooLongRecord
            }
            DbError::InvalidUpcast { .. } => ErrorKind::InvalidUpcast,
            DbError::BlockNotPinned(_)
            | DbError::TableNotFound(_)
            | DbError::TableAlreadyExists(_)
            | DbError::ViewNotFound(_)
            | DbError::FieldNotFound(_)
            | DbError::Unsupported(_) => ErrorKind::Catalog,
        }
    }

    /// True for the errors after which the transaction must be rolled back.
    pub fn is_abort(&self) -> bool {
        matches!(self, DbError::BufferAbort(_) | DbError::LockAbort(_))
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_kinds_are_distinguishable() {
        let block = BlockId::new("f", 1);
        let buffer = DbError::BufferAbort(block.clone());
        let lock = DbError::LockAbort(block);
        assert!(buffer.is_abort());
        assert!(lock.is_abort());
        assert_eq!(buffer.kind(), ErrorKind::BufferAbort);
        assert_eq!(lock.kind(), ErrorKind::LockAbort);
        assert!(!DbError::Parse("x".into()).is_abort());
        assert_eq!(DbError::TransactionClosed(3).kind(), ErrorKind::Config);
    }
}
