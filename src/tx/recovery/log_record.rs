use std::fmt;

use bytes::{Buf, BufMut, BytesMut};

use crate::common::{BlockId, DbError, Lsn, Result, TxNum};
use crate::log::LogManager;
use crate::tx::Transaction;

pub const CHECKPOINT: i32 = 0;
pub const START: i32 = 1;
pub const COMMIT: i32 = 2;
pub const ROLLBACK: i32 = 3;
pub const SETINT: i32 = 4;
pub const SETSTRING: i32 = 5;

/// A record of the undo log. The first 4 bytes of an encoded record hold
/// its kind; update records carry the value the field had before the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    Checkpoint,
    Start(TxNum),
    Commit(TxNum),
    Rollback(TxNum),
    SetInt {
        txnum: TxNum,
        block: BlockId,
        offset: i32,
        old_value: i32,
    },
    SetString {
        txnum: TxNum,
        block: BlockId,
        offset: i32,
        old_value: String,
    },
}

impl LogRecord {
    pub fn kind(&self) -> i32 {
        match self {
            LogRecord::Checkpoint => CHECKPOINT,
            LogRecord::Start(_) => START,
            LogRecord::Commit(_) => COMMIT,
            LogRecord::Rollback(_) => ROLLBACK,
            LogRecord::SetInt { .. } => SETINT,
            LogRecord::SetString { .. } => SETSTRING,
        }
    }

    /// The transaction the record belongs to; None for checkpoints.
    pub fn txnum(&self) -> Option<TxNum> {
        match self {
            LogRecord::Checkpoint => None,
            LogRecord::Start(txnum) | LogRecord::Commit(txnum) | LogRecord::Rollback(txnum) => {
                Some(*txnum)
            }
            LogRecord::SetInt { txnum, .. } | LogRecord::SetString { txnum, .. } => Some(*txnum),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::new();
        buf.put_i32(self.kind());
        match self {
            LogRecord::Checkpoint => {}
            LogRecord::Start(txnum) | LogRecord::Commit(txnum) | LogRecord::Rollback(txnum) => {
                buf.put_i32(*txnum);
            }
            LogRecord::SetInt {
                txnum,
                block,
                offset,
                old_value,
            } => {
                put_header(&mut buf, *txnum, block, *offset);
                buf.put_i32(*old_value);
            }
            LogRecord::SetString {
                txnum,
                block,
                offset,
                old_value,
            } => {
                put_header(&mut buf, *txnum, block, *offset);
                put_str(&mut buf, old_value);
            }
        }
        buf.to_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut buf = bytes;
        let record = match get_i32(&mut buf)? {
            CHECKPOINT => LogRecord::Checkpoint,
            START => LogRecord::Start(get_i32(&mut buf)?),
            COMMIT => LogRecord::Commit(get_i32(&mut buf)?),
            ROLLBACK => LogRecord::Rollback(get_i32(&mut buf)?),
            SETINT => {
                let (txnum, block, offset) = get_header(&mut buf)?;
                LogRecord::SetInt {
                    txnum,
                    block,
                    offset,
                    old_value: get_i32(&mut buf)?,
                }
            }
            SETSTRING => {
                let (txnum, block, offset) = get_header(&mut buf)?;
                LogRecord::SetString {
                    txnum,
                    block,
                    offset,
                    old_value: get_str(&mut buf)?,
                }
            }
            kind => {
                return Err(DbError::MalformedLogRecord(format!(
                    "unknown record kind {kind}"
                )))
            }
        };
        Ok(record)
    }

    /// Appends the record to the log and returns its LSN.
    pub fn write_to_log(&self, log_manager: &LogManager) -> Result<Lsn> {
        log_manager.append(&self.to_bytes())
    }

    /// Restores the before-image of an update record. Other records are
    /// no-ops.
    pub fn undo(&self, tx: &Transaction) -> Result<()> {
        match self {
            LogRecord::SetInt {
                block,
                offset,
                old_value,
                ..
            } => {
                tx.pin(block)?;
                let result = tx.set_int(block, to_offset(*offset)?, *old_value, false);
                tx.unpin(block);
                result
            }
            LogRecord::SetString {
                block,
                offset,
                old_value,
                ..
            } => {
                tx.pin(block)?;
                let result = tx.set_string(block, to_offset(*offset)?, old_value, false);
                tx.unpin(block);
                result
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogRecord::Checkpoint => write!(f, "<CHECKPOINT>"),
            LogRecord::Start(t) => write!(f, "<START {t}>"),
            LogRecord::Commit(t) => write!(f, "<COMMIT {t}>"),
            LogRecord::Rollback(t) => write!(f, "<ROLLBACK {t}>"),
            LogRecord::SetInt {
                txnum,
                block,
                offset,
                old_value,
            } => write!(f, "<SETINT {txnum} {block} {offset} {old_value}>"),
            LogRecord::SetString {
                txnum,
                block,
                offset,
                old_value,
            } => write!(f, "<SETSTRING {txnum} {block} {offset} {old_value}>"),
        }
    }
}

fn to_offset(offset: i32) -> Result<usize> {
    usize::try_from(offset)
        .map_err(|_| DbError::MalformedLogRecord(format!("negative offset {offset}")))
}

fn put_str(buf: &mut BytesMut, s: &str) {
    buf.put_u32(s.len() as u32);
    buf.put_slice(s.as_bytes());
}

fn put_header(buf: &mut BytesMut, txnum: TxNum, block: &BlockId, offset: i32) {
    buf.put_i32(txnum);
    put_str(buf, block.file_name());
    buf.put_i32(block.number());
    buf.put_i32(offset);
}

fn ensure(buf: &&[u8], needed: usize) -> Result<()> {
    if buf.remaining() < needed {
        return Err(DbError::MalformedLogRecord(format!(
            "needed {needed} more bytes, found {}",
            buf.remaining()
        )));
    }
    Ok(())
}

fn get_i32(buf: &mut &[u8]) -> Result<i32> {
    ensure(buf, 4)?;
    Ok(buf.get_i32())
}

fn get_str(buf: &mut &[u8]) -> Result<String> {
    ensure(buf, 4)?;
    let len = buf.get_u32() as usize;
    ensure(buf, len)?;
    let s = String::from_utf8(buf[..len].to_vec())
        .map_err(|e| DbError::MalformedLogRecord(e.to_string()))?;
    buf.advance(len);
    Ok(s)
}

fn get_header(buf: &mut &[u8]) -> Result<(TxNum, BlockId, i32)> {
    let txnum = get_i32(buf)?;
    let file_name = get_str(buf)?;
    let number = get_i32(buf)?;
    let offset = get_i32(buf)?;
    Ok((txnum, BlockId::new(file_name, number), offset))
}
