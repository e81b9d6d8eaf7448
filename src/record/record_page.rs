use std::sync::Arc;

use super::{FieldType, Layout};
use crate::common::{BlockId, DbError, Result};
use crate::tx::Transaction;

const EMPTY: i32 = 0;
const USED: i32 = 1;

/// A block of a table file viewed as an array of fixed-size slots.
///
/// The page stays pinned for the lifetime of the value. Every read and
/// write goes through the transaction, so locking and logging happen there.
pub struct RecordPage {
    tx: Arc<Transaction>,
    block: BlockId,
    layout: Arc<Layout>,
}

impl RecordPage {
    pub fn new(tx: Arc<Transaction>, block: BlockId, layout: Arc<Layout>) -> Result<Self> {
        tx.pin(&block)?;
        Ok(Self { tx, block, layout })
    }

    pub fn block(&self) -> &BlockId {
        &self.block
    }

    pub fn get_int(&self, slot: usize, field: &str) -> Result<i32> {
        let pos = self.field_pos(slot, field, FieldType::Integer)?;
        self.tx.get_int(&self.block, pos)
    }

    pub fn get_string(&self, slot: usize, field: &str) -> Result<String> {
        let pos = self.field_pos(slot, field, FieldType::Varchar)?;
        self.tx.get_string(&self.block, pos)
    }

    pub fn set_int(&self, slot: usize, field: &str, value: i32) -> Result<()> {
        let pos = self.field_pos(slot, field, FieldType::Integer)?;
        self.tx.set_int(&self.block, pos, value, true)
    }

    pub fn set_string(&self, slot: usize, field: &str, value: &str) -> Result<()> {
        let pos = self.field_pos(slot, field, FieldType::Varchar)?;
        let max = self.layout.schema().length(field).unwrap_or(0);
        if value.len() > max {
            return Err(DbError::StringTooLong {
                field: field.to_string(),
                len: value.len(),
                max,
            });
        }
        // the unused tail of the field must stay zeroed, after undo too:
        // first widen the shorter of the two values with NULs
        let old = self.tx.get_string(&self.block, pos)?;
        if old.len() != value.len() {
            let (shorter, width) = if value.len() < old.len() {
                (value, old.len())
            } else {
                (old.as_str(), value.len())
            };
            let mut padded = String::with_capacity(width);
            padded.push_str(shorter);
            padded.extend(std::iter::repeat('\0').take(width - shorter.len()));
            self.tx.set_string(&self.block, pos, &padded, true)?;
        }
        self.tx.set_string(&self.block, pos, value, true)
    }

    pub fn delete(&self, slot: usize) -> Result<()> {
        self.set_flag(slot, EMPTY)
    }

    /// Marks every slot empty and zeroes its fields. The writes are not
    /// logged: the block is newly appended, so there is nothing to undo.
    pub fn format(&self) -> Result<()> {
        let mut slot = 0;
        while self.is_valid_slot(slot) {
            self.tx
                .set_int(&self.block, self.offset(slot), EMPTY, false)?;
            for field in self.layout.schema().fields() {
                let pos = self.offset(slot) + self.layout.offset(field).unwrap_or(0);
                match self.layout.schema().field_type(field) {
                    Some(FieldType::Varchar) => self.tx.set_string(&self.block, pos, "", false)?,
                    _ => self.tx.set_int(&self.block, pos, 0, false)?,
                }
            }
            slot += 1;
        }
        Ok(())
    }

    /// The first used slot after `slot` (or from the start, for None).
    pub fn next_after(&self, slot: Option<usize>) -> Result<Option<usize>> {
        self.search_after(slot, USED)
    }

    /// Claims the first empty slot after `slot` and returns it.
    pub fn insert_after(&self, slot: Option<usize>) -> Result<Option<usize>> {
        let found = self.search_after(slot, EMPTY)?;
        if let Some(slot) = found {
            self.set_flag(slot, USED)?;
        }
        Ok(found)
    }

    pub fn slots_per_block(&self) -> usize {
        self.tx.block_size() / self.layout.slot_size()
    }

    fn search_after(&self, slot: Option<usize>, flag: i32) -> Result<Option<usize>> {
        let mut slot = slot.map_or(0, |s| s + 1);
        while self.is_valid_slot(slot) {
            if self.tx.get_int(&self.block, self.offset(slot))? == flag {
                return Ok(Some(slot));
            }
            slot += 1;
        }
        Ok(None)
    }

    fn set_flag(&self, slot: usize, flag: i32) -> Result<()> {
        self.tx.set_int(&self.block, self.offset(slot), flag, true)
    }

    fn is_valid_slot(&self, slot: usize) -> bool {
        self.offset(slot + 1) <= self.tx.block_size()
    }

    fn offset(&self, slot: usize) -> usize {
        slot * self.layout.slot_size()
    }

    fn field_pos(&self, slot: usize, field: &str, expected: FieldType) -> Result<usize> {
        let offset = self
            .layout
            .offset(field)
            .ok_or_else(|| DbError::FieldNotFound(field.to_string()))?;
        if self.layout.schema().field_type(field) != Some(expected) {
            return Err(DbError::InvalidUpcast {
                field: field.to_string(),
                expected: match expected {
                    FieldType::Integer => "int",
                    FieldType::Varchar => "varchar",
                },
            });
        }
        Ok(self.offset(slot) + offset)
    }
}

impl Drop for RecordPage {
    fn drop(&mut self) {
        self.tx.unpin(&self.block);
    }
}
