use std::sync::Arc;

use super::{FieldType, Layout, RecordPage};
use crate::common::{BlockId, DbError, RecordId, Result};
use crate::query::{Constant, Scan, UpdateScan};
use crate::tx::Transaction;

/// Name of the file holding the records of `table`.
pub fn table_file_name(table: &str) -> String {
    format!("{table}.tbl")
}

/// A cursor over every record of a table file.
pub struct TableScan {
    tx: Arc<Transaction>,
    layout: Arc<Layout>,
    file_name: String,
    record_page: Option<RecordPage>,
    current_slot: Option<usize>,
}

impl TableScan {
    /// Opens a scan positioned before the first record, creating the first
    /// block if the file is empty.
    pub fn new(tx: Arc<Transaction>, table: &str, layout: Arc<Layout>) -> Result<Self> {
        let mut scan = Self {
            tx,
            layout,
            file_name: table_file_name(table),
            record_page: None,
            current_slot: None,
        };
        if scan.tx.size(&scan.file_name)? == 0 {
            scan.move_to_new_block()?;
        } else {
            scan.move_to_block(0)?;
        }
        Ok(scan)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    fn page(&self) -> Result<&RecordPage> {
        self.record_page.as_ref().ok_or(DbError::ScanClosed)
    }

    fn slot(&self) -> Result<usize> {
        self.current_slot.ok_or(DbError::NoCurrentRecord)
    }

    fn move_to_block(&mut self, number: i32) -> Result<()> {
        self.record_page = None;
        let block = BlockId::new(&self.file_name, number);
        self.record_page = Some(RecordPage::new(
            Arc::clone(&self.tx),
            block,
            Arc::clone(&self.layout),
        )?);
        self.current_slot = None;
        Ok(())
    }

    fn move_to_new_block(&mut self) -> Result<()> {
        self.record_page = None;
        let block = self.tx.append(&self.file_name)?;
        let page = RecordPage::new(Arc::clone(&self.tx), block, Arc::clone(&self.layout))?;
        page.format()?;
        self.record_page = Some(page);
        self.current_slot = None;
        Ok(())
    }

    fn at_last_block(&self) -> Result<bool> {
        let current = self.page()?.block().number();
        Ok(current >= self.tx.size(&self.file_name)? - 1)
    }
}

impl Scan for TableScan {
    fn before_first(&mut self) -> Result<()> {
        self.move_to_block(0)
    }

    fn next(&mut self) -> Result<bool> {
        loop {
            let page = self.page()?;
            self.current_slot = page.next_after(self.current_slot)?;
            if self.current_slot.is_some() {
                return Ok(true);
            }
            if self.at_last_block()? {
                return Ok(false);
            }
            let next_block = self.page()?.block().number() + 1;
            self.move_to_block(next_block)?;
        }
    }

    fn get_int(&self, field: &str) -> Result<i32> {
        self.page()?.get_int(self.slot()?, field)
    }

    fn get_string(&self, field: &str) -> Result<String> {
        self.page()?.get_string(self.slot()?, field)
    }

    fn get_val(&self, field: &str) -> Result<Constant> {
        match self.layout.schema().field_type(field) {
            Some(FieldType::Integer) => Ok(Constant::Int(self.get_int(field)?)),
            Some(FieldType::Varchar) => Ok(Constant::Str(self.get_string(field)?)),
            None => Err(DbError::FieldNotFound(field.to_string())),
        }
    }

    fn has_field(&self, field: &str) -> bool {
        self.layout.schema().has_field(field)
    }

    fn close(&mut self) {
        self.record_page = None;
        self.current_slot = None;
    }

    fn as_update_scan(&mut self) -> Result<&mut dyn UpdateScan> {
        Ok(self)
    }

    fn as_update_scan_ref(&self) -> Result<&dyn UpdateScan> {
        Ok(self)
    }
}

impl UpdateScan for TableScan {
    fn set_int(&mut self, field: &str, value: i32) -> Result<()> {
        self.page()?.set_int(self.slot()?, field, value)
    }

    fn set_string(&mut self, field: &str, value: &str) -> Result<()> {
        self.page()?.set_string(self.slot()?, field, value)
    }

    fn set_val(&mut self, field: &str, value: &Constant) -> Result<()> {
        match value {
            Constant::Int(v) => self.set_int(field, *v),
            Constant::Str(s) => self.set_string(field, s),
        }
    }

    fn insert(&mut self) -> Result<()> {
        if self.page()?.slots_per_block() == 0 {
            return Err(DbError::RecordTooLong {
                size: self.layout.slot_size(),
                max: self.tx.block_size(),
            });
        }
        let mut slot = self.page()?.insert_after(self.current_slot)?;
        while slot.is_none() {
            if self.at_last_block()? {
                self.move_to_new_block()?;
            } else {
                let next_block = self.page()?.block().number() + 1;
                self.move_to_block(next_block)?;
            }
            slot = self.page()?.insert_after(self.current_slot)?;
        }
        self.current_slot = slot;
        Ok(())
    }

    fn delete(&mut self) -> Result<()> {
        self.page()?.delete(self.slot()?)
    }

    fn rid(&self) -> Result<RecordId> {
        Ok(RecordId::new(self.page()?.block().number(), self.slot()?))
    }

    fn move_to_rid(&mut self, rid: RecordId) -> Result<()> {
        self.move_to_block(rid.block_number)?;
        self.current_slot = Some(rid.slot);
        Ok(())
    }
}
