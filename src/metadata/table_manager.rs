use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::common::{DbError, Result};
use crate::query::{Constant, Scan, UpdateScan};
use crate::record::{table_file_name, FieldType, Layout, Schema, TableScan};
use crate::tx::Transaction;

/// Longest table, view, index or field name the catalogs can hold.
pub const MAX_NAME: usize = 16;

pub const TABLE_CATALOG: &str = "tblcat";
pub const FIELD_CATALOG: &str = "fldcat";

/// Stores table definitions in `tblcat(tblname, slotsize)` and
/// `fldcat(tblname, fldname, type, length, offset)`.
pub struct TableManager {
    tcat_layout: Arc<Layout>,
    fcat_layout: Arc<Layout>,
}

impl TableManager {
    /// Builds the catalog layouts, creating both catalog tables on a fresh
    /// database.
    pub fn new(tx: &Arc<Transaction>) -> Result<Self> {
        let mut tcat_schema = Schema::new();
        tcat_schema.add_string_field("tblname", MAX_NAME);
        tcat_schema.add_int_field("slotsize");

        let mut fcat_schema = Schema::new();
        fcat_schema.add_string_field("tblname", MAX_NAME);
        fcat_schema.add_string_field("fldname", MAX_NAME);
        fcat_schema.add_int_field("type");
        fcat_schema.add_int_field("length");
        fcat_schema.add_int_field("offset");

        let manager = Self {
            tcat_layout: Arc::new(Layout::new(tcat_schema.clone())),
            fcat_layout: Arc::new(Layout::new(fcat_schema.clone())),
        };
        if tx.size(&table_file_name(TABLE_CATALOG))? == 0 {
            debug!("creating table catalogs");
            manager.create_table(TABLE_CATALOG, &tcat_schema, tx)?;
            manager.create_table(FIELD_CATALOG, &fcat_schema, tx)?;
        }
        Ok(manager)
    }

    pub fn create_table(&self, table: &str, schema: &Schema, tx: &Arc<Transaction>) -> Result<()> {
        check_name(table)?;
        for field in schema.fields() {
            check_name(field)?;
        }
        if self.exists(table, tx)? {
            return Err(DbError::TableAlreadyExists(table.to_string()));
        }

        let layout = Layout::new(schema.clone());
        check_slot_size(table, &layout, tx.block_size())?;

        let mut tcat = TableScan::new(Arc::clone(tx), TABLE_CATALOG, Arc::clone(&self.tcat_layout))?;
        tcat.insert()?;
        tcat.set_string("tblname", table)?;
        tcat.set_int("slotsize", layout.slot_size() as i32)?;
        tcat.close();

        let mut fcat = TableScan::new(Arc::clone(tx), FIELD_CATALOG, Arc::clone(&self.fcat_layout))?;
        for field in schema.fields() {
            let info = schema
                .info(field)
                .ok_or_else(|| DbError::FieldNotFound(field.clone()))?;
            let offset = layout
                .offset(field)
                .ok_or_else(|| DbError::FieldNotFound(field.clone()))?;
            fcat.insert()?;
            fcat.set_string("tblname", table)?;
            fcat.set_string("fldname", field)?;
            fcat.set_int("type", info.field_type.code())?;
            fcat.set_int("length", info.length as i32)?;
            fcat.set_int("offset", offset as i32)?;
        }
        fcat.close();
        Ok(())
    }

    /// Whether `table` has a catalog entry.
    pub fn exists(&self, table: &str, tx: &Arc<Transaction>) -> Result<bool> {
        Ok(self.slot_size(table, tx)?.is_some())
    }

    /// Reconstructs the layout of `table` from the catalogs.
    pub fn get_layout(&self, table: &str, tx: &Arc<Transaction>) -> Result<Layout> {
        let slot_size = self
            .slot_size(table, tx)?
            .ok_or_else(|| DbError::TableNotFound(table.to_string()))?;

        let mut schema = Schema::new();
        let mut offsets = HashMap::new();
        let mut fcat = TableScan::new(Arc::clone(tx), FIELD_CATALOG, Arc::clone(&self.fcat_layout))?;
        while fcat.next()? {
            if fcat.get_string("tblname")? != table {
                continue;
            }
            let field = fcat.get_string("fldname")?;
            let field_type = FieldType::from_code(fcat.get_int("type")?)?;
            let length = fcat.get_int("length")? as usize;
            let offset = fcat.get_int("offset")? as usize;
            schema.add_field(field.clone(), field_type, length);
            offsets.insert(field, offset);
        }
        fcat.close();
        Ok(Layout::with_offsets(schema, offsets, slot_size))
    }

    fn slot_size(&self, table: &str, tx: &Arc<Transaction>) -> Result<Option<usize>> {
        let mut tcat = TableScan::new(Arc::clone(tx), TABLE_CATALOG, Arc::clone(&self.tcat_layout))?;
        let target = Constant::from(table);
        while tcat.next()? {
            if tcat.get_val("tblname")? == target {
                let size = tcat.get_int("slotsize")? as usize;
                tcat.close();
                return Ok(Some(size));
            }
        }
        tcat.close();
        Ok(None)
    }
}

/// Rejects names the catalogs cannot store.
pub fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_NAME {
        return Err(DbError::Config(format!(
            "bad name {name:?}: names are 1 to {MAX_NAME} characters"
        )));
    }
    Ok(())
}

/// Rejects layouts whose records would not fit in a single block.
pub fn check_slot_size(name: &str, layout: &Layout, block_size: usize) -> Result<()> {
    if layout.slot_size() > block_size {
        return Err(DbError::Config(format!(
            "records of {name} take {} bytes, more than the {block_size} byte block",
            layout.slot_size()
        )));
    }
    Ok(())
}
