use std::sync::Arc;

use super::{check_name, TableManager};
use crate::common::{DbError, Result};
use crate::query::{Scan, UpdateScan};
use crate::record::{table_file_name, Schema, TableScan};
use crate::tx::Transaction;

/// Longest view definition `viewcat` can hold.
pub const MAX_VIEWDEF: usize = 100;

pub const VIEW_CATALOG: &str = "viewcat";

/// Stores view definitions in `viewcat(viewname, viewdef)`.
pub struct ViewManager {
    table_manager: Arc<TableManager>,
}

impl ViewManager {
    pub fn new(table_manager: Arc<TableManager>, tx: &Arc<Transaction>) -> Result<Self> {
        if tx.size(&table_file_name(VIEW_CATALOG))? == 0 {
            let mut schema = Schema::new();
            schema.add_string_field("viewname", super::MAX_NAME);
            schema.add_string_field("viewdef", MAX_VIEWDEF);
            table_manager.create_table(VIEW_CATALOG, &schema, tx)?;
        }
        Ok(Self { table_manager })
    }

    pub fn create_view(&self, name: &str, definition: &str, tx: &Arc<Transaction>) -> Result<()> {
        check_name(name)?;
        if definition.len() > MAX_VIEWDEF {
            return Err(DbError::Config(format!(
                "view definition of {} characters exceeds {MAX_VIEWDEF}",
                definition.len()
            )));
        }
        if self.table_manager.exists(name, tx)? || self.get_view_def(name, tx)?.is_some() {
            return Err(DbError::TableAlreadyExists(name.to_string()));
        }
        let layout = Arc::new(self.table_manager.get_layout(VIEW_CATALOG, tx)?);
        let mut scan = TableScan::new(Arc::clone(tx), VIEW_CATALOG, layout)?;
        scan.insert()?;
        scan.set_string("viewname", name)?;
        scan.set_string("viewdef", definition)?;
        scan.close();
        Ok(())
    }

    /// The query text of view `name`, or None if no such view exists.
    pub fn get_view_def(&self, name: &str, tx: &Arc<Transaction>) -> Result<Option<String>> {
        let layout = Arc::new(self.table_manager.get_layout(VIEW_CATALOG, tx)?);
        let mut scan = TableScan::new(Arc::clone(tx), VIEW_CATALOG, layout)?;
        let mut result = None;
        while scan.next()? {
            if scan.get_string("viewname")? == name {
                result = Some(scan.get_string("viewdef")?);
                break;
            }
        }
        scan.close();
        Ok(result)
    }
}
