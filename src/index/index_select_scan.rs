use super::Index;
use crate::common::Result;
use crate::query::{Constant, Scan, UpdateScan};
use crate::record::TableScan;

/// Visits the records of a table whose indexed field equals a constant,
/// following the record ids stored in the index.
pub struct IndexSelectScan {
    scan: TableScan,
    index: Box<dyn Index>,
    value: Constant,
}

impl IndexSelectScan {
    pub fn new(scan: TableScan, index: Box<dyn Index>, value: Constant) -> Result<Self> {
        let mut scan = Self { scan, index, value };
        scan.before_first()?;
        Ok(scan)
    }
}

impl Scan for IndexSelectScan {
    fn before_first(&mut self) -> Result<()> {
        self.index.before_first(&self.value)
    }

    fn next(&mut self) -> Result<bool> {
        if !self.index.next()? {
            return Ok(false);
        }
        let rid = self.index.data_rid()?;
        self.scan.move_to_rid(rid)?;
        Ok(true)
    }

    fn get_int(&self, field: &str) -> Result<i32> {
        self.scan.get_int(field)
    }

    fn get_string(&self, field: &str) -> Result<String> {
        self.scan.get_string(field)
    }

    fn get_val(&self, field: &str) -> Result<Constant> {
        self.scan.get_val(field)
    }

    fn has_field(&self, field: &str) -> bool {
        self.scan.has_field(field)
    }

    fn close(&mut self) {
        self.index.close();
        self.scan.close();
    }
}
