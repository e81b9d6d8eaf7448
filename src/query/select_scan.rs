use super::{Constant, Predicate, Scan, UpdateScan};
use crate::common::{RecordId, Result};

/// Yields the records of the underlying scan that satisfy a predicate.
/// Updatable when the underlying scan is.
pub struct SelectScan {
    scan: Box<dyn Scan>,
    pred: Predicate,
}

impl SelectScan {
    pub fn new(scan: Box<dyn Scan>, pred: Predicate) -> Self {
        Self { scan, pred }
    }

    fn inner(&mut self) -> Result<&mut dyn UpdateScan> {
        self.scan.as_update_scan()
    }
}

impl Scan for SelectScan {
    fn before_first(&mut self) -> Result<()> {
        self.scan.before_first()
    }

    fn next(&mut self) -> Result<bool> {
        while self.scan.next()? {
            if self.pred.is_satisfied(self.scan.as_ref())? {
                return Ok(true);
            }
        }
        Ok(false)
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
        self.scan.close();
    }

    fn as_update_scan(&mut self) -> Result<&mut dyn UpdateScan> {
        self.inner()?;
        Ok(self)
    }

    fn as_update_scan_ref(&self) -> Result<&dyn UpdateScan> {
        self.scan.as_update_scan_ref()?;
        Ok(self)
    }
}

impl UpdateScan for SelectScan {
    fn set_int(&mut self, field: &str, value: i32) -> Result<()> {
        self.inner()?.set_int(field, value)
    }

    fn set_string(&mut self, field: &str, value: &str) -> Result<()> {
        self.inner()?.set_string(field, value)
    }

    fn set_val(&mut self, field: &str, value: &Constant) -> Result<()> {
        self.inner()?.set_val(field, value)
    }

    fn insert(&mut self) -> Result<()> {
        self.inner()?.insert()
    }

    fn delete(&mut self) -> Result<()> {
        self.inner()?.delete()
    }

    fn rid(&self) -> Result<RecordId> {
        self.scan.as_update_scan_ref()?.rid()
    }

    fn move_to_rid(&mut self, rid: RecordId) -> Result<()> {
        self.inner()?.move_to_rid(rid)
    }
}
