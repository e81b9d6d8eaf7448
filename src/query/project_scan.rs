use super::{Constant, Scan};
use crate::common::{DbError, Result};

/// Restricts the underlying scan to a list of fields. Not updatable.
pub struct ProjectScan {
    scan: Box<dyn Scan>,
    fields: Vec<String>,
}

impl ProjectScan {
    pub fn new(scan: Box<dyn Scan>, fields: Vec<String>) -> Self {
        Self { scan, fields }
    }

    fn check(&self, field: &str) -> Result<()> {
        if self.has_field(field) {
            Ok(())
        } else {
            Err(DbError::FieldNotFound(field.to_string()))
        }
    }
}

impl Scan for ProjectScan {
    fn before_first(&mut self) -> Result<()> {
        self.scan.before_first()
    }

    fn next(&mut self) -> Result<bool> {
        self.scan.next()
    }

    fn get_int(&self, field: &str) -> Result<i32> {
        self.check(field)?;
        self.scan.get_int(field)
    }

    fn get_string(&self, field: &str) -> Result<String> {
        self.check(field)?;
        self.scan.get_string(field)
    }

    fn get_val(&self, field: &str) -> Result<Constant> {
        self.check(field)?;
        self.scan.get_val(field)
    }

    fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    fn close(&mut self) {
        self.scan.close();
    }
}
