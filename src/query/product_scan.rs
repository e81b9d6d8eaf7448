use super::{Constant, Scan};
use crate::common::Result;

/// Every combination of a record from the left scan with a record from the
/// right scan, left-major.
pub struct ProductScan {
    lhs: Box<dyn Scan>,
    rhs: Box<dyn Scan>,
    /// Whether `lhs` is positioned on a record
    lhs_valid: bool,
}

impl ProductScan {
    pub fn new(lhs: Box<dyn Scan>, rhs: Box<dyn Scan>) -> Result<Self> {
        let mut scan = Self {
            lhs,
            rhs,
            lhs_valid: false,
        };
        scan.before_first()?;
        Ok(scan)
    }
}

impl Scan for ProductScan {
    fn before_first(&mut self) -> Result<()> {
        self.lhs.before_first()?;
        self.lhs_valid = self.lhs.next()?;
        self.rhs.before_first()
    }

    fn next(&mut self) -> Result<bool> {
        if !self.lhs_valid {
            return Ok(false);
        }
        if self.rhs.next()? {
            return Ok(true);
        }
        self.rhs.before_first()?;
        self.lhs_valid = self.lhs.next()?;
        Ok(self.lhs_valid && self.rhs.next()?)
    }

    fn get_int(&self, field: &str) -> Result<i32> {
        if self.lhs.has_field(field) {
            self.lhs.get_int(field)
        } else {
            self.rhs.get_int(field)
        }
    }

    fn get_string(&self, field: &str) -> Result<String> {
        if self.lhs.has_field(field) {
            self.lhs.get_string(field)
        } else {
            self.rhs.get_string(field)
        }
    }

    fn get_val(&self, field: &str) -> Result<Constant> {
        if self.lhs.has_field(field) {
            self.lhs.get_val(field)
        } else {
            self.rhs.get_val(field)
        }
    }

    fn has_field(&self, field: &str) -> bool {
        self.lhs.has_field(field) || self.rhs.has_field(field)
    }

    fn close(&mut self) {
        self.lhs.close();
        self.rhs.close();
    }
}
