use super::Constant;
use crate::common::{DbError, RecordId, Result};

/// A cursor over the records of a table or of a derived relation.
///
/// `next` advances to the following record and reports whether one exists;
/// all I/O happens there. Field accessors read from the current record.
pub trait Scan {
    /// Positions the scan before the first record.
    fn before_first(&mut self) -> Result<()>;

    /// Moves to the next record.
    fn next(&mut self) -> Result<bool>;

    fn get_int(&self, field: &str) -> Result<i32>;

    fn get_string(&self, field: &str) -> Result<String>;

    fn get_val(&self, field: &str) -> Result<Constant>;

    fn has_field(&self, field: &str) -> bool;

    /// Releases the pinned blocks held by the scan.
    fn close(&mut self);

    /// Returns the scan as updatable, or `DbError::NotUpdatable`.
    fn as_update_scan(&mut self) -> Result<&mut dyn UpdateScan> {
        Err(not_updatable())
    }

    /// Shared-access counterpart of `as_update_scan`.
    fn as_update_scan_ref(&self) -> Result<&dyn UpdateScan> {
        Err(not_updatable())
    }
}

fn not_updatable() -> DbError {
    DbError::NotUpdatable("scan does not map records to a single table".into())
}

/// A scan whose current record can be modified.
pub trait UpdateScan: Scan {
    fn set_int(&mut self, field: &str, value: i32) -> Result<()>;

    fn set_string(&mut self, field: &str, value: &str) -> Result<()>;

    fn set_val(&mut self, field: &str, value: &Constant) -> Result<()>;

    /// Inserts an empty record and makes it current.
    fn insert(&mut self) -> Result<()>;

    /// Deletes the current record.
    fn delete(&mut self) -> Result<()>;

    fn rid(&self) -> Result<RecordId>;

    fn move_to_rid(&mut self, rid: RecordId) -> Result<()>;
}
