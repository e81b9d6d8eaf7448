use std::sync::Arc;

use tracing::warn;

use super::Value;
use crate::common::{DbError, Result};
use crate::query::Scan;
use crate::tx::Transaction;

/// The result of a query, read one row at a time.
pub struct Rows {
    scan: Option<Box<dyn Scan>>,
    columns: Vec<String>,
    tx: Arc<Transaction>,
    auto_commit: bool,
}

impl Rows {
    pub(crate) fn new(
        scan: Box<dyn Scan>,
        columns: Vec<String>,
        tx: Arc<Transaction>,
        auto_commit: bool,
    ) -> Self {
        Self {
            scan: Some(scan),
            columns,
            tx,
            auto_commit,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The next row, in column order, or None once the result is exhausted.
    pub fn next(&mut self) -> Result<Option<Vec<Value>>> {
        let row = match self.scan.as_mut() {
            None => return Ok(None),
            Some(scan) => match scan.next() {
                Ok(true) => self
                    .columns
                    .iter()
                    .map(|column| scan.get_val(column))
                    .collect::<Result<Vec<_>>>()
                    .map(Some),
                Ok(false) => Ok(None),
                Err(e) => Err(e),
            },
        };
        match row {
            Ok(Some(values)) => Ok(Some(values)),
            Ok(None) => {
                self.close()?;
                Ok(None)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Releases the scan; in auto-commit mode also commits.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut scan) = self.scan.take() {
            scan.close();
            if self.auto_commit {
                self.tx.commit()?;
            }
        }
        Ok(())
    }

    fn fail(&mut self, err: DbError) -> DbError {
        if let Some(mut scan) = self.scan.take() {
            scan.close();
        }
        if (self.auto_commit || err.is_abort()) && !self.tx.is_closed() {
            if let Err(e) = self.tx.rollback() {
                warn!(txnum = self.tx.txnum(), error = %e, "rollback after failed read failed");
            }
        }
        err
    }
}

impl Drop for Rows {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "closing rows failed");
        }
    }
}
