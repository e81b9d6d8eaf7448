use std::sync::Arc;

use tracing::warn;

use super::Rows;
use crate::common::{DbError, Result};
use crate::database::Database;
use crate::tx::Transaction;

/// A session on a database. Statements run in the transaction opened with
/// `begin`, or each in its own transaction when none is open.
///
/// A lock or buffer timeout rolls the current transaction back before the
/// error is returned; the caller starts over with `begin`.
pub struct Connection {
    db: Arc<Database>,
    tx: Option<Arc<Transaction>>,
}

impl Connection {
    /// Opens a connection sharing `db` with other connections.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db, tx: None }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn in_transaction(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    pub fn begin(&mut self) -> Result<()> {
        if self.in_transaction() {
            return Err(DbError::Config("a transaction is already in progress".into()));
        }
        self.tx = Some(self.db.new_tx()?);
        Ok(())
    }

    pub fn commit(&mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) => tx.commit(),
            None => Err(DbError::Config("no transaction in progress".into())),
        }
    }

    /// Rolls back the open transaction. Succeeds if it was already rolled
    /// back after an abort.
    pub fn rollback(&mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) if !tx.is_closed() => tx.rollback(),
            Some(_) => Ok(()),
            None => Err(DbError::Config("no transaction in progress".into())),
        }
    }

    pub fn prepare(&mut self, sql: &str) -> Statement<'_> {
        Statement {
            conn: self,
            sql: sql.to_string(),
        }
    }

    pub fn exec(&mut self, sql: &str) -> Result<usize> {
        self.prepare(sql).exec()
    }

    pub fn query(&mut self, sql: &str) -> Result<Rows> {
        self.prepare(sql).query()
    }

    /// Rolls back any open transaction and closes the connection.
    pub fn close(mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) if !tx.is_closed() => tx.rollback(),
            _ => Ok(()),
        }
    }

    /// The explicit transaction, or None in auto-commit mode.
    fn current_tx(&mut self) -> Result<Option<Arc<Transaction>>> {
        match &self.tx {
            Some(tx) if tx.is_closed() => {
                let txnum = tx.txnum();
                self.tx = None;
                Err(DbError::TransactionClosed(txnum))
            }
            Some(tx) => Ok(Some(Arc::clone(tx))),
            None => Ok(None),
        }
    }
}

/// Rolls `tx` back after a failed statement, keeping the statement's error.
fn abort(tx: &Transaction, err: DbError) -> DbError {
    if !tx.is_closed() {
        if let Err(e) = tx.rollback() {
            warn!(txnum = tx.txnum(), error = %e, "rollback after failed statement failed");
        }
    }
    err
}

/// A statement bound to a connection. The SQL subset has no parameter
/// placeholders, so execution takes no arguments.
pub struct Statement<'c> {
    conn: &'c mut Connection,
    sql: String,
}

impl Statement<'_> {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Runs a modifying statement and returns the affected-record count.
    pub fn exec(self) -> Result<usize> {
        let db = Arc::clone(&self.conn.db);
        match self.conn.current_tx()? {
            Some(tx) => db.exec(&self.sql, &tx).map_err(|e| {
                if e.is_abort() {
                    self.conn.tx = None;
                    abort(&tx, e)
                } else {
                    e
                }
            }),
            None => {
                let tx = db.new_tx()?;
                match db.exec(&self.sql, &tx) {
                    Ok(count) => {
                        tx.commit()?;
                        Ok(count)
                    }
                    Err(e) => Err(abort(&tx, e)),
                }
            }
        }
    }

    /// Runs a `SELECT` and returns its rows. In auto-commit mode the
    /// statement's transaction commits when the rows are exhausted or closed.
    pub fn query(self) -> Result<Rows> {
        let db = Arc::clone(&self.conn.db);
        let (tx, auto_commit) = match self.conn.current_tx()? {
            Some(tx) => (tx, false),
            None => (db.new_tx()?, true),
        };
        let opened = db.query(&self.sql, &tx).and_then(|plan| {
            let columns = plan.schema().fields().to_vec();
            Ok((plan.open()?, columns))
        });
        match opened {
            Ok((scan, columns)) => Ok(Rows::new(scan, columns, tx, auto_commit)),
            Err(e) if auto_commit || e.is_abort() => {
                if !auto_commit {
                    self.conn.tx = None;
                }
                Err(abort(&tx, e))
            }
            Err(e) => Err(e),
        }
    }
}
