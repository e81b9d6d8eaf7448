//! Embedded SQL driver: connections, prepared statements and result rows.
//!
//! ```no_run
//! use simpledb::driver::Driver;
//!
//! let mut conn = Driver::open("/tmp/studentdb")?;
//! conn.exec("create table t (a int, b varchar(9))")?;
//! conn.exec("insert into t (a, b) values (1, 'one')")?;
//! let mut rows = conn.query("select b from t where a = 1")?;
//! while let Some(row) = rows.next()? {
//!     println!("{}", row[0]);
//! }
//! # Ok::<(), simpledb::DbError>(())
//! ```

mod connection;
mod rows;

pub use connection::*;
pub use rows::*;

use std::sync::Arc;

use crate::common::{DbConfig, Result};
use crate::database::Database;
use crate::query::Constant;

/// A field value of a result row.
pub type Value = Constant;

/// Entry point that opens connections to a database directory.
pub struct Driver;

impl Driver {
    /// Opens the database at `dsn`, a directory path. An empty `dsn` uses
    /// `SIMPLEDB_PATH` or the default location.
    pub fn open(dsn: &str) -> Result<Connection> {
        let config = if dsn.is_empty() {
            DbConfig::from_env()
        } else {
            DbConfig::new(dsn)
        };
        Self::open_with_config(config)
    }

    pub fn open_with_config(config: DbConfig) -> Result<Connection> {
        Ok(Connection::new(Arc::new(Database::open(config)?)))
    }
}
