//! SimpleDB - a block-oriented relational storage engine in Rust
//!
//! Data lives in fixed-size blocks of per-table files. Every change is
//! recorded in a write-ahead undo log, transactions use strict two-phase
//! locking at block granularity, and a small SQL subset is planned into
//! lazy scans.
//!
//! # Architecture
//!
//! The system is organized into layers, each built on the ones above it:
//!
//! - **Storage** (`storage`): block I/O
//!   - `FileManager`: reads, writes and extends blocks of database files
//!   - `Page`: big-endian codec for ints, byte arrays and strings
//!
//! - **Log** (`log`): the write-ahead log
//!   - `LogManager`: appends records and forces them to disk by LSN
//!   - `LogIterator`: walks records newest first
//!
//! - **Buffer Pool** (`buffer`): caching of blocks in memory
//!   - `BufferPoolManager`: pins blocks into frames, waits when full
//!   - `NaiveReplacer` / `LruKReplacer`: victim selection
//!
//! - **Transactions** (`tx`): locking, undo logging, rollback and recovery
//!
//! - **Records** (`record`): schemas, slotted record pages, table scans
//!
//! - **Query** (`query`, `plan`, `parse`): scans, predicates, plans with
//!   cost estimates, and the SQL parser
//!
//! - **Catalog** (`metadata`, `index`): table, view, index and statistics
//!   catalogs, and static hash indexes
//!
//! - **Front end** (`database`, `driver`): the `Database` value owning every
//!   manager, and a connection-oriented driver
//!
//! # Example
//!
//! ```rust,no_run
//! use simpledb::{Database, DbConfig};
//!
//! let db = Database::open(DbConfig::new("/tmp/demo").with_num_buffers(8))?;
//! let tx = db.new_tx()?;
//! db.exec("create table t (a int, b varchar(9))", &tx)?;
//! let affected = db.exec("insert into t (a, b) values (1, 'one')", &tx)?;
//! assert_eq!(affected, 1);
//! tx.commit()?;
//! # Ok::<(), simpledb::DbError>(())
//! ```

pub mod buffer;
pub mod common;
pub mod database;
pub mod driver;
pub mod index;
pub mod log;
pub mod metadata;
pub mod parse;
pub mod plan;
pub mod query;
pub mod record;
pub mod storage;
pub mod tx;

// Re-export commonly used types at the crate root
pub use common::{BlockId, DbConfig, DbError, ErrorKind, RecordId, Result};
pub use database::Database;
