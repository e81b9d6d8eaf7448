//! Secondary indexes over table records.
//!
//! An index maps a search key to the [`RecordId`]s of the records holding
//! that key. Implementations are opened through an [`IndexFactory`] chosen
//! when the database is built.

mod dummy_index;
mod hash_index;
mod index_select_plan;
mod index_select_scan;

pub use dummy_index::*;
pub use hash_index::*;
pub use index_select_plan::*;
pub use index_select_scan::*;

use std::sync::Arc;

use crate::common::{IndexKind, RecordId, Result};
use crate::query::Constant;
use crate::record::Layout;
use crate::tx::Transaction;

/// Cursor over the index entries matching one search key.
pub trait Index {
    /// Positions the index before the first entry with key `key`.
    fn before_first(&mut self, key: &Constant) -> Result<()>;

    /// Moves to the next entry with the current search key.
    fn next(&mut self) -> Result<bool>;

    /// Record id stored in the current entry.
    fn data_rid(&self) -> Result<RecordId>;

    fn insert(&mut self, key: &Constant, rid: RecordId) -> Result<()>;

    fn delete(&mut self, key: &Constant, rid: RecordId) -> Result<()>;

    fn close(&mut self);
}

/// Estimates the blocks read by one index lookup.
pub trait SearchCostCalculator {
    fn search_cost(&self, num_blocks: usize, records_per_block: usize) -> usize;
}

/// Opens indexes of one kind.
pub trait IndexFactory: SearchCostCalculator + Send + Sync {
    fn open(&self, tx: Arc<Transaction>, index_name: &str, layout: Arc<Layout>) -> Box<dyn Index>;

    /// Whether lookups through this index can replace a table scan.
    fn searchable(&self) -> bool {
        true
    }
}

/// The factory for `kind`.
pub fn index_factory(kind: IndexKind) -> Arc<dyn IndexFactory> {
    match kind {
        IndexKind::Hash => Arc::new(HashIndexFactory),
        IndexKind::Dummy => Arc::new(DummyIndexFactory),
    }
}
