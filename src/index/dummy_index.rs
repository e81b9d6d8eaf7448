use std::sync::Arc;

use super::{Index, IndexFactory, SearchCostCalculator};
use crate::common::{DbError, RecordId, Result};
use crate::query::Constant;
use crate::record::Layout;
use crate::tx::Transaction;

/// An index that stores nothing. Planners never choose it for lookups.
#[derive(Debug, Default)]
pub struct DummyIndex;

impl Index for DummyIndex {
    fn before_first(&mut self, _key: &Constant) -> Result<()> {
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn data_rid(&self) -> Result<RecordId> {
        Err(DbError::NoCurrentRecord)
    }

    fn insert(&mut self, _key: &Constant, _rid: RecordId) -> Result<()> {
        Ok(())
    }

    fn delete(&mut self, _key: &Constant, _rid: RecordId) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) {}
}

pub struct DummyIndexFactory;

impl SearchCostCalculator for DummyIndexFactory {
    fn search_cost(&self, num_blocks: usize, _records_per_block: usize) -> usize {
        num_blocks
    }
}

impl IndexFactory for DummyIndexFactory {
    fn open(&self, _tx: Arc<Transaction>, _index_name: &str, _layout: Arc<Layout>) -> Box<dyn Index> {
        Box::new(DummyIndex)
    }

    fn searchable(&self) -> bool {
        false
    }
}
