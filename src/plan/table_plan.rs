use std::sync::Arc;

use super::Plan;
use crate::common::Result;
use crate::metadata::{MetadataManager, StatInfo};
use crate::query::Scan;
use crate::record::{Layout, Schema, TableScan};
use crate::tx::Transaction;

/// Leaf plan over a stored table; estimates come from the catalog
/// statistics.
pub struct TablePlan {
    tx: Arc<Transaction>,
    table: String,
    layout: Arc<Layout>,
    stat_info: StatInfo,
}

impl TablePlan {
    pub fn new(tx: Arc<Transaction>, table: &str, metadata: &MetadataManager) -> Result<Self> {
        let layout = Arc::new(metadata.get_layout(table, &tx)?);
        let stat_info = metadata.get_stat_info(table, &layout, &tx)?;
        Ok(Self {
            tx,
            table: table.to_string(),
            layout,
            stat_info,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    /// Opens the concrete scan, for callers that need record ids.
    pub fn open_table_scan(&self) -> Result<TableScan> {
        TableScan::new(Arc::clone(&self.tx), &self.table, Arc::clone(&self.layout))
    }
}

impl Plan for TablePlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        Ok(Box::new(self.open_table_scan()?))
    }

    fn est_num_blocks(&self) -> usize {
        self.stat_info.blocks_accessed()
    }

    fn est_num_records(&self) -> usize {
        self.stat_info.records_output()
    }

    fn est_distinct_vals(&self, field: &str) -> usize {
        self.stat_info.distinct_values(field)
    }

    fn schema(&self) -> &Schema {
        self.layout.schema()
    }
}
