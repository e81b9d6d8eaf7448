use super::IndexSelectScan;
use crate::common::Result;
use crate::metadata::IndexInfo;
use crate::plan::{Plan, TablePlan};
use crate::query::{Constant, Scan};
use crate::record::Schema;

/// Selection of `field = value` on a stored table, answered by an index.
pub struct IndexSelectPlan {
    plan: TablePlan,
    info: IndexInfo,
    value: Constant,
}

impl IndexSelectPlan {
    pub fn new(plan: TablePlan, info: IndexInfo, value: Constant) -> Self {
        Self { plan, info, value }
    }
}

impl Plan for IndexSelectPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        let scan = self.plan.open_table_scan()?;
        let index = self.info.open();
        Ok(Box::new(IndexSelectScan::new(scan, index, self.value.clone())?))
    }

    fn est_num_blocks(&self) -> usize {
        self.info.blocks_accessed() + self.est_num_records()
    }

    fn est_num_records(&self) -> usize {
        self.info.records_output()
    }

    fn est_distinct_vals(&self, field: &str) -> usize {
        self.info.distinct_values(field)
    }

    fn schema(&self) -> &Schema {
        self.plan.schema()
    }
}
