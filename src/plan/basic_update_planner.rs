use std::sync::Arc;

use super::{Plan, SelectPlan, TablePlan};
use crate::common::Result;
use crate::metadata::MetadataManager;
use crate::parse::{
    CreateIndexData, CreateTableData, CreateViewData, DeleteData, InsertData, ModifyData,
};
use crate::query::{Scan, UpdateScan};
use crate::tx::Transaction;

/// Executes modifying statements. Each method returns the number of
/// affected records; `CREATE` statements affect none.
pub trait UpdatePlanner: Send + Sync {
    fn execute_insert(&self, data: &InsertData, tx: &Arc<Transaction>) -> Result<usize>;

    fn execute_delete(&self, data: &DeleteData, tx: &Arc<Transaction>) -> Result<usize>;

    fn execute_modify(&self, data: &ModifyData, tx: &Arc<Transaction>) -> Result<usize>;

    fn execute_create_table(&self, data: &CreateTableData, tx: &Arc<Transaction>) -> Result<usize>;

    fn execute_create_view(&self, data: &CreateViewData, tx: &Arc<Transaction>) -> Result<usize>;

    fn execute_create_index(&self, data: &CreateIndexData, tx: &Arc<Transaction>) -> Result<usize>;
}

/// Update planner that ignores indexes.
pub struct BasicUpdatePlanner {
    metadata: Arc<MetadataManager>,
}

impl BasicUpdatePlanner {
    pub fn new(metadata: Arc<MetadataManager>) -> Self {
        Self { metadata }
    }
}

impl UpdatePlanner for BasicUpdatePlanner {
    fn execute_insert(&self, data: &InsertData, tx: &Arc<Transaction>) -> Result<usize> {
        let plan = TablePlan::new(Arc::clone(tx), &data.table, &self.metadata)?;
        let mut scan = plan.open_table_scan()?;
        scan.insert()?;
        for (field, value) in data.fields.iter().zip(&data.values) {
            scan.set_val(field, value)?;
        }
        scan.close();
        Ok(1)
    }

    fn execute_delete(&self, data: &DeleteData, tx: &Arc<Transaction>) -> Result<usize> {
        let table = TablePlan::new(Arc::clone(tx), &data.table, &self.metadata)?;
        let plan = SelectPlan::new(Box::new(table), data.pred.clone());
        let mut scan = plan.open()?;
        let mut count = 0;
        while scan.next()? {
            scan.as_update_scan()?.delete()?;
            count += 1;
        }
        scan.close();
        Ok(count)
    }

    fn execute_modify(&self, data: &ModifyData, tx: &Arc<Transaction>) -> Result<usize> {
        let table = TablePlan::new(Arc::clone(tx), &data.table, &self.metadata)?;
        let plan = SelectPlan::new(Box::new(table), data.pred.clone());
        let mut scan = plan.open()?;
        let mut count = 0;
        while scan.next()? {
            let value = data.new_value.evaluate(scan.as_ref())?;
            scan.as_update_scan()?.set_val(&data.field, &value)?;
            count += 1;
        }
        scan.close();
        Ok(count)
    }

    fn execute_create_table(&self, data: &CreateTableData, tx: &Arc<Transaction>) -> Result<usize> {
        self.metadata.create_table(&data.table, &data.schema, tx)?;
        Ok(0)
    }

    fn execute_create_view(&self, data: &CreateViewData, tx: &Arc<Transaction>) -> Result<usize> {
        self.metadata.create_view(&data.view, &data.view_def(), tx)?;
        Ok(0)
    }

    fn execute_create_index(&self, data: &CreateIndexData, tx: &Arc<Transaction>) -> Result<usize> {
        self.metadata
            .create_index(&data.index, &data.table, &data.field, tx)?;
        Ok(0)
    }
}
