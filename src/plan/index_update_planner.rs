use std::sync::Arc;

use tracing::debug;

use super::{Plan, SelectPlan, TablePlan, UpdatePlanner};
use crate::common::Result;
use crate::index::Index;
use crate::metadata::{IndexInfo, MetadataManager};
use crate::parse::{
    CreateIndexData, CreateTableData, CreateViewData, DeleteData, InsertData, ModifyData,
};
use crate::query::{Scan, UpdateScan};
use crate::tx::Transaction;

/// Update planner that keeps every index of the modified table in step
/// with its records.
pub struct IndexUpdatePlanner {
    metadata: Arc<MetadataManager>,
}

impl IndexUpdatePlanner {
    pub fn new(metadata: Arc<MetadataManager>) -> Self {
        Self { metadata }
    }

    /// Opens every index of `table`, keyed by indexed field.
    fn open_indexes(&self, table: &str, tx: &Arc<Transaction>) -> Result<Vec<(String, Box<dyn Index>)>> {
        let mut indexes: Vec<_> = self
            .metadata
            .get_index_info(table, tx)?
            .into_iter()
            .map(|(field, info)| (field, info.open()))
            .collect();
        indexes.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(indexes)
    }
}

fn close_all(indexes: &mut [(String, Box<dyn Index>)]) {
    for (_, index) in indexes {
        index.close();
    }
}

impl UpdatePlanner for IndexUpdatePlanner {
    fn execute_insert(&self, data: &InsertData, tx: &Arc<Transaction>) -> Result<usize> {
        let plan = TablePlan::new(Arc::clone(tx), &data.table, &self.metadata)?;
        let mut scan = plan.open_table_scan()?;
        scan.insert()?;
        let rid = scan.rid()?;

        let mut indexes = self.open_indexes(&data.table, tx)?;
        for (field, value) in data.fields.iter().zip(&data.values) {
            scan.set_val(field, value)?;
            if let Some((_, index)) = indexes.iter_mut().find(|(f, _)| f == field) {
                index.insert(value, rid)?;
            }
        }
        close_all(&mut indexes);
        scan.close();
        Ok(1)
    }

    fn execute_delete(&self, data: &DeleteData, tx: &Arc<Transaction>) -> Result<usize> {
        let table = TablePlan::new(Arc::clone(tx), &data.table, &self.metadata)?;
        let plan = SelectPlan::new(Box::new(table), data.pred.clone());
        let mut scan = plan.open()?;
        let mut indexes = self.open_indexes(&data.table, tx)?;
        let mut count = 0;
        while scan.next()? {
            let rid = scan.as_update_scan_ref()?.rid()?;
            for (field, index) in indexes.iter_mut() {
                let value = scan.get_val(field)?;
                index.delete(&value, rid)?;
            }
            scan.as_update_scan()?.delete()?;
            count += 1;
        }
        close_all(&mut indexes);
        scan.close();
        Ok(count)
    }

    fn execute_modify(&self, data: &ModifyData, tx: &Arc<Transaction>) -> Result<usize> {
        let table = TablePlan::new(Arc::clone(tx), &data.table, &self.metadata)?;
        let plan = SelectPlan::new(Box::new(table), data.pred.clone());
        let mut scan = plan.open()?;
        let mut index = self
            .metadata
            .get_index_info(&data.table, tx)?
            .get(&data.field)
            .map(|info| info.open());
        let mut count = 0;
        while scan.next()? {
            let new_value = data.new_value.evaluate(scan.as_ref())?;
            let old_value = scan.get_val(&data.field)?;
            let rid = scan.as_update_scan_ref()?.rid()?;
            scan.as_update_scan()?.set_val(&data.field, &new_value)?;
            if let Some(index) = index.as_mut() {
                index.delete(&old_value, rid)?;
                index.insert(&new_value, rid)?;
            }
            count += 1;
        }
        if let Some(index) = index.as_mut() {
            index.close();
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

    /// Registers the index and loads it with the table's existing records.
    fn execute_create_index(&self, data: &CreateIndexData, tx: &Arc<Transaction>) -> Result<usize> {
        self.metadata
            .create_index(&data.index, &data.table, &data.field, tx)?;
        let plan = TablePlan::new(Arc::clone(tx), &data.table, &self.metadata)?;
        let stat_info = self
            .metadata
            .get_stat_info(&data.table, plan.layout(), tx)?;
        let info = IndexInfo::new(
            &data.index,
            &data.field,
            plan.schema(),
            Arc::clone(tx),
            stat_info,
            Arc::clone(self.metadata.index_factory()),
        )?;

        let mut scan = plan.open_table_scan()?;
        let mut index = info.open();
        let mut loaded = 0;
        while scan.next()? {
            index.insert(&scan.get_val(&data.field)?, scan.rid()?)?;
            loaded += 1;
        }
        index.close();
        scan.close();
        debug!(index = %data.index, loaded, "populated index");
        Ok(0)
    }
}
