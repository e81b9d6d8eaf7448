use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{check_name, check_slot_size, StatInfo, StatManager, TableManager, MAX_NAME};
use crate::common::{DbError, Result};
use crate::index::{Index, IndexFactory, INDEX_BLOCK_FIELD, INDEX_ID_FIELD, INDEX_VALUE_FIELD};
use crate::query::{Scan, UpdateScan};
use crate::record::{table_file_name, FieldType, Layout, Schema, TableScan};
use crate::tx::Transaction;

pub const INDEX_CATALOG: &str = "idxcat";
pub const INDEX_NAME_FIELD: &str = "idxname";
pub const INDEX_TABLE_FIELD: &str = "tblname";
pub const INDEX_FIELD_FIELD: &str = "fldname";

/// Statistics and access to one index of a table.
#[derive(Clone)]
pub struct IndexInfo {
    index_name: String,
    field_name: String,
    tx: Arc<Transaction>,
    layout: Arc<Layout>,
    stat_info: StatInfo,
    factory: Arc<dyn IndexFactory>,
}

impl IndexInfo {
    pub fn new(
        index_name: &str,
        field_name: &str,
        table_schema: &Schema,
        tx: Arc<Transaction>,
        stat_info: StatInfo,
        factory: Arc<dyn IndexFactory>,
    ) -> Result<Self> {
        Ok(Self {
            index_name: index_name.to_string(),
            field_name: field_name.to_string(),
            tx,
            layout: Arc::new(index_layout(table_schema, field_name)?),
            stat_info,
            factory,
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Layout of the index entries: `(block, id, dataval)`.
    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    pub fn open(&self) -> Box<dyn Index> {
        self.factory
            .open(Arc::clone(&self.tx), &self.index_name, Arc::clone(&self.layout))
    }

    /// Whether the planner may answer lookups through this index.
    pub fn searchable(&self) -> bool {
        self.factory.searchable()
    }

    /// Estimated blocks read by one lookup.
    pub fn blocks_accessed(&self) -> usize {
        let records_per_block = (self.tx.block_size() / self.layout.slot_size()).max(1);
        let num_blocks = self.stat_info.records_output() / records_per_block;
        self.factory.search_cost(num_blocks, records_per_block)
    }

    /// Estimated records matching one key.
    pub fn records_output(&self) -> usize {
        self.stat_info.records_output() / self.stat_info.distinct_values(&self.field_name)
    }

    pub fn distinct_values(&self, field: &str) -> usize {
        if field == self.field_name {
            1
        } else {
            self.stat_info.distinct_values(field)
        }
    }
}

impl fmt::Debug for IndexInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexInfo")
            .field("index_name", &self.index_name)
            .field("field_name", &self.field_name)
            .field("stat_info", &self.stat_info)
            .finish()
    }
}

fn index_layout(table_schema: &Schema, field: &str) -> Result<Layout> {
    let info = table_schema
        .info(field)
        .ok_or_else(|| DbError::FieldNotFound(field.to_string()))?;
    let mut schema = Schema::new();
    schema.add_int_field(INDEX_BLOCK_FIELD);
    schema.add_int_field(INDEX_ID_FIELD);
    match info.field_type {
        FieldType::Integer => schema.add_int_field(INDEX_VALUE_FIELD),
        FieldType::Varchar => schema.add_string_field(INDEX_VALUE_FIELD, info.length),
    }
    Ok(Layout::new(schema))
}

/// Stores index definitions in `idxcat(idxname, tblname, fldname)`.
pub struct IndexManager {
    layout: Arc<Layout>,
    table_manager: Arc<TableManager>,
    stat_manager: Arc<StatManager>,
    factory: Arc<dyn IndexFactory>,
}

impl IndexManager {
    pub fn new(
        table_manager: Arc<TableManager>,
        stat_manager: Arc<StatManager>,
        factory: Arc<dyn IndexFactory>,
        tx: &Arc<Transaction>,
    ) -> Result<Self> {
        if tx.size(&table_file_name(INDEX_CATALOG))? == 0 {
            let mut schema = Schema::new();
            schema.add_string_field(INDEX_NAME_FIELD, MAX_NAME);
            schema.add_string_field(INDEX_TABLE_FIELD, MAX_NAME);
            schema.add_string_field(INDEX_FIELD_FIELD, MAX_NAME);
            table_manager.create_table(INDEX_CATALOG, &schema, tx)?;
        }
        let layout = Arc::new(table_manager.get_layout(INDEX_CATALOG, tx)?);
        Ok(Self {
            layout,
            table_manager,
            stat_manager,
            factory,
        })
    }

    pub fn create_index(&self, index: &str, table: &str, field: &str, tx: &Arc<Transaction>) -> Result<()> {
        check_name(index)?;
        let table_layout = self.table_manager.get_layout(table, tx)?;
        if !table_layout.schema().has_field(field) {
            return Err(DbError::FieldNotFound(format!("{table}.{field}")));
        }
        check_slot_size(index, &index_layout(table_layout.schema(), field)?, tx.block_size())?;
        if self.index_exists(index, tx)? {
            return Err(DbError::Config(format!("index {index} already exists")));
        }

        let mut scan = TableScan::new(Arc::clone(tx), INDEX_CATALOG, Arc::clone(&self.layout))?;
        scan.insert()?;
        scan.set_string(INDEX_NAME_FIELD, index)?;
        scan.set_string(INDEX_TABLE_FIELD, table)?;
        scan.set_string(INDEX_FIELD_FIELD, field)?;
        scan.close();
        Ok(())
    }

    /// The indexes of `table`, keyed by indexed field.
    pub fn get_index_info(&self, table: &str, tx: &Arc<Transaction>) -> Result<HashMap<String, IndexInfo>> {
        let mut entries = Vec::new();
        let mut scan = TableScan::new(Arc::clone(tx), INDEX_CATALOG, Arc::clone(&self.layout))?;
        while scan.next()? {
            if scan.get_string(INDEX_TABLE_FIELD)? == table {
                entries.push((scan.get_string(INDEX_NAME_FIELD)?, scan.get_string(INDEX_FIELD_FIELD)?));
            }
        }
        scan.close();

        let mut result = HashMap::new();
        if entries.is_empty() {
            return Ok(result);
        }
        let table_layout = Arc::new(self.table_manager.get_layout(table, tx)?);
        let stat_info = self.stat_manager.get_stat_info(table, &table_layout, tx)?;
        for (index_name, field_name) in entries {
            let info = IndexInfo::new(
                &index_name,
                &field_name,
                table_layout.schema(),
                Arc::clone(tx),
                stat_info,
                Arc::clone(&self.factory),
            )?;
            result.insert(field_name, info);
        }
        Ok(result)
    }

    fn index_exists(&self, index: &str, tx: &Arc<Transaction>) -> Result<bool> {
        let mut scan = TableScan::new(Arc::clone(tx), INDEX_CATALOG, Arc::clone(&self.layout))?;
        let mut found = false;
        while scan.next()? {
            if scan.get_string(INDEX_NAME_FIELD)? == index {
                found = true;
                break;
            }
        }
        scan.close();
        Ok(found)
    }
}
