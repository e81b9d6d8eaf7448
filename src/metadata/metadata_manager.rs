use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::{IndexInfo, IndexManager, StatInfo, StatManager, TableManager, ViewManager};
use crate::common::Result;
use crate::index::IndexFactory;
use crate::record::{Layout, Schema};
use crate::tx::Transaction;

/// Single entry point to the table, view, index and statistics catalogs.
pub struct MetadataManager {
    table_manager: Arc<TableManager>,
    view_manager: ViewManager,
    stat_manager: Arc<StatManager>,
    index_manager: IndexManager,
    index_factory: Arc<dyn IndexFactory>,
}

impl MetadataManager {
    /// Opens the catalogs, creating them inside `tx` on a fresh database.
    pub fn new(tx: &Arc<Transaction>, index_factory: Arc<dyn IndexFactory>) -> Result<Self> {
        let table_manager = Arc::new(TableManager::new(tx)?);
        let view_manager = ViewManager::new(Arc::clone(&table_manager), tx)?;
        let stat_manager = Arc::new(StatManager::new());
        let index_manager = IndexManager::new(
            Arc::clone(&table_manager),
            Arc::clone(&stat_manager),
            Arc::clone(&index_factory),
            tx,
        )?;
        Ok(Self {
            table_manager,
            view_manager,
            stat_manager,
            index_manager,
            index_factory,
        })
    }

    pub fn create_table(&self, table: &str, schema: &Schema, tx: &Arc<Transaction>) -> Result<()> {
        self.table_manager.create_table(table, schema, tx)?;
        self.stat_manager.invalidate(table);
        debug!(table, "created table");
        Ok(())
    }

    pub fn table_exists(&self, table: &str, tx: &Arc<Transaction>) -> Result<bool> {
        self.table_manager.exists(table, tx)
    }

    pub fn get_layout(&self, table: &str, tx: &Arc<Transaction>) -> Result<Layout> {
        self.table_manager.get_layout(table, tx)
    }

    pub fn create_view(&self, view: &str, definition: &str, tx: &Arc<Transaction>) -> Result<()> {
        self.view_manager.create_view(view, definition, tx)?;
        self.stat_manager.invalidate(view);
        debug!(view, "created view");
        Ok(())
    }

    pub fn get_view_def(&self, view: &str, tx: &Arc<Transaction>) -> Result<Option<String>> {
        self.view_manager.get_view_def(view, tx)
    }

    pub fn create_index(&self, index: &str, table: &str, field: &str, tx: &Arc<Transaction>) -> Result<()> {
        self.index_manager.create_index(index, table, field, tx)?;
        self.stat_manager.invalidate(table);
        debug!(index, table, field, "created index");
        Ok(())
    }

    pub fn get_index_info(&self, table: &str, tx: &Arc<Transaction>) -> Result<HashMap<String, IndexInfo>> {
        self.index_manager.get_index_info(table, tx)
    }

    pub fn get_stat_info(&self, table: &str, layout: &Arc<Layout>, tx: &Arc<Transaction>) -> Result<StatInfo> {
        self.stat_manager.get_stat_info(table, layout, tx)
    }

    pub fn index_factory(&self) -> &Arc<dyn IndexFactory> {
        &self.index_factory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{DbConfig, DbError};
    use crate::database::Database;
    use crate::metadata::{INDEX_CATALOG, MAX_NAME};
    use crate::record::FieldType;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> Database {
        Database::open(DbConfig::new(dir.path()).with_block_size(400).with_num_buffers(8)).unwrap()
    }

    #[test]
    fn test_table_layout_round_trip() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        let tx = db.new_tx().unwrap();
        let mut schema = Schema::new();
        schema.add_int_field("a");
        schema.add_string_field("b", 9);
        db.metadata().create_table("mytable", &schema, &tx).unwrap();

        let layout = db.metadata().get_layout("mytable", &tx).unwrap();
        assert_eq!(layout.slot_size(), 4 + 4 + 13);
        assert_eq!(layout.offset("a"), Some(4));
        assert_eq!(layout.offset("b"), Some(8));
        assert_eq!(layout.schema().field_type("b"), Some(FieldType::Varchar));
        assert_eq!(layout.schema().length("b"), Some(9));
        tx.commit().unwrap();
    }

    #[test]
    fn test_catalog_validation() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        let tx = db.new_tx().unwrap();
        let mut schema = Schema::new();
        schema.add_int_field("a");
        db.metadata().create_table("t", &schema, &tx).unwrap();

        let dup = db.metadata().create_table("t", &schema, &tx).unwrap_err();
        assert!(matches!(dup, DbError::TableAlreadyExists(_)));
        let long = db
            .metadata()
            .create_table("a_really_long_table_name", &schema, &tx)
            .unwrap_err();
        assert!(matches!(long, DbError::Config(_)));
        let missing = db.metadata().get_layout("nope", &tx).unwrap_err();
        assert!(matches!(missing, DbError::TableNotFound(_)));

        let long_def = format!("select a from t where a = {}", "1".repeat(100));
        assert!(db.metadata().create_view("v", &long_def, &tx).is_err());
        tx.commit().unwrap();
    }

    #[test]
    fn test_views_and_indexes() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        let tx = db.new_tx().unwrap();
        let mut schema = Schema::new();
        schema.add_int_field("a");
        schema.add_string_field("b", 9);
        db.metadata().create_table("t", &schema, &tx).unwrap();

        db.metadata().create_view("v", "select b from t", &tx).unwrap();
        assert_eq!(
            db.metadata().get_view_def("v", &tx).unwrap().as_deref(),
            Some("select b from t")
        );
        assert_eq!(db.metadata().get_view_def("w", &tx).unwrap(), None);

        db.metadata().create_index("tidx", "t", "b", &tx).unwrap();
        let indexes = db.metadata().get_index_info("t", &tx).unwrap();
        let info = indexes.get("b").unwrap();
        assert_eq!(info.index_name(), "tidx");
        assert_eq!(info.distinct_values("b"), 1);
        assert_eq!(info.layout().schema().length("dataval"), Some(9));
        assert!(db.metadata().create_index("bad", "t", "zzz", &tx).is_err());
        tx.commit().unwrap();
    }

    #[test]
    fn test_catalog_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let db = open(&dir);
            let tx = db.new_tx().unwrap();
            let mut schema = Schema::new();
            schema.add_int_field("a");
            db.metadata().create_table("kept", &schema, &tx).unwrap();
            tx.commit().unwrap();
        }
        let db = open(&dir);
        let tx = db.new_tx().unwrap();
        assert!(db.metadata().table_exists("kept", &tx).unwrap());
        tx.commit().unwrap();
    }

    #[test]
    fn test_oversized_records_are_rejected() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        let tx = db.new_tx().unwrap();

        let mut big = Schema::new();
        big.add_string_field("b", 500);
        let err = db.metadata().create_table("big", &big, &tx).unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
        assert!(!db.metadata().table_exists("big", &tx).unwrap());

        // fits in a block, but the index record adds two ints
        let mut wide = Schema::new();
        wide.add_string_field("b", 388);
        db.metadata().create_table("wide", &wide, &tx).unwrap();
        let err = db.metadata().create_index("widx", "wide", "b", &tx).unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
        assert!(db.metadata().get_index_info("wide", &tx).unwrap().is_empty());
        tx.commit().unwrap();
    }

    #[test]
    fn test_index_catalog_fields() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        let tx = db.new_tx().unwrap();
        let layout = db.metadata().get_layout(INDEX_CATALOG, &tx).unwrap();
        assert_eq!(layout.schema().fields(), ["idxname", "tblname", "fldname"]);
        for field in layout.schema().fields() {
            assert_eq!(layout.schema().length(field), Some(MAX_NAME));
        }
        tx.commit().unwrap();
    }
}
