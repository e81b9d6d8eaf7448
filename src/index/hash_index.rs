use std::sync::Arc;

use super::{Index, IndexFactory, SearchCostCalculator};
use crate::common::{DbError, RecordId, Result};
use crate::query::{Constant, Scan, UpdateScan};
use crate::record::{Layout, TableScan};
use crate::tx::Transaction;

/// Number of bucket tables per hash index.
pub const NUM_BUCKETS: u32 = 100;

pub const INDEX_BLOCK_FIELD: &str = "block";
pub const INDEX_ID_FIELD: &str = "id";
pub const INDEX_VALUE_FIELD: &str = "dataval";

/// Static hash index. Entries with key `k` live in the bucket table
/// `{index}{k.hash_code() % NUM_BUCKETS}`.
pub struct HashIndex {
    tx: Arc<Transaction>,
    name: String,
    layout: Arc<Layout>,
    search_key: Option<Constant>,
    scan: Option<TableScan>,
}

impl HashIndex {
    pub fn new(tx: Arc<Transaction>, name: &str, layout: Arc<Layout>) -> Self {
        Self {
            tx,
            name: name.to_string(),
            layout,
            search_key: None,
            scan: None,
        }
    }

    /// Table holding the entries for `key`.
    pub fn bucket_table(&self, key: &Constant) -> String {
        format!("{}{}", self.name, key.hash_code() % NUM_BUCKETS)
    }

    fn scan(&mut self) -> Result<&mut TableScan> {
        self.scan.as_mut().ok_or(DbError::ScanClosed)
    }
}

impl Index for HashIndex {
    fn before_first(&mut self, key: &Constant) -> Result<()> {
        self.close();
        let table = self.bucket_table(key);
        self.scan = Some(TableScan::new(
            Arc::clone(&self.tx),
            &table,
            Arc::clone(&self.layout),
        )?);
        self.search_key = Some(key.clone());
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        let key = self.search_key.clone().ok_or(DbError::NoCurrentRecord)?;
        let scan = self.scan()?;
        while scan.next()? {
            if scan.get_val(INDEX_VALUE_FIELD)? == key {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn data_rid(&self) -> Result<RecordId> {
        let scan = self.scan.as_ref().ok_or(DbError::ScanClosed)?;
        let block = scan.get_int(INDEX_BLOCK_FIELD)?;
        let id = scan.get_int(INDEX_ID_FIELD)?;
        Ok(RecordId::new(block, id as usize))
    }

    fn insert(&mut self, key: &Constant, rid: RecordId) -> Result<()> {
        self.before_first(key)?;
        let scan = self.scan()?;
        scan.insert()?;
        scan.set_int(INDEX_BLOCK_FIELD, rid.block_number)?;
        scan.set_int(INDEX_ID_FIELD, rid.slot as i32)?;
        scan.set_val(INDEX_VALUE_FIELD, key)
    }

    fn delete(&mut self, key: &Constant, rid: RecordId) -> Result<()> {
        self.before_first(key)?;
        while self.next()? {
            if self.data_rid()? == rid {
                return self.scan()?.delete();
            }
        }
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut scan) = self.scan.take() {
            scan.close();
        }
    }
}

impl Drop for HashIndex {
    fn drop(&mut self) {
        self.close();
    }
}

pub struct HashIndexFactory;

impl SearchCostCalculator for HashIndexFactory {
    fn search_cost(&self, num_blocks: usize, _records_per_block: usize) -> usize {
        num_blocks / NUM_BUCKETS as usize
    }
}

impl IndexFactory for HashIndexFactory {
    fn open(&self, tx: Arc<Transaction>, index_name: &str, layout: Arc<Layout>) -> Box<dyn Index> {
        Box::new(HashIndex::new(tx, index_name, layout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::common::DbConfig;
    use crate::record::Schema;
    use tempfile::TempDir;

    fn index_layout() -> Arc<Layout> {
        let mut schema = Schema::new();
        schema.add_int_field(INDEX_BLOCK_FIELD);
        schema.add_int_field(INDEX_ID_FIELD);
        schema.add_string_field(INDEX_VALUE_FIELD, 10);
        Arc::new(Layout::new(schema))
    }

    #[test]
    fn test_insert_lookup_delete() {
        let dir = TempDir::new().unwrap();
        let db = Database::open(DbConfig::new(dir.path()).with_block_size(400)).unwrap();
        let tx = db.new_tx().unwrap();
        let mut index = HashIndex::new(Arc::clone(&tx), "nameidx", index_layout());

        let key = Constant::from("alice");
        index.insert(&key, RecordId::new(0, 3)).unwrap();
        index.insert(&key, RecordId::new(2, 1)).unwrap();
        index.insert(&Constant::from("bob"), RecordId::new(1, 0)).unwrap();

        let mut found = Vec::new();
        index.before_first(&key).unwrap();
        while index.next().unwrap() {
            found.push(index.data_rid().unwrap());
        }
        found.sort_by_key(|rid| (rid.block_number, rid.slot));
        assert_eq!(found, vec![RecordId::new(0, 3), RecordId::new(2, 1)]);

        index.delete(&key, RecordId::new(0, 3)).unwrap();
        index.before_first(&key).unwrap();
        assert!(index.next().unwrap());
        assert_eq!(index.data_rid().unwrap(), RecordId::new(2, 1));
        assert!(!index.next().unwrap());
        index.close();
        tx.commit().unwrap();
    }

    #[test]
    fn test_search_cost() {
        assert_eq!(HashIndexFactory.search_cost(1000, 10), 10);
        assert_eq!(HashIndexFactory.search_cost(50, 10), 0);
    }
}
