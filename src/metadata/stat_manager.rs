use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::common::Result;
use crate::query::Scan;
use crate::record::{table_file_name, Layout, TableScan};
use crate::tx::Transaction;

/// Number of `get_stat_info` calls after which cached statistics are dropped.
pub const STAT_REFRESH_CALLS: usize = 100;

/// Size estimates for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatInfo {
    num_blocks: usize,
    num_records: usize,
}

impl StatInfo {
    pub fn new(num_blocks: usize, num_records: usize) -> Self {
        Self {
            num_blocks,
            num_records,
        }
    }

    pub fn blocks_accessed(&self) -> usize {
        self.num_blocks
    }

    pub fn records_output(&self) -> usize {
        self.num_records
    }

    /// Estimated number of distinct values of any field: a third of the
    /// records, plus one.
    pub fn distinct_values(&self, _field: &str) -> usize {
        1 + self.num_records / 3
    }
}

#[derive(Default)]
struct StatCache {
    stats: HashMap<String, StatInfo>,
    num_calls: usize,
}

/// Computes table statistics by scanning and caches them.
#[derive(Default)]
pub struct StatManager {
    cache: Mutex<StatCache>,
}

impl StatManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_stat_info(
        &self,
        table: &str,
        layout: &Arc<Layout>,
        tx: &Arc<Transaction>,
    ) -> Result<StatInfo> {
        {
            let mut cache = self.cache.lock();
            cache.num_calls += 1;
            if cache.num_calls > STAT_REFRESH_CALLS {
                debug!("refreshing table statistics");
                cache.stats.clear();
                cache.num_calls = 0;
            }
            if let Some(info) = cache.stats.get(table) {
                return Ok(*info);
            }
        }

        let info = Self::calc_table_stats(table, layout, tx)?;
        self.cache.lock().stats.insert(table.to_string(), info);
        Ok(info)
    }

    /// Drops the cached statistics of `table`.
    pub fn invalidate(&self, table: &str) {
        self.cache.lock().stats.remove(table);
    }

    fn calc_table_stats(table: &str, layout: &Arc<Layout>, tx: &Arc<Transaction>) -> Result<StatInfo> {
        let num_blocks = tx.size(&table_file_name(table))?.max(0) as usize;
        if num_blocks == 0 {
            return Ok(StatInfo::new(0, 0));
        }
        let mut scan = TableScan::new(Arc::clone(tx), table, Arc::clone(layout))?;
        let mut num_records = 0;
        while scan.next()? {
            num_records += 1;
        }
        scan.close();
        Ok(StatInfo::new(num_blocks, num_records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_values_heuristic() {
        let info = StatInfo::new(5, 200);
        assert_eq!(info.blocks_accessed(), 5);
        assert_eq!(info.records_output(), 200);
        assert_eq!(info.distinct_values("a"), 67);
        assert_eq!(StatInfo::new(0, 0).distinct_values("a"), 1);
    }
}
