use std::sync::Arc;

use tracing::info;

use crate::buffer::BufferPoolManager;
use crate::common::{DbConfig, Result};
use crate::index::index_factory;
use crate::log::LogManager;
use crate::metadata::MetadataManager;
use crate::plan::{Plan, Planner};
use crate::storage::disk::FileManager;
use crate::tx::{LockTable, Transaction, TxNumberGenerator};

/// An open database: owns the file, log and buffer managers, the lock
/// table, the transaction number generator, the catalogs and the planner.
///
/// ```no_run
/// use simpledb::{Database, DbConfig};
///
/// let db = Database::open(DbConfig::new("/tmp/studentdb"))?;
/// let tx = db.new_tx()?;
/// db.exec("create table student (sid int, sname varchar(10))", &tx)?;
/// db.exec("insert into student (sid, sname) values (1, 'joe')", &tx)?;
/// let plan = db.query("select sname from student where sid = 1", &tx)?;
/// let mut scan = plan.open()?;
/// while scan.next()? {
///     println!("{}", scan.get_string("sname")?);
/// }
/// scan.close();
/// tx.commit()?;
/// # Ok::<(), simpledb::DbError>(())
/// ```
pub struct Database {
    config: DbConfig,
    file_manager: Arc<FileManager>,
    log_manager: Arc<LogManager>,
    buffer_pool: Arc<BufferPoolManager>,
    lock_table: Arc<LockTable>,
    tx_numbers: TxNumberGenerator,
    metadata: Arc<MetadataManager>,
    planner: Planner,
}

impl Database {
    /// Opens the database at `config.db_path`, creating it if needed.
    /// An existing database is recovered before the catalogs are loaded.
    pub fn open(config: DbConfig) -> Result<Self> {
        config.validate()?;
        let file_manager = Arc::new(FileManager::new(
            &config.db_path,
            config.block_size,
            config.direct_io,
        )?);
        let log_manager = Arc::new(LogManager::new(
            Arc::clone(&file_manager),
            config.log_file.clone(),
        )?);
        let buffer_pool = Arc::new(BufferPoolManager::new(
            Arc::clone(&file_manager),
            Arc::clone(&log_manager),
            config.num_buffers,
            config.replacer,
            config.timeout,
        )?);
        let lock_table = Arc::new(LockTable::new(config.timeout));
        let tx_numbers = TxNumberGenerator::new();

        let tx = Arc::new(Transaction::new(
            tx_numbers.next_tx_num(),
            Arc::clone(&file_manager),
            Arc::clone(&log_manager),
            Arc::clone(&buffer_pool),
            Arc::clone(&lock_table),
        )?);
        if file_manager.is_new() {
            info!(path = %config.db_path.display(), "creating new database");
        } else {
            info!(path = %config.db_path.display(), "recovering existing database");
            tx.recover()?;
        }
        let metadata = Arc::new(MetadataManager::new(&tx, index_factory(config.index))?);
        tx.commit()?;

        let planner = Planner::with_kind(Arc::clone(&metadata), config.planner);
        info!(
            block_size = config.block_size,
            num_buffers = config.num_buffers,
            planner = ?config.planner,
            "database ready"
        );
        Ok(Self {
            config,
            file_manager,
            log_manager,
            buffer_pool,
            lock_table,
            tx_numbers,
            metadata,
            planner,
        })
    }

    pub fn new_tx(&self) -> Result<Arc<Transaction>> {
        Ok(Arc::new(Transaction::new(
            self.tx_numbers.next_tx_num(),
            Arc::clone(&self.file_manager),
            Arc::clone(&self.log_manager),
            Arc::clone(&self.buffer_pool),
            Arc::clone(&self.lock_table),
        )?))
    }

    /// Plans a `SELECT` inside `tx`.
    pub fn query(&self, sql: &str, tx: &Arc<Transaction>) -> Result<Box<dyn Plan>> {
        self.planner.create_query_plan(sql, tx)
    }

    /// Runs a modifying statement inside `tx` and returns the number of
    /// affected records.
    pub fn exec(&self, sql: &str, tx: &Arc<Transaction>) -> Result<usize> {
        self.planner.execute_update(sql, tx)
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn file_manager(&self) -> &Arc<FileManager> {
        &self.file_manager
    }

    pub fn log_manager(&self) -> &Arc<LogManager> {
        &self.log_manager
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPoolManager> {
        &self.buffer_pool
    }

    pub fn lock_table(&self) -> &Arc<LockTable> {
        &self.lock_table
    }

    pub fn metadata(&self) -> &Arc<MetadataManager> {
        &self.metadata
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }
}
