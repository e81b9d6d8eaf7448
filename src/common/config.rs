use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::error::{DbError, Result};

/// Default block size in bytes (4 KB)
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Alignment and size granularity required by O_DIRECT
pub const DIRECT_IO_BLOCK_SIZE: usize = 4096;

/// Default buffer pool size (number of frames)
pub const DEFAULT_NUM_BUFFERS: usize = 20;

/// Default wait for a buffer or a lock before aborting
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default K value for LRU-K replacement policy
pub const DEFAULT_LRUK_K: usize = 2;

pub const DEFAULT_LOG_FILE: &str = "logfile";

pub const DEFAULT_DB_DIR: &str = "simpledb";

/// Environment variable overriding the database directory
pub const DB_PATH_ENV: &str = "SIMPLEDB_PATH";

/// Files in the database directory with this prefix are scratch files
pub const TEMP_FILE_PREFIX: &str = "temp";

/// Frame replacement policy of the buffer pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacerKind {
    /// First unpinned frame in frame order.
    Naive,
    /// LRU-K with the given K.
    LruK(usize),
}

/// Query planning strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerKind {
    /// Products in FROM order.
    Basic,
    /// Products oriented by estimated block accesses.
    Better,
    /// `Better`, plus index lookups for `field = constant` terms.
    Indexed,
}

/// Index implementation used for `CREATE INDEX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Hash,
    Dummy,
}

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub db_path: PathBuf,
    pub block_size: usize,
    pub num_buffers: usize,
    pub timeout: Duration,
    pub log_file: String,
    pub direct_io: bool,
    pub replacer: ReplacerKind,
    pub planner: PlannerKind,
    pub index: IndexKind,
}

impl Default for DbConfig {
    fn default() -> Self {
        let home = env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(home.join(DEFAULT_DB_DIR))
    }
}

impl DbConfig {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
            block_size: DEFAULT_BLOCK_SIZE,
            num_buffers: DEFAULT_NUM_BUFFERS,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            log_file: DEFAULT_LOG_FILE.to_string(),
            direct_io: false,
            replacer: ReplacerKind::Naive,
            planner: PlannerKind::Indexed,
            index: IndexKind::Hash,
        }
    }

    /// Defaults, with the directory taken from `SIMPLEDB_PATH` when set.
    pub fn from_env() -> Self {
        match env::var_os(DB_PATH_ENV) {
            Some(path) if !path.is_empty() => Self::new(path),
            _ => Self::default(),
        }
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_num_buffers(mut self, num_buffers: usize) -> Self {
        self.num_buffers = num_buffers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_log_file(mut self, log_file: impl Into<String>) -> Self {
        self.log_file = log_file.into();
        self
    }

    pub fn with_direct_io(mut self, direct_io: bool) -> Self {
        self.direct_io = direct_io;
        self
    }

    pub fn with_replacer(mut self, replacer: ReplacerKind) -> Self {
        self.replacer = replacer;
        self
    }

    pub fn with_planner(mut self, planner: PlannerKind) -> Self {
        self.planner = planner;
        self
    }

    pub fn with_index(mut self, index: IndexKind) -> Self {
        self.index = index;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 || self.block_size > i32::MAX as usize {
            return Err(DbError::Config(format!(
                "bad block size {}",
                self.block_size
            )));
        }
        if self.direct_io && self.block_size % DIRECT_IO_BLOCK_SIZE != 0 {
            return Err(DbError::Config(format!(
                "block size {} is not a multiple of {} required for direct I/O",
                self.block_size, DIRECT_IO_BLOCK_SIZE
            )));
        }
        if self.num_buffers == 0 {
            return Err(DbError::Config("buffer count must be positive".into()));
        }
        if self.log_file.is_empty() || self.log_file.contains(['/', '\\']) {
            return Err(DbError::Config(format!(
                "bad log file name {:?}",
                self.log_file
            )));
        }
        if let ReplacerKind::LruK(0) = self.replacer {
            return Err(DbError::Config("LRU-K needs k >= 1".into()));
        }
        Ok(())
    }
}
