use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::common::{BlockId, DbError, Result, DIRECT_IO_BLOCK_SIZE, TEMP_FILE_PREFIX};
use crate::storage::page::Page;

/// FileManager maps blocks of the files in the database directory to pages.
///
/// Every file in the directory is a sequence of `block_size` blocks. All
/// reads and writes go through one mutex so I/O on a file never interleaves.
pub struct FileManager {
    /// Directory holding the data files and the log
    db_dir: PathBuf,
    block_size: usize,
    direct_io: bool,
    /// Whether the directory was created by this manager
    is_new: bool,
    /// Open handles, keyed by file name
    open_files: Mutex<HashMap<String, File>>,
    num_reads: AtomicU64,
    num_writes: AtomicU64,
}

impl FileManager {
    /// Opens the database directory, creating it if missing, and removes any
    /// leftover `temp*` files.
    pub fn new<P: AsRef<Path>>(db_dir: P, block_size: usize, direct_io: bool) -> Result<Self> {
        if block_size == 0 {
            return Err(DbError::Config("block size must be positive".into()));
        }
        if direct_io {
            if !cfg!(target_os = "linux") {
                return Err(DbError::Config(
                    "direct I/O is only supported on Linux".into(),
                ));
            }
            if block_size % DIRECT_IO_BLOCK_SIZE != 0 {
                return Err(DbError::Config(format!(
                    "block size {block_size} is not a multiple of {DIRECT_IO_BLOCK_SIZE}"
                )));
            }
        }

        let db_dir = db_dir.as_ref().to_path_buf();
        let is_new = !db_dir.exists();
        if is_new {
            fs::create_dir_all(&db_dir)?;
            info!(path = %db_dir.display(), "created database directory");
        }

        for entry in fs::read_dir(&db_dir)? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with(TEMP_FILE_PREFIX) {
                debug!(file = ?entry.file_name(), "removing temporary file");
                fs::remove_file(entry.path())?;
            }
        }

        Ok(Self {
            db_dir,
            block_size,
            direct_io,
            is_new,
            open_files: Mutex::new(HashMap::new()),
            num_reads: AtomicU64::new(0),
            num_writes: AtomicU64::new(0),
        })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn db_dir(&self) -> &Path {
        &self.db_dir
    }

    /// Allocates a page suitable for I/O through this manager.
    pub fn create_page(&self) -> Result<Page> {
        if self.direct_io {
            Page::new_aligned(self.block_size, DIRECT_IO_BLOCK_SIZE)
        } else {
            Ok(Page::new(self.block_size))
        }
    }

    /// Reads `block` into `page`. Bytes past the end of the file read as zero.
    pub fn read(&self, block: &BlockId, page: &mut Page) -> Result<()> {
        let offset = self.offset_of(block)?;
        let mut files = self.open_files.lock();
        let file = self.file_handle(&mut files, block.file_name())?;
        file.seek(SeekFrom::Start(offset))?;

        let data = page.contents_mut();
        let mut filled = 0;
        while filled < data.len() {
            let n = file.read(&mut data[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        data[filled..].fill(0);

        self.num_reads.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Writes `page` to `block`.
    pub fn write(&self, block: &BlockId, page: &Page) -> Result<()> {
        let offset = self.offset_of(block)?;
        let mut files = self.open_files.lock();
        let file = self.file_handle(&mut files, block.file_name())?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(page.contents())?;
        file.sync_data()?;

        self.num_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Appends a zeroed block to `file_name` and returns its id.
    pub fn extend_file(&self, file_name: &str) -> Result<BlockId> {
        let page = self.create_page()?;
        let mut files = self.open_files.lock();
        let file = self.file_handle(&mut files, file_name)?;
        let block = BlockId::new(file_name, self.length_of(file)?);
        file.seek(SeekFrom::Start(block.number() as u64 * self.block_size as u64))?;
        file.write_all(page.contents())?;
        file.sync_data()?;

        self.num_writes.fetch_add(1, Ordering::Relaxed);
        Ok(block)
    }

    /// Number of blocks in `file_name`.
    pub fn block_length(&self, file_name: &str) -> Result<i32> {
        let mut files = self.open_files.lock();
        let file = self.file_handle(&mut files, file_name)?;
        self.length_of(file)
    }

    pub fn num_reads(&self) -> u64 {
        self.num_reads.load(Ordering::Relaxed)
    }

    pub fn num_writes(&self) -> u64 {
        self.num_writes.load(Ordering::Relaxed)
    }

    fn length_of(&self, file: &File) -> Result<i32> {
        let blocks = file.metadata()?.len() / self.block_size as u64;
        i32::try_from(blocks).map_err(|_| DbError::Config("file has too many blocks".into()))
    }

    fn offset_of(&self, block: &BlockId) -> Result<u64> {
        if block.number() < 0 {
            return Err(DbError::OutOfRange {
                offset: 0,
                len: self.block_size,
                capacity: 0,
            });
        }
        Ok(block.number() as u64 * self.block_size as u64)
    }

    fn file_handle<'a>(
        &self,
        files: &'a mut HashMap<String, File>,
        file_name: &str,
    ) -> Result<&'a mut File> {
        if !files.contains_key(file_name) {
            let file = self.open_file(&self.db_dir.join(file_name))?;
            files.insert(file_name.to_string(), file);
        }
        files
            .get_mut(file_name)
            .ok_or_else(|| DbError::Config(format!("file {file_name} is not open")))
    }

    fn open_file(&self, path: &Path) -> Result<File> {
        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true).truncate(false);
        if self.direct_io {
            set_direct_io(&mut options);
        }
        Ok(options.open(path)?)
    }
}

#[cfg(target_os = "linux")]
fn set_direct_io(options: &mut OpenOptions) {
    use std::os::unix::fs::OpenOptionsExt;
    options.custom_flags(libc::O_DIRECT);
}

#[cfg(not(target_os = "linux"))]
fn set_direct_io(_options: &mut OpenOptions) {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_directory_is_created_and_temp_files_removed() {
        let dir = TempDir::new().unwrap();
        let db_dir = dir.path().join("db");
        let fm = FileManager::new(&db_dir, 128, false).unwrap();
        assert!(fm.is_new());
        drop(fm);

        fs::write(db_dir.join("temp1"), b"scratch").unwrap();
        fs::write(db_dir.join("keep.tbl"), b"data").unwrap();
        let fm = FileManager::new(&db_dir, 128, false).unwrap();
        assert!(!fm.is_new());
        assert!(!db_dir.join("temp1").exists());
        assert!(db_dir.join("keep.tbl").exists());
    }

    #[test]
    fn test_extend_and_length() {
        let dir = TempDir::new().unwrap();
        let fm = FileManager::new(dir.path(), 128, false).unwrap();
        assert_eq!(fm.block_length("f").unwrap(), 0);
        assert_eq!(fm.extend_file("f").unwrap(), BlockId::new("f", 0));
        assert_eq!(fm.extend_file("f").unwrap(), BlockId::new("f", 1));
        assert_eq!(fm.block_length("f").unwrap(), 2);
    }

    #[test]
    fn test_read_past_end_is_zero() {
        let dir = TempDir::new().unwrap();
        let fm = FileManager::new(dir.path(), 128, false).unwrap();
        let mut page = fm.create_page().unwrap();
        page.set_int(0, 99).unwrap();
        fm.read(&BlockId::new("f", 5), &mut page).unwrap();
        assert_eq!(page.get_int(0).unwrap(), 0);
    }

    #[test]
    fn test_rejects_zero_block_size() {
        let dir = TempDir::new().unwrap();
        assert!(FileManager::new(dir.path(), 0, false).is_err());
    }
}
