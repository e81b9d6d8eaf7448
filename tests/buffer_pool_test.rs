//! Integration tests for the buffer pool manager

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use simpledb::buffer::BufferPoolManager;
use simpledb::common::{BlockId, DbError, ReplacerKind};
use simpledb::log::LogManager;
use simpledb::storage::disk::FileManager;
use tempfile::TempDir;

struct Pool {
    fm: Arc<FileManager>,
    lm: Arc<LogManager>,
    bpm: Arc<BufferPoolManager>,
    _dir: TempDir,
}

fn create_pool(num_buffers: usize, replacer: ReplacerKind, timeout_ms: u64) -> Pool {
    let dir = TempDir::new().unwrap();
    let fm = Arc::new(FileManager::new(dir.path(), 400, false).unwrap());
    let lm = Arc::new(LogManager::new(Arc::clone(&fm), "logfile").unwrap());
    let bpm = Arc::new(
        BufferPoolManager::new(
            Arc::clone(&fm),
            Arc::clone(&lm),
            num_buffers,
            replacer,
            Duration::from_millis(timeout_ms),
        )
        .unwrap(),
    );
    Pool {
        fm,
        lm,
        bpm,
        _dir: dir,
    }
}

#[test]
fn test_buffer_reuse_under_pressure() {
    let pool = create_pool(3, ReplacerKind::Naive, 100);
    let bpm = &pool.bpm;
    let block = |n| BlockId::new("testfile", n);

    assert_eq!(bpm.available(), 3);
    let b1 = bpm.pin(&block(1)).unwrap();
    assert_eq!(bpm.available(), 2);
    let b2 = bpm.pin(&block(2)).unwrap();
    assert_eq!(bpm.available(), 1);
    let b3 = bpm.pin(&block(3)).unwrap();
    assert_eq!(bpm.available(), 0);

    let b1_frame = b1.frame_id();
    bpm.unpin(&b1);
    assert_eq!(bpm.available(), 1);
    let b4 = bpm.pin(&block(4)).unwrap();
    assert_eq!(bpm.available(), 0);
    assert_eq!(b4.frame_id(), b1_frame);
    assert_eq!(b4.block(), Some(block(4)));

    let b2_frame = b2.frame_id();
    bpm.unpin(&b2);
    assert_eq!(bpm.available(), 1);
    let b2_again = bpm.pin(&block(2)).unwrap();
    assert_eq!(bpm.available(), 0);
    assert_eq!(b2_again.frame_id(), b2_frame);

    bpm.unpin(&b2_again);
    bpm.unpin(&b3);
    bpm.unpin(&b4);
    assert_eq!(bpm.available(), 3);
}

#[test]
fn test_balanced_pins_leave_pool_empty() {
    let pool = create_pool(4, ReplacerKind::LruK(2), 100);
    let bpm = &pool.bpm;

    let mut frames = Vec::new();
    for round in 0..3 {
        for n in 0..4 {
            frames.push(bpm.pin(&BlockId::new("f", n + round)).unwrap());
        }
        for frame in frames.drain(..) {
            bpm.unpin(&frame);
        }
    }
    assert_eq!(bpm.available(), 4);

    let a = bpm.pin(&BlockId::new("f", 0)).unwrap();
    let b = bpm.pin(&BlockId::new("f", 0)).unwrap();
    assert_eq!(a.pin_count(), 2);
    assert_eq!(bpm.available(), 3);
    bpm.unpin(&a);
    bpm.unpin(&b);
    assert_eq!(a.pin_count(), 0);
    assert_eq!(bpm.available(), 4);
}

#[test]
fn test_saturated_pool_aborts_after_timeout() {
    let pool = create_pool(2, ReplacerKind::Naive, 150);
    let bpm = &pool.bpm;
    let _a = bpm.pin(&BlockId::new("f", 0)).unwrap();
    let _b = bpm.pin(&BlockId::new("f", 1)).unwrap();

    let start = Instant::now();
    let err = bpm.pin(&BlockId::new("f", 2)).unwrap_err();
    assert!(matches!(err, DbError::BufferAbort(_)));
    assert!(err.is_abort());
    assert!(start.elapsed() >= Duration::from_millis(150));
}

#[test]
fn test_waiting_pin_succeeds_after_unpin() {
    let pool = create_pool(1, ReplacerKind::Naive, 5_000);
    let held = pool.bpm.pin(&BlockId::new("f", 0)).unwrap();

    let bpm = Arc::clone(&pool.bpm);
    let waiter = thread::spawn(move || {
        let frame = bpm.pin(&BlockId::new("f", 1)).unwrap();
        let block = frame.block();
        bpm.unpin(&frame);
        block
    });

    thread::sleep(Duration::from_millis(50));
    pool.bpm.unpin(&held);
    assert_eq!(waiter.join().unwrap(), Some(BlockId::new("f", 1)));
}

#[test]
fn test_dirty_frame_is_written_after_log() {
    let pool = create_pool(1, ReplacerKind::Naive, 100);
    let block = BlockId::new("data", 0);

    let frame = pool.bpm.pin(&block).unwrap();
    frame.write_page().set_int(0, 4242).unwrap();
    let lsn = pool.lm.append(b"change").unwrap();
    frame.set_modified(7, lsn);
    pool.bpm.unpin(&frame);
    assert!(pool.lm.last_saved_lsn() < lsn);

    let other = pool.bpm.pin(&BlockId::new("data", 1)).unwrap();
    assert!(pool.lm.last_saved_lsn() >= lsn);
    pool.bpm.unpin(&other);

    let mut page = pool.fm.create_page().unwrap();
    pool.fm.read(&block, &mut page).unwrap();
    assert_eq!(page.get_int(0).unwrap(), 4242);
}

#[test]
fn test_flush_all_writes_only_that_transaction() {
    let pool = create_pool(3, ReplacerKind::Naive, 100);
    let mine = BlockId::new("data", 0);
    let theirs = BlockId::new("data", 1);

    let f1 = pool.bpm.pin(&mine).unwrap();
    f1.write_page().set_int(0, 1).unwrap();
    f1.set_modified(1, -1);
    let f2 = pool.bpm.pin(&theirs).unwrap();
    f2.write_page().set_int(0, 2).unwrap();
    f2.set_modified(2, -1);

    pool.bpm.flush_all(1).unwrap();
    assert_eq!(f1.modifying_tx(), None);
    assert_eq!(f2.modifying_tx(), Some(2));

    let mut page = pool.fm.create_page().unwrap();
    pool.fm.read(&mine, &mut page).unwrap();
    assert_eq!(page.get_int(0).unwrap(), 1);
    pool.fm.read(&theirs, &mut page).unwrap();
    assert_eq!(page.get_int(0).unwrap(), 0);
    pool.bpm.unpin(&f1);
    pool.bpm.unpin(&f2);
}
