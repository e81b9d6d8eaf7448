//! Integration tests for the write-ahead log

use std::sync::Arc;

use simpledb::common::DbError;
use simpledb::log::LogManager;
use simpledb::storage::disk::FileManager;
use simpledb::storage::page::Page;
use tempfile::TempDir;

fn make_record(text: &str, n: i32) -> Vec<u8> {
    let npos = Page::max_length(text.len());
    let mut page = Page::new(npos + 4);
    page.set_string(0, text).unwrap();
    page.set_int(npos, n).unwrap();
    page.contents().to_vec()
}

fn read_record(bytes: &[u8]) -> (String, i32) {
    let page = Page::from_bytes(bytes);
    let text = page.get_string(0).unwrap();
    let n = page.get_int(Page::max_length(text.len())).unwrap();
    (text, n)
}

fn create_records(lm: &LogManager, start: i32, end: i32) -> Vec<i32> {
    (start..=end)
        .map(|i| lm.append(&make_record(&format!("record{i}"), i + 100)).unwrap())
        .collect()
}

#[test]
fn test_log_round_trip_with_block_spill() {
    let dir = TempDir::new().unwrap();
    let fm = Arc::new(FileManager::new(dir.path(), 400, false).unwrap());
    let lm = LogManager::new(Arc::clone(&fm), "logfile").unwrap();

    let lsns = create_records(&lm, 1, 70);
    assert_eq!(lsns, (1..=70).collect::<Vec<_>>());
    assert!(fm.block_length("logfile").unwrap() > 1);

    let records: Vec<(String, i32)> = lm
        .iter()
        .unwrap()
        .map(|r| read_record(&r.unwrap()))
        .collect();
    assert_eq!(records.len(), 70);
    for (k, (text, n)) in records.iter().enumerate() {
        let i = 70 - k as i32;
        assert_eq!(text, &format!("record{i}"));
        assert_eq!(*n, i + 100);
    }

    lm.flush_lsn(65).unwrap();
    assert_eq!(lm.last_saved_lsn(), 70);
}

#[test]
fn test_flush_lsn_forces_current_block() {
    let dir = TempDir::new().unwrap();
    let fm = Arc::new(FileManager::new(dir.path(), 400, false).unwrap());
    let lm = LogManager::new(Arc::clone(&fm), "logfile").unwrap();

    create_records(&lm, 1, 5);
    assert_eq!(lm.last_saved_lsn(), 0);
    lm.flush_lsn(3).unwrap();
    assert_eq!(lm.last_saved_lsn(), 5);
}

#[test]
fn test_log_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let fm = Arc::new(FileManager::new(dir.path(), 400, false).unwrap());
        let lm = LogManager::new(fm, "logfile").unwrap();
        create_records(&lm, 1, 30);
        lm.flush().unwrap();
    }
    let fm = Arc::new(FileManager::new(dir.path(), 400, false).unwrap());
    let lm = LogManager::new(fm, "logfile").unwrap();
    create_records(&lm, 31, 35);
    let ns: Vec<i32> = lm
        .iter()
        .unwrap()
        .map(|r| read_record(&r.unwrap()).1)
        .collect();
    assert_eq!(ns, (101..=135).rev().collect::<Vec<_>>());
}

#[test]
fn test_record_larger_than_block_is_rejected() {
    let dir = TempDir::new().unwrap();
    let fm = Arc::new(FileManager::new(dir.path(), 400, false).unwrap());
    let lm = LogManager::new(fm, "logfile").unwrap();
    let err = lm.append(&[0u8; 400]).unwrap_err();
    assert!(matches!(err, DbError::RecordTooLong { .. }));
    assert_eq!(lm.latest_lsn(), 0);
}
