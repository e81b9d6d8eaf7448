//! Integration tests for record pages, table scans and the basic scans

use std::sync::Arc;

use rand::Rng;
use simpledb::common::{BlockId, DbError, ErrorKind, RecordId};
use simpledb::query::{
    Constant, Expression, Predicate, ProductScan, ProjectScan, Scan, SelectScan, Term, UpdateScan,
};
use simpledb::record::{Layout, Schema, TableScan};
use simpledb::{Database, DbConfig};
use tempfile::TempDir;

fn open_db(dir: &TempDir) -> Database {
    Database::open(DbConfig::new(dir.path()).with_block_size(400).with_num_buffers(8)).unwrap()
}

fn layout() -> Arc<Layout> {
    let mut schema = Schema::new();
    schema.add_int_field("a");
    schema.add_string_field("b", 9);
    Arc::new(Layout::new(schema))
}

#[test]
fn test_layout_offsets() {
    let layout = layout();
    assert_eq!(layout.offset("a"), Some(4));
    assert_eq!(layout.offset("b"), Some(8));
    assert_eq!(layout.slot_size(), 21);
}

#[test]
fn test_scan_returns_every_insert_in_order() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    let tx = db.new_tx().unwrap();
    let mut rng = rand::thread_rng();

    let mut scan = TableScan::new(Arc::clone(&tx), "t", layout()).unwrap();
    let mut inserted = Vec::new();
    for i in 0..50 {
        let n: i32 = rng.gen_range(0..50);
        scan.insert().unwrap();
        scan.set_int("a", n).unwrap();
        scan.set_string("b", &format!("rec{i}")).unwrap();
        inserted.push((n, format!("rec{i}")));
    }
    assert!(tx.size("t.tbl").unwrap() > 1);

    scan.before_first().unwrap();
    let mut seen = Vec::new();
    while scan.next().unwrap() {
        seen.push((scan.get_int("a").unwrap(), scan.get_string("b").unwrap()));
    }
    assert_eq!(seen, inserted);

    scan.before_first().unwrap();
    let mut deleted = 0;
    while scan.next().unwrap() {
        if scan.get_int("a").unwrap() < 25 {
            scan.delete().unwrap();
            deleted += 1;
        }
    }
    scan.before_first().unwrap();
    let mut remaining = 0;
    while scan.next().unwrap() {
        assert!(scan.get_int("a").unwrap() >= 25);
        remaining += 1;
    }
    assert_eq!(deleted + remaining, 50);
    scan.close();
    tx.commit().unwrap();
    assert_eq!(db.buffer_pool().available(), 8);
}

#[test]
fn test_move_to_rid() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    let tx = db.new_tx().unwrap();
    let mut scan = TableScan::new(Arc::clone(&tx), "t", layout()).unwrap();

    let mut rids = Vec::new();
    for i in 0..30 {
        scan.insert().unwrap();
        scan.set_int("a", i).unwrap();
        rids.push(scan.rid().unwrap());
    }
    let target: RecordId = rids[23];
    scan.move_to_rid(target).unwrap();
    assert_eq!(scan.get_int("a").unwrap(), 23);
    assert_eq!(scan.get_val("a").unwrap(), Constant::Int(23));
    scan.close();
    tx.commit().unwrap();
}

#[test]
fn test_field_errors() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    let tx = db.new_tx().unwrap();
    let mut scan = TableScan::new(Arc::clone(&tx), "t", layout()).unwrap();
    scan.insert().unwrap();

    let err = scan.set_string("b", "much too long").unwrap_err();
    assert!(matches!(err, DbError::StringTooLong { .. }));
    let err = scan.get_int("b").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidUpcast);
    assert!(matches!(scan.get_int("zzz"), Err(DbError::FieldNotFound(_))));
    scan.close();
    assert!(matches!(scan.next(), Err(DbError::ScanClosed)));
    tx.commit().unwrap();
}

fn fill(tx: &Arc<simpledb::tx::Transaction>, table: &str, field: &str, n: i32) {
    let mut schema = Schema::new();
    schema.add_int_field(field);
    let mut scan = TableScan::new(Arc::clone(tx), table, Arc::new(Layout::new(schema))).unwrap();
    for i in 0..n {
        scan.insert().unwrap();
        scan.set_int(field, i).unwrap();
    }
    scan.close();
}

fn open(tx: &Arc<simpledb::tx::Transaction>, table: &str, field: &str) -> Box<dyn Scan> {
    let mut schema = Schema::new();
    schema.add_int_field(field);
    Box::new(TableScan::new(Arc::clone(tx), table, Arc::new(Layout::new(schema))).unwrap())
}

#[test]
fn test_select_project_product() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    let tx = db.new_tx().unwrap();
    fill(&tx, "l", "x", 4);
    fill(&tx, "r", "y", 3);

    let mut product = ProductScan::new(open(&tx, "l", "x"), open(&tx, "r", "y")).unwrap();
    let mut pairs = Vec::new();
    while product.next().unwrap() {
        pairs.push((product.get_int("x").unwrap(), product.get_int("y").unwrap()));
    }
    assert_eq!(pairs.len(), 12);
    assert_eq!(pairs[0], (0, 0));
    assert_eq!(pairs[3], (1, 0));
    product.close();

    let pred = Predicate::from_term(Term::new(
        Expression::Field("x".into()),
        Expression::Field("y".into()),
    ));
    let joined = ProductScan::new(open(&tx, "l", "x"), open(&tx, "r", "y")).unwrap();
    let mut select = SelectScan::new(Box::new(joined), pred);
    let mut matches = Vec::new();
    while select.next().unwrap() {
        matches.push(select.get_int("x").unwrap());
    }
    assert_eq!(matches, vec![0, 1, 2]);
    assert!(matches!(select.as_update_scan(), Err(DbError::NotUpdatable(_))));
    select.close();

    let mut project = ProjectScan::new(open(&tx, "l", "x"), vec!["x".into()]);
    assert!(project.next().unwrap());
    assert!(project.has_field("x"));
    assert!(!project.has_field("y"));
    assert!(matches!(project.as_update_scan(), Err(DbError::NotUpdatable(_))));
    project.close();

    let pred = Predicate::from_term(Term::new(
        Expression::Field("x".into()),
        Expression::Const(Constant::Int(2)),
    ));
    let mut select = SelectScan::new(open(&tx, "l", "x"), pred);
    assert!(select.next().unwrap());
    select.as_update_scan().unwrap().set_int("x", 20).unwrap();
    select.close();

    let mut check = open(&tx, "l", "x");
    let mut values = Vec::new();
    while check.next().unwrap() {
        values.push(check.get_int("x").unwrap());
    }
    assert_eq!(values, vec![0, 1, 20, 3]);
    check.close();
    tx.commit().unwrap();
}

#[test]
fn test_insert_rejects_record_larger_than_block() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    let tx = db.new_tx().unwrap();
    let mut schema = Schema::new();
    schema.add_string_field("b", 500);
    let layout = Arc::new(Layout::new(schema));

    let mut scan = TableScan::new(Arc::clone(&tx), "big", layout).unwrap();
    let err = scan.insert().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TooLongRecord);
    assert_eq!(tx.size("big.tbl").unwrap(), 1);
    scan.close();
    tx.rollback().unwrap();
}

#[test]
fn test_shorter_string_zeroes_old_bytes() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    let raw_field = || {
        let fm = db.file_manager();
        let mut page = fm.create_page().unwrap();
        fm.read(&BlockId::new("t.tbl", 0), &mut page).unwrap();
        page.contents()[4..17].to_vec()
    };
    let padded = |value: &[u8]| {
        let mut bytes = (value.len() as i32).to_be_bytes().to_vec();
        bytes.extend_from_slice(value);
        bytes.resize(13, 0);
        bytes
    };

    let tx = db.new_tx().unwrap();
    db.exec("create table t (b varchar(9))", &tx).unwrap();
    db.exec("insert into t (b) values ('rec100')", &tx).unwrap();
    tx.commit().unwrap();
    assert_eq!(raw_field(), padded(b"rec100"));

    let tx = db.new_tx().unwrap();
    assert_eq!(db.exec("update t set b = 'x'", &tx).unwrap(), 1);
    tx.commit().unwrap();
    assert_eq!(raw_field(), padded(b"x"));

    let tx = db.new_tx().unwrap();
    db.exec("update t set b = 'abcdefgh'", &tx).unwrap();
    tx.rollback().unwrap();
    assert_eq!(raw_field(), padded(b"x"));

    let tx = db.new_tx().unwrap();
    db.exec("update t set b = 'longvalue'", &tx).unwrap();
    tx.commit().unwrap();
    let tx = db.new_tx().unwrap();
    db.exec("update t set b = 'y'", &tx).unwrap();
    tx.rollback().unwrap();
    assert_eq!(raw_field(), padded(b"longvalue"));
}
