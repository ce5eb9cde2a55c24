//! End-to-end CSV import against an on-disk store

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use qka_store::{csv_files, import_csv_file, Store, DEFAULT_READ_LIMIT};
use tempfile::TempDir;

const HEADER: &str = "代码,时间,开盘价,最高价,最低价,收盘价,成交量,成交额\n";

fn write_csv(path: &Path, rows: &[&str]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut body = HEADER.to_string();
    for row in rows {
        body.push_str(row);
        body.push('\n');
    }
    fs::write(path, body).unwrap();
}

#[test]
fn open_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("nested/deeper/qka.db");
    Store::open(&db).unwrap();
    assert!(db.exists());
}

#[test]
fn csv_files_found_recursively() {
    let dir = TempDir::new().unwrap();
    write_csv(&dir.path().join("2024/01/sz000001.csv"), &[]);
    write_csv(&dir.path().join("sh600000.CSV"), &[]);
    fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

    let files = csv_files(dir.path());
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files.len(), 2);
    assert!(names.contains(&"sz000001.csv".to_string()));
    assert!(names.contains(&"sh600000.CSV".to_string()));
}

#[test]
fn import_in_chunks() {
    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("sz000001.csv");
    write_csv(
        &csv,
        &[
            "sz000001,2024-01-02 09:31:00,9.10,9.20,9.00,9.15,1200,10980.0",
            "sz000001,2024-01-02 09:32:00,9.15,9.18,9.12,9.16,800,7328.0",
            "sz000001,2024-01-02 09:33:00,9.16,9.30,9.16,9.28,3000,27840.0",
        ],
    );

    let mut store = Store::open(dir.path().join("qka.db")).unwrap();
    let written = import_csv_file(&mut store, "bars_1m", &csv, 2).unwrap();
    assert_eq!(written, 3);

    let rows = store.read_table("bars_1m", DEFAULT_READ_LIMIT).unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|b| b.code == "000001.SZ"));
    assert_eq!(rows[0].time, 1_704_187_860_000);
    assert_eq!(rows[2].close, 9.28);
}

#[test]
fn bad_row_fails_the_file() {
    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("broken.csv");
    write_csv(&csv, &["sz000001,not-a-time,1,1,1,1,1,1"]);

    let mut store = Store::open(dir.path().join("qka.db")).unwrap();
    assert!(import_csv_file(&mut store, "bars_1m", &csv, 10).is_err());
    assert!(!store.table_exists("bars_1m").unwrap());
}
