use bindery_core::db::migrations::latest_version;
use bindery_core::db::{open_db, open_db_in_memory, DbError};
use tempfile::TempDir;

#[test]
fn fresh_store_is_migrated_to_latest_version() {
    let conn = open_db_in_memory().unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn reopening_a_migrated_store_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bindery.sqlite3");

    drop(open_db(&path).unwrap());
    let conn = open_db(&path).unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn newer_schema_than_supported_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bindery.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    }

    match open_db(&path) {
        Err(DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        }) => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("expected UnsupportedSchemaVersion, got {other:?}"),
    }
}
