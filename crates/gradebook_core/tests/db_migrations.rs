use gradebook_core::db::migrations::latest_version;
use gradebook_core::{ensure_schema_ready, open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

const TABLES: &[&str] = &[
    "student_groups",
    "teachers",
    "subjects",
    "students",
    "grades",
    "archived_student_groups",
    "archived_students",
    "archived_grades",
];

#[test]
fn open_db_in_memory_creates_live_and_archive_tables() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in TABLES {
        assert_table_exists(&conn, table);
    }
    ensure_schema_ready(&conn).unwrap();
}

#[test]
fn connections_enforce_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let orphan = conn.execute(
        "INSERT INTO students (id, student_number, first_name, last_name, enrollment_year, study_form, group_id)
         VALUES ('s', 'N-1', 'A', 'B', 2020, 'full_time', 'missing-group');",
        [],
    );
    assert!(orphan.is_err());
}

#[test]
fn reopening_a_file_database_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gradebook.db");

    let first = open_db(&path).unwrap();
    assert_eq!(schema_version(&first), latest_version());
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    assert_table_exists(&second, "archived_grades");
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn raw_connection_is_not_schema_ready() {
    let conn = Connection::open_in_memory().unwrap();
    match ensure_schema_ready(&conn).unwrap_err() {
        DbError::UninitializedConnection {
            expected_version,
            actual_version,
        } => {
            assert_eq!(expected_version, latest_version());
            assert_eq!(actual_version, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn archive_tables_reject_duplicate_original_ids() {
    let conn = open_db_in_memory().unwrap();
    let insert = "INSERT INTO archived_student_groups
        (id, original_group_id, code, name, capacity, was_active, student_count, original_created_at, archived_by, archived_at)
        VALUES (?1, 'g-1', 'CS', 'CS', 10, 1, 0, 0, 'registrar', 1);";

    conn.execute(insert, ["a-1"]).unwrap();
    assert!(conn.execute(insert, ["a-2"]).is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
