use billing_core::db::migrations::latest_version;
use billing_core::db::{ensure_foreign_keys, open_db, open_db_in_memory, DbError};
use billing_core::{RepoError, SqliteBillingRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in ["clients", "services", "plans", "subscriptions"] {
        assert_table_exists(&conn, table);
    }
    assert_column_exists(&conn, "subscriptions", "comment");
}

#[test]
fn foreign_keys_are_enforced_on_opened_connections() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let err = conn
        .execute(
            "INSERT INTO subscriptions (client_id, service_id, plan_id) VALUES (1, 1, 1);",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("FOREIGN KEY"));
}

#[test]
fn connection_without_foreign_keys_is_reported() {
    let raw = Connection::open_in_memory().unwrap();
    raw.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
    let err = ensure_foreign_keys(&raw).unwrap_err();
    assert!(matches!(err, DbError::ForeignKeysDisabled));
    assert!(err.to_string().contains("foreign keys"));

    let opened = open_db_in_memory().unwrap();
    ensure_foreign_keys(&opened).unwrap();
}

#[test]
fn schema_rejects_out_of_range_discount_even_without_model_validation() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO plans (plan_type, discount_percent) VALUES ('discount', 101);",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("billing.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute("INSERT INTO services (name, full_price) VALUES ('hosting', 10);", [])
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let services: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM services;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(services, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteBillingRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_missing_required_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteBillingRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("clients"))
    ));
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

fn assert_column_exists(conn: &Connection, table_name: &str, column: &str) {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table_name});"))
        .unwrap();
    let columns: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>("name"))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert!(
        columns.iter().any(|name| name == column),
        "column {table_name}.{column} does not exist"
    );
}
