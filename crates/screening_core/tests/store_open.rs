use rusqlite::Connection;
use screening_core::db::migrations::{apply_migrations, latest_version};
use screening_core::db::{
    open_live_store, open_live_store_in_memory, open_log_store, open_log_store_in_memory,
};
use screening_core::{
    DataAccess, DbError, HealthAssessment, OpContext, RecordStore, SqliteAuditLog,
    SqliteRecordStore, StoreHandle, StoreKind,
};
use serde_json::json;

#[test]
fn in_memory_stores_start_empty() {
    let live = open_live_store_in_memory().unwrap();
    let log = open_log_store_in_memory().unwrap();

    assert_eq!(live.kind(), StoreKind::Live);
    assert_eq!(log.kind(), StoreKind::Log);
    assert_eq!(live.document_count().unwrap(), 0);
    assert_eq!(log.document_count().unwrap(), 0);
}

#[test]
fn reopening_file_store_keeps_documents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("live.db");

    let created = {
        let records = SqliteRecordStore::try_new(open_live_store(&path).unwrap()).unwrap();
        records
            .create(
                &OpContext::background(),
                &HealthAssessment::new("A", json!({"age": 30})),
            )
            .unwrap()
    };

    let records = SqliteRecordStore::try_new(open_live_store(&path).unwrap()).unwrap();
    let loaded = records
        .get_by_id(&OpContext::background(), &created.id)
        .unwrap();
    assert_eq!(loaded, created);
    assert_eq!(records.store().document_count().unwrap(), 1);
}

#[test]
fn live_and_log_files_are_independent_schemas() {
    let dir = tempfile::tempdir().unwrap();
    let live = open_live_store(dir.path().join("live.db")).unwrap();
    let log = open_log_store(dir.path().join("log.db")).unwrap();

    assert!(DataAccess::open(live, log).is_ok());
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_log_store(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            kind,
            db_version,
            latest_supported,
        } => {
            assert_eq!(kind, StoreKind::Log);
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version(StoreKind::Log));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn handle_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match StoreHandle::new(conn, StoreKind::Live) {
        Err(DbError::UninitializedStore {
            kind: StoreKind::Live,
            expected,
            actual: 0,
        }) => assert!(expected > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized store error"),
    }
}

#[test]
fn handle_rejects_connection_migrated_for_other_kind() {
    let mut conn = Connection::open_in_memory().unwrap();
    apply_migrations(&mut conn, StoreKind::Log).unwrap();

    let result = StoreHandle::new(conn, StoreKind::Live);
    assert!(matches!(
        result,
        Err(DbError::MissingCollection {
            kind: StoreKind::Live,
            collection: "health_assessment"
        })
    ));
}

#[test]
fn swapped_handles_are_rejected() {
    let live = open_live_store_in_memory().unwrap();
    let log = open_log_store_in_memory().unwrap();

    assert!(matches!(
        SqliteAuditLog::try_new(live.clone()),
        Err(DbError::WrongStoreKind {
            expected: StoreKind::Log,
            actual: StoreKind::Live
        })
    ));
    assert!(matches!(
        DataAccess::open(log, live),
        Err(DbError::WrongStoreKind { .. })
    ));
}
