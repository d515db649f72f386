use screening_core::db::open_live_store_in_memory;
use screening_core::{Audit, DataError, HealthAssessment, OpContext, RecordStore, SqliteRecordStore};
use serde_json::json;

fn record_store() -> SqliteRecordStore {
    SqliteRecordStore::try_new(open_live_store_in_memory().unwrap()).unwrap()
}

fn ctx() -> OpContext {
    OpContext::background()
}

#[test]
fn create_assigns_identity_and_get_roundtrips() {
    let store = record_store();
    let input = HealthAssessment::new(
        "negative",
        json!({"symptoms": ["cough"], "age": 31, "nested": {"z": 1, "a": 2}}),
    )
    .with_date("2021-04-02");

    let created = store.create(&ctx(), &input).unwrap();
    assert!(created.is_persisted());
    assert_eq!(created.data, input.data);

    let loaded = store.get_by_id(&ctx(), &created.id).unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn create_ignores_caller_supplied_identity() {
    let store = record_store();
    let mut input = HealthAssessment::new("A", json!(null));
    input.id = "chosen-by-caller".to_string();

    let created = store.create(&ctx(), &input).unwrap();
    assert_ne!(created.id, "chosen-by-caller");
    assert!(matches!(
        store.get_by_id(&ctx(), "chosen-by-caller"),
        Err(DataError::NotFound { .. })
    ));
}

#[test]
fn create_keeps_embedded_audit_block() {
    let store = record_store();
    let input = HealthAssessment::new("A", json!({}))
        .with_audit(Audit::new(0, "nurse-1", "2021-04-02T08:00:00Z"));

    let created = store.create(&ctx(), &input).unwrap();
    let loaded = store.get_by_id(&ctx(), &created.id).unwrap();
    assert_eq!(loaded.audit, input.audit);
}

#[test]
fn get_missing_record_is_not_found() {
    let store = record_store();
    let err = store.get_by_id(&ctx(), "does-not-exist").unwrap_err();
    assert!(matches!(
        err,
        DataError::NotFound { operation: "get_by_id", ref id } if id == "does-not-exist"
    ));
}

#[test]
fn get_with_malformed_key_is_validation_error() {
    let store = record_store();
    assert!(matches!(
        store.get_by_id(&ctx(), ""),
        Err(DataError::Validation { .. })
    ));
    assert!(matches!(
        store.get_by_id(&ctx(), "a/b"),
        Err(DataError::Validation { .. })
    ));
}

#[test]
fn replace_overwrites_whole_document() {
    let store = record_store();
    let created = store
        .create(
            &ctx(),
            &HealthAssessment::new("A", json!({"fever": true, "cough": true}))
                .with_date("2021-01-01")
                .with_audit(Audit::new(1, "nurse", "2021-01-01T00:00:00Z")),
        )
        .unwrap();

    let mut replacement = HealthAssessment::new("B", json!({"fever": false}));
    replacement.id = created.id.clone();
    let replaced = store.replace(&ctx(), &replacement).unwrap();
    assert_eq!(replaced, replacement);

    let loaded = store.get_by_id(&ctx(), &created.id).unwrap();
    assert_eq!(loaded.data.status, "B");
    assert_eq!(loaded.data.detail, json!({"fever": false}));
    assert!(loaded.data.date.is_none());
    assert!(loaded.audit.is_none());
}

#[test]
fn replace_missing_record_is_not_found() {
    let store = record_store();
    let mut record = HealthAssessment::new("A", json!(null));
    record.id = "ghost".to_string();

    let err = store.replace(&ctx(), &record).unwrap_err();
    assert!(matches!(err, DataError::NotFound { operation: "replace", .. }));
}

#[test]
fn replace_without_identity_is_validation_error() {
    let store = record_store();
    let record = HealthAssessment::new("A", json!(null));
    assert!(matches!(
        store.replace(&ctx(), &record),
        Err(DataError::Validation { .. })
    ));
}

#[test]
fn delete_returns_prior_state_then_record_is_gone() {
    let store = record_store();
    let created = store
        .create(&ctx(), &HealthAssessment::new("A", json!({"k": "v"})))
        .unwrap();

    let removed = store.delete_by_id(&ctx(), &created.id).unwrap();
    assert_eq!(removed, Some(created.clone()));

    assert!(matches!(
        store.get_by_id(&ctx(), &created.id),
        Err(DataError::NotFound { .. })
    ));
    assert_eq!(store.store().document_count().unwrap(), 0);
}

#[test]
fn delete_missing_record_returns_none() {
    let store = record_store();
    store
        .create(&ctx(), &HealthAssessment::new("A", json!(null)))
        .unwrap();

    assert_eq!(store.delete_by_id(&ctx(), "nothing-here").unwrap(), None);
    assert_eq!(store.store().document_count().unwrap(), 1);
}

#[test]
fn delete_twice_is_safe() {
    let store = record_store();
    let created = store
        .create(&ctx(), &HealthAssessment::new("A", json!(null)))
        .unwrap();

    assert!(store.delete_by_id(&ctx(), &created.id).unwrap().is_some());
    assert!(store.delete_by_id(&ctx(), &created.id).unwrap().is_none());
}
