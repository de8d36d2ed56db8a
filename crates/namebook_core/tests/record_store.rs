use namebook_core::{Record, RecordStore, StoreError};
use rusqlite::Connection;
use std::collections::HashSet;

fn ready_store() -> RecordStore {
    let mut store = RecordStore::open_in_memory().unwrap();
    store.initialize().unwrap();
    store
}

fn assert_snapshot_matches_storage(store: &RecordStore) {
    let durable = store.list_all().unwrap();
    assert_eq!(store.snapshot(), durable.as_slice());
}

#[test]
fn initialize_twice_is_idempotent() {
    let mut store = RecordStore::open_in_memory().unwrap();
    store.initialize().unwrap();
    store.add("kept").unwrap();
    store.initialize().unwrap();

    assert!(store.is_initialized());
    assert_eq!(store.len(), 1);
    assert_snapshot_matches_storage(&store);
}

#[test]
fn add_then_list_all_roundtrips_text_and_id() {
    let mut store = ready_store();

    let created = store.add("Alice").unwrap();
    let listed = store.list_all().unwrap();
    assert!(listed.contains(&Record::new(created.id, "Alice")));
    assert_eq!(store.snapshot().last(), Some(&created));
}

#[test]
fn crud_scenario_keeps_snapshot_and_storage_in_step() {
    let mut store = ready_store();

    let a = store.add("A").unwrap();
    assert_eq!(a.id, 1);
    let b = store.add("B").unwrap();
    assert_eq!(b.id, 2);

    assert!(store.update(1, "A2").unwrap());
    assert_eq!(
        store.list_all().unwrap(),
        vec![Record::new(1, "A2"), Record::new(2, "B")]
    );
    assert_snapshot_matches_storage(&store);

    assert!(store.delete(2).unwrap());
    assert_eq!(store.list_all().unwrap(), vec![Record::new(1, "A2")]);
    assert_snapshot_matches_storage(&store);
}

#[test]
fn update_on_missing_id_returns_false_and_changes_nothing() {
    let mut store = ready_store();
    store.add("only").unwrap();
    let before = store.list_all().unwrap();

    assert!(!store.update(9999, "X").unwrap());
    assert_eq!(store.list_all().unwrap(), before);
    assert_snapshot_matches_storage(&store);
}

#[test]
fn delete_on_missing_id_returns_false_and_changes_nothing() {
    let mut store = ready_store();
    store.add("only").unwrap();
    let before = store.list_all().unwrap();

    assert!(!store.delete(9999).unwrap());
    assert_eq!(store.list_all().unwrap(), before);
    assert_snapshot_matches_storage(&store);
}

#[test]
fn ids_are_distinct_and_not_reused_after_delete() {
    let mut store = ready_store();
    let mut seen = HashSet::new();

    for round in 0..5 {
        let record = store.add(format!("name-{round}")).unwrap();
        assert!(seen.insert(record.id), "id {} was reused", record.id);
        assert!(store.delete(record.id).unwrap());
    }

    let last = store.add("after deletes").unwrap();
    assert!(seen.insert(last.id));
    assert!(seen.iter().all(|id| *id <= last.id));
    assert_snapshot_matches_storage(&store);
}

#[test]
fn duplicate_and_empty_texts_are_accepted() {
    let mut store = ready_store();

    let first = store.add("twin").unwrap();
    let second = store.add("twin").unwrap();
    let empty = store.add("").unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(empty.text, "");
    assert_eq!(store.len(), 3);
    assert_snapshot_matches_storage(&store);
}

#[test]
fn mixed_mutations_keep_snapshot_consistent() {
    let mut store = ready_store();

    let ids: Vec<_> = ["a", "b", "c", "d"]
        .iter()
        .map(|text| store.add(*text).unwrap().id)
        .collect();
    assert!(store.delete(ids[1]).unwrap());
    assert!(store.update(ids[2], "c2").unwrap());
    assert!(!store.update(ids[1], "gone").unwrap());
    store.add("e").unwrap();
    assert!(store.delete(ids[0]).unwrap());

    assert_snapshot_matches_storage(&store);
    let texts: Vec<_> = store
        .snapshot()
        .iter()
        .map(|record| record.text.as_str())
        .collect();
    assert_eq!(texts, vec!["c2", "d", "e"]);
}

#[test]
fn records_survive_reopen_of_the_same_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("names.db");

    let first_session = {
        let mut store = RecordStore::open(&path).unwrap();
        store.initialize().unwrap();
        store.add("Alice").unwrap();
        store.add("Bob").unwrap();
        let listed = store.list_all().unwrap();
        store.close().unwrap();
        listed
    };

    let mut reopened = RecordStore::open(&path).unwrap();
    reopened.initialize().unwrap();
    assert_eq!(reopened.snapshot(), first_session.as_slice());
    assert_eq!(reopened.get(first_session[1].id).unwrap().text, "Bob");
}

#[test]
fn storage_failure_surfaces_and_snapshot_is_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("names.db");

    let mut store = RecordStore::open(&path).unwrap();
    store.initialize().unwrap();
    let kept = store.add("kept").unwrap();

    let saboteur = Connection::open(&path).unwrap();
    saboteur.execute_batch("DROP TABLE names;").unwrap();

    let err = store.add("lost").unwrap_err();
    assert!(matches!(err, StoreError::StorageUnavailable(_)));
    assert!(matches!(
        store.list_all(),
        Err(StoreError::StorageUnavailable(_))
    ));
    assert_eq!(store.snapshot(), &[kept][..]);
}

#[test]
fn initialize_recreates_table_lost_under_current_schema_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("names.db");

    let mut store = RecordStore::open(&path).unwrap();
    store.initialize().unwrap();
    store.add("gone with the table").unwrap();
    store.close().unwrap();

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("DROP TABLE names;").unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, 1);
    drop(conn);

    let mut reopened = RecordStore::open(&path).unwrap();
    reopened.initialize().unwrap();
    assert!(reopened.is_empty());
    assert!(reopened.list_all().unwrap().is_empty());

    let added = reopened.add("fresh").unwrap();
    assert_eq!(reopened.snapshot(), &[added][..]);
}

#[test]
fn initialize_rejects_database_from_a_newer_binary() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let mut store = RecordStore::open(&path).unwrap();
    let err = store.initialize().unwrap_err();
    assert!(matches!(err, StoreError::StorageUnavailable(_)));
    assert!(!store.is_initialized());
}

#[test]
fn open_on_unreachable_path_is_storage_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing-dir").join("names.db");

    let err = RecordStore::open(&path).err().unwrap();
    assert_eq!(err.code(), "storage_unavailable");
}
