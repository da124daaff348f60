//! Dataset Store Tests
//!
//! Store behavior as seen by the query engine:
//! - Memory stores keep insertion order and reject bad ids
//! - File stores read the persisted `{Dataset, Data}` layout
//! - Any store failure surfaces as a dataset-not-found rejection

use std::fs;
use std::sync::Arc;

use insightdb::dataset::{Dataset, DatasetError, DatasetStore, FileStore, MemoryStore};
use insightdb::executor::QueryEngine;
use insightdb::query::QueryErrorCode;
use insightdb::schema::Kind;
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn write_dataset(dir: &TempDir, id: &str, kind: &str, rows: Value) {
    let count = rows.as_array().map(|r| r.len()).unwrap_or(0);
    let body = json!({
        "Dataset": {"id": id, "kind": kind, "numRows": count},
        "Data": rows
    });
    fs::write(dir.path().join(format!("{}.json", id)), body.to_string()).unwrap();
}

fn rooms_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_dataset(
        &dir,
        "rooms",
        "rooms",
        json!([
            {"rooms_shortname": "DMP", "rooms_seats": 160, "rooms_furniture": "Tables"},
            {"rooms_shortname": "DMP", "rooms_seats": 40, "rooms_furniture": "Chairs"},
            {"rooms_shortname": "ANGU", "rooms_seats": 260, "rooms_furniture": "Tables"}
        ]),
    );
    dir
}

// =============================================================================
// Memory Store Tests
// =============================================================================

/// Ids come back in insertion order; duplicates and bad ids are refused.
#[test]
fn test_memory_store_add_rules() {
    let store = MemoryStore::new();
    assert_eq!(
        store.add(Dataset::new("b", Kind::Rooms, vec![])).unwrap(),
        vec!["b"]
    );
    assert_eq!(
        store.add(Dataset::new("a", Kind::Courses, vec![])).unwrap(),
        vec!["b", "a"]
    );

    assert!(matches!(
        store.add(Dataset::new("a", Kind::Courses, vec![])),
        Err(DatasetError::AlreadyExists(_))
    ));
    assert!(matches!(
        store.add(Dataset::new("has_underscore", Kind::Courses, vec![])),
        Err(DatasetError::InvalidId(_))
    ));
    assert!(matches!(
        store.add(Dataset::new(" ", Kind::Courses, vec![])),
        Err(DatasetError::InvalidId(_))
    ));
}

/// Removed datasets are no longer queryable.
#[test]
fn test_memory_store_remove_then_query() {
    let store = MemoryStore::new();
    store
        .add(Dataset::new("rooms", Kind::Rooms, vec![]))
        .unwrap();
    assert_eq!(store.remove("rooms").unwrap(), "rooms");
    assert!(store.remove("rooms").unwrap_err().is_not_found());

    let err = QueryEngine::new(&store)
        .execute(&json!({"WHERE": {}, "OPTIONS": {"COLUMNS": ["rooms_name"]}}))
        .unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::DatasetNotFound);
}

/// Engines on several threads share one store through an `Arc`.
#[test]
fn test_shared_store() {
    let store = Arc::new(MemoryStore::new());
    store
        .add(Dataset::new(
            "rooms",
            Kind::Rooms,
            vec![json!({"rooms_shortname": "DMP", "rooms_seats": 160})
                .as_object()
                .cloned()
                .unwrap()],
        ))
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                QueryEngine::new(&store)
                    .execute(&json!({
                        "WHERE": {"GT": {"rooms_seats": 100}},
                        "OPTIONS": {"COLUMNS": ["rooms_shortname"]}
                    }))
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        let rows = handle.join().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["rooms_shortname"], json!("DMP"));
    }
    assert_eq!(store.list().unwrap()[0].num_rows, 1);
}

// =============================================================================
// File Store Tests
// =============================================================================

/// Persisted datasets load with their kind and rows.
#[test]
fn test_file_store_load() {
    let dir = rooms_dir();
    let store = FileStore::new(dir.path());
    let dataset = store.load("rooms").unwrap();
    assert_eq!(dataset.kind, Kind::Rooms);
    assert_eq!(dataset.rows.len(), 3);
}

/// Listing is sorted by id and reports row counts.
#[test]
fn test_file_store_list_sorted() {
    let dir = rooms_dir();
    write_dataset(&dir, "archive", "courses", json!([]));
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let listing = FileStore::new(dir.path()).list().unwrap();
    let ids: Vec<&str> = listing.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["archive", "rooms"]);
    assert_eq!(listing[1].num_rows, 3);
}

/// Missing, malformed and path-like ids never load.
#[test]
fn test_file_store_failures() {
    let dir = rooms_dir();
    fs::write(dir.path().join("broken.json"), "{not json").unwrap();
    let store = FileStore::new(dir.path());

    assert!(store.load("absent").unwrap_err().is_not_found());
    assert!(matches!(
        store.load("broken"),
        Err(DatasetError::Malformed { .. })
    ));
    assert!(matches!(
        store.load("../rooms"),
        Err(DatasetError::InvalidId(_))
    ));
}

/// A file whose header names another id is malformed.
#[test]
fn test_file_store_header_mismatch() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("rooms.json"),
        json!({"Dataset": {"id": "other", "kind": "rooms", "numRows": 0}, "Data": []})
            .to_string(),
    )
    .unwrap();
    assert!(matches!(
        FileStore::new(dir.path()).load("rooms"),
        Err(DatasetError::Malformed { .. })
    ));
}

// =============================================================================
// Engine Over File Store
// =============================================================================

/// Full query over a persisted rooms dataset.
#[test]
fn test_query_over_file_store() {
    let dir = rooms_dir();
    let store = FileStore::new(dir.path());
    let rows = QueryEngine::new(&store)
        .execute(&json!({
            "WHERE": {"IS": {"rooms_furniture": "*ables"}},
            "OPTIONS": {
                "COLUMNS": ["rooms_shortname", "maxSeats", "kinds"],
                "ORDER": {"dir": "DOWN", "keys": ["maxSeats"]}
            },
            "TRANSFORMATIONS": {
                "GROUP": ["rooms_shortname"],
                "APPLY": [
                    {"maxSeats": {"MAX": "rooms_seats"}},
                    {"kinds": {"COUNT": "rooms_furniture"}}
                ]
            }
        }))
        .unwrap();

    let rows: Vec<Value> = rows.into_iter().map(Value::Object).collect();
    assert_eq!(
        rows,
        vec![
            json!({"rooms_shortname": "ANGU", "maxSeats": 260, "kinds": 1}),
            json!({"rooms_shortname": "DMP", "maxSeats": 160, "kinds": 1}),
        ]
    );
}

/// Malformed backing data is reported as a missing dataset.
#[test]
fn test_malformed_file_is_dataset_not_found() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("rooms.json"), "[]").unwrap();
    let store = FileStore::new(dir.path());

    let err = QueryEngine::new(&store)
        .execute(&json!({"WHERE": {}, "OPTIONS": {"COLUMNS": ["rooms_name"]}}))
        .unwrap_err();
    assert_eq!(err.code(), QueryErrorCode::DatasetNotFound);
    assert!(err.message().contains("Malformed"));
}
