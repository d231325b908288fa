// ABOUTME: Tests for Store - basic access, typed models, change tracking.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::*;
use crate::transcript::{Event, Transcript};

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct Progress {
    #[serde(default)]
    attempts: u32,
    #[serde(default)]
    notes: Vec<String>,
}

#[test]
fn test_set_and_get() {
    let store = Store::new();
    assert!(store.set("answer", 42).is_none());
    assert_eq!(store.get("answer"), Some(json!(42)));
    assert_eq!(store.set("answer", 43), Some(json!(42)));
}

#[test]
fn test_get_missing_returns_none() {
    let store = Store::new();
    assert!(store.get("missing").is_none());
    assert!(!store.contains("missing"));
}

#[test]
fn test_get_or_inserts_default() {
    let store = Store::new();
    assert_eq!(store.get_or("count", 0), json!(0));
    assert!(store.contains("count"));

    store.set("count", 5);
    assert_eq!(store.get_or("count", 0), json!(5));
}

#[test]
fn test_delete() {
    let store = Store::new();
    store.set("k", "v");
    assert_eq!(store.delete("k"), Some(json!("v")));
    assert!(store.is_empty());
    assert!(store.delete("k").is_none());
}

#[test]
fn test_keys_and_items_are_sorted() {
    let store = Store::new();
    store.set("b", 2);
    store.set("a", 1);

    assert_eq!(store.keys(), vec!["a", "b"]);
    assert_eq!(
        store.items(),
        vec![("a".to_string(), json!(1)), ("b".to_string(), json!(2))]
    );
    assert_eq!(store.len(), 2);
}

#[test]
fn test_clone_shares_state() {
    let store = Store::new();
    let clone = store.clone();
    store.set("shared", true);
    assert_eq!(clone.get("shared"), Some(json!(true)));
}

#[test]
fn test_get_as_typed() {
    let store = Store::new();
    store.set_as("names", &vec!["a", "b"]).unwrap();

    let names: Vec<String> = store.get_as("names").unwrap().unwrap();
    assert_eq!(names, vec!["a", "b"]);

    let wrong: Result<Option<u32>, _> = store.get_as("names");
    assert!(wrong.is_err());
}

#[test]
fn test_model_fields_are_namespaced() {
    let store = Store::new();
    let progress = Progress {
        attempts: 2,
        notes: vec!["first".into()],
    };
    store.save_model("Progress", &progress).unwrap();

    assert_eq!(store.get("Progress:attempts"), Some(json!(2)));
    assert_eq!(store.get("Progress:notes"), Some(json!(["first"])));

    let loaded: Progress = store.load_model("Progress").unwrap();
    assert_eq!(loaded, progress);
}

#[test]
fn test_model_instances_do_not_collide() {
    let store = Store::new();
    store
        .save_model("Progress:a", &Progress { attempts: 1, notes: vec![] })
        .unwrap();
    store
        .save_model("Progress", &Progress { attempts: 9, notes: vec![] })
        .unwrap();

    let a: Progress = store.load_model("Progress:a").unwrap();
    let base: Progress = store.load_model("Progress").unwrap();
    assert_eq!(a.attempts, 1);
    assert_eq!(base.attempts, 9);
}

#[test]
fn test_load_model_uses_defaults_for_missing_fields() {
    let store = Store::new();
    let loaded: Progress = store.load_model("Progress").unwrap();
    assert_eq!(loaded, Progress::default());
}

#[test]
fn test_save_model_rejects_non_objects() {
    let store = Store::new();
    let result = store.save_model("n", &5);
    assert!(matches!(result, Err(crate::error::StoreError::NotAnObject(_))));
}

#[test]
fn test_store_changes_detects_add_replace_remove() {
    let before = Store::from_map([
        ("keep".to_string(), json!(1)),
        ("replace".to_string(), json!(1)),
        ("remove".to_string(), json!(1)),
    ])
    .snapshot();
    let after = Store::from_map([
        ("keep".to_string(), json!(1)),
        ("replace".to_string(), json!(2)),
        ("add".to_string(), json!(3)),
    ])
    .snapshot();

    let changes = store_changes(&before, &after);
    let summary: Vec<_> = changes.iter().map(|c| (c.op, c.key.as_str())).collect();
    assert_eq!(
        summary,
        vec![
            (StoreOp::Add, "add"),
            (StoreOp::Remove, "remove"),
            (StoreOp::Replace, "replace"),
        ]
    );
    assert!(changes[1].value.is_none());
}

#[tokio::test]
async fn test_track_store_changes_records_event() {
    let store = Store::new();
    let transcript = Transcript::new();

    track_store_changes(&store, &transcript, async {
        store.set("x", 1);
    })
    .await;

    let events = transcript.events();
    assert_eq!(events.len(), 1);
    let Event::Store(event) = &events[0] else {
        panic!("Expected store event");
    };
    assert_eq!(event.changes[0].key, "x");
    assert_eq!(event.changes[0].op, StoreOp::Add);
}

#[tokio::test]
async fn test_track_store_changes_skips_noop() {
    let store = Store::new();
    store.set("x", 1);
    let transcript = Transcript::new();

    track_store_changes(&store, &transcript, async {
        store.set("x", 1);
        store.get("x")
    })
    .await;

    assert!(transcript.is_empty());
}
