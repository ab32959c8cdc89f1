//! Integration tests for inbox-store
//!
//! These tests exercise the `TaskStore` contract against an on-disk SQLite
//! database.

use inbox_domain::{NoteId, Priority, TaskQuery, TaskRecord, TaskStatus, TaskStore};
use inbox_store::SqliteTaskStore;
use tempfile::TempDir;

fn record(note: &str, project: &str, priority: Priority) -> TaskRecord {
    TaskRecord {
        title: format!("Task from {}", note),
        project: project.to_string(),
        priority,
        status: TaskStatus::Processed,
        body: "## Summary\n\nSomething to do".to_string(),
        source_note_id: NoteId::new(note),
    }
}

#[test]
fn test_store_initialization() {
    let store = SqliteTaskStore::new(":memory:");
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[tokio::test]
async fn test_create_and_query_roundtrip() {
    let store = SqliteTaskStore::in_memory().unwrap();
    let mut original = record("note-1", "Work", Priority::Critical);
    original.status = TaskStatus::Ambiguous;

    let id = store.create(&original).await.unwrap();
    let found = store
        .query(&TaskQuery::for_note(NoteId::new("note-1")))
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, id);
    assert_eq!(found[0].record, original);
}

#[tokio::test]
async fn test_create_is_idempotent_per_note() {
    let store = SqliteTaskStore::in_memory().unwrap();

    let first = store.create(&record("n1", "Work", Priority::High)).await.unwrap();
    let second = store.create(&record("n1", "Work", Priority::High)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(store.count().unwrap(), 1);
}

#[tokio::test]
async fn test_query_filters() {
    let store = SqliteTaskStore::in_memory().unwrap();
    store.create(&record("a", "Work", Priority::Low)).await.unwrap();
    store.create(&record("b", "Work", Priority::High)).await.unwrap();
    store.create(&record("c", "Home", Priority::Critical)).await.unwrap();
    store.create(&record("d", "Work", Priority::Critical)).await.unwrap();

    let work_urgent = store
        .query(&TaskQuery {
            project: Some("Work".into()),
            min_priority: Some(Priority::High),
            ..Default::default()
        })
        .await
        .unwrap();
    let notes: Vec<&str> = work_urgent
        .iter()
        .map(|t| t.record.source_note_id.as_str())
        .collect();
    assert_eq!(notes, vec!["b", "d"]);

    let limited = store
        .query(&TaskQuery {
            limit: Some(3),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(limited.len(), 3);

    let all = store.query(&TaskQuery::default()).await.unwrap();
    assert_eq!(all.len(), 4);
}

#[tokio::test]
async fn test_persistence_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("inbox.db");

    let id = {
        let store = SqliteTaskStore::new(&path).unwrap();
        store.create(&record("n1", "Work", Priority::Medium)).await.unwrap()
    };

    let reopened = SqliteTaskStore::new(&path).unwrap();
    assert_eq!(reopened.count().unwrap(), 1);

    // Re-running the same note after a restart still maps to the same record
    let again = reopened
        .create(&record("n1", "Work", Priority::Medium))
        .await
        .unwrap();
    assert_eq!(again, id);
}

#[tokio::test]
async fn test_concurrent_creates_share_one_store() {
    let store = std::sync::Arc::new(SqliteTaskStore::in_memory().unwrap());

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            // Every other task reuses note "shared"
            let note = if i % 2 == 0 {
                "shared".to_string()
            } else {
                format!("n{}", i)
            };
            store.create(&record(&note, "Work", Priority::Low)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.count().unwrap(), 5);
}
