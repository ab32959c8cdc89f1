//! In-memory task store

use crate::{now_secs, validate_record, StoreError};
use async_trait::async_trait;
use inbox_domain::{NoteId, RecordId, StoredTask, TaskQuery, TaskRecord, TaskStore};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Inner {
    tasks: Vec<StoredTask>,
    by_note: HashMap<NoteId, RecordId>,
    failing_notes: HashSet<NoteId>,
    create_calls: usize,
}

/// Task store kept in process memory
///
/// Same de-duplication contract as [`crate::SqliteTaskStore`]. Clones share
/// state, so a test can keep a handle while the pipeline owns another.
///
/// # Examples
///
/// ```
/// use inbox_domain::{NoteId, Priority, TaskRecord, TaskStatus, TaskStore};
/// use inbox_store::MemoryTaskStore;
///
/// # let rt = tokio::runtime::Runtime::new().unwrap();
/// # rt.block_on(async {
/// let store = MemoryTaskStore::new();
/// let record = TaskRecord {
///     title: "Fix outage".into(),
///     project: "Work".into(),
///     priority: Priority::Critical,
///     status: TaskStatus::Processed,
///     body: String::new(),
///     source_note_id: NoteId::new("n1"),
/// };
///
/// let first = store.create(&record).await.unwrap();
/// let again = store.create(&record).await.unwrap();
/// assert_eq!(first, again);
/// assert_eq!(store.len(), 1);
/// assert_eq!(store.create_calls(), 2);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTaskStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryTaskStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tasks
    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    /// Whether nothing has been stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `create` calls received, including duplicates and failures
    pub fn create_calls(&self) -> usize {
        self.lock().create_calls
    }

    /// Snapshot of every stored task, in insertion order
    pub fn tasks(&self) -> Vec<StoredTask> {
        self.lock().tasks.clone()
    }

    /// Make every `create` for `note_id` fail with a validation error
    pub fn fail_note(&self, note_id: impl Into<NoteId>) {
        self.lock().failing_notes.insert(note_id.into());
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    type Error = StoreError;

    async fn create(&self, record: &TaskRecord) -> Result<RecordId, Self::Error> {
        let mut inner = self.lock();
        inner.create_calls += 1;

        if inner.failing_notes.contains(&record.source_note_id) {
            return Err(StoreError::Validation(format!(
                "store rejected note {}",
                record.source_note_id
            )));
        }
        validate_record(record)?;

        if let Some(existing) = inner.by_note.get(&record.source_note_id) {
            return Ok(existing.clone());
        }

        let id = RecordId::generate();
        inner
            .by_note
            .insert(record.source_note_id.clone(), id.clone());
        inner.tasks.push(StoredTask {
            id: id.clone(),
            record: record.clone(),
            created_at: now_secs(),
        });
        Ok(id)
    }

    async fn query(&self, query: &TaskQuery) -> Result<Vec<StoredTask>, Self::Error> {
        let inner = self.lock();
        let matching = inner
            .tasks
            .iter()
            .filter(|task| query.matches(&task.record))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;
    use inbox_domain::Priority;

    #[tokio::test]
    async fn test_create_and_query() {
        let store = MemoryTaskStore::new();
        store.create(&record("n1", "Work", Priority::High)).await.unwrap();
        store.create(&record("n2", "Home", Priority::Low)).await.unwrap();

        let work = store
            .query(&TaskQuery {
                project: Some("Work".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(work.len(), 1);
        assert_eq!(work[0].record.source_note_id, NoteId::new("n1"));
    }

    #[tokio::test]
    async fn test_limit() {
        let store = MemoryTaskStore::new();
        for i in 0..5 {
            store
                .create(&record(&format!("n{}", i), "Work", Priority::Medium))
                .await
                .unwrap();
        }
        let query = TaskQuery {
            limit: Some(2),
            ..Default::default()
        };
        assert_eq!(store.query(&query).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failing_note() {
        let store = MemoryTaskStore::new();
        store.fail_note("bad");

        let result = store.create(&record("bad", "Work", Priority::High)).await;
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert!(store.is_empty());
        assert_eq!(store.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let store = MemoryTaskStore::new();
        let handle = store.clone();
        store.create(&record("n1", "Work", Priority::High)).await.unwrap();
        assert_eq!(handle.len(), 1);
    }
}
