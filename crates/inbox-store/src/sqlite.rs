//! SQLite-backed task store

use crate::{now_secs, validate_record, StoreError};
use async_trait::async_trait;
use inbox_domain::{
    NoteId, Priority, RecordId, StoredTask, TaskQuery, TaskRecord, TaskStatus, TaskStore,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

const SELECT_COLUMNS: &str =
    "SELECT id, title, project, priority, status, body, source_note_id, created_at FROM tasks";

/// SQLite-based implementation of TaskStore
///
/// The connection sits behind a mutex so one store can be shared by every
/// note of a concurrent batch. The async [`TaskStore`] methods run their
/// statements on tokio's blocking pool, never on a runtime worker.
pub struct SqliteTaskStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTaskStore {
    /// Open (or create) a store at `path`
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```
    /// use inbox_store::SqliteTaskStore;
    ///
    /// let store = SqliteTaskStore::new(":memory:").unwrap();
    /// assert_eq!(store.count().unwrap(), 0);
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open a fresh in-memory store
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::new(":memory:")
    }

    /// Number of stored tasks
    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Fetch one task by id
    pub fn get(&self, id: &RecordId) -> Result<Option<StoredTask>, StoreError> {
        let conn = self.lock()?;
        let task = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id.as_str()],
                row_to_task,
            )
            .optional()?;
        Ok(task)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Lock)
    }

    /// Run `op` against the connection on the blocking pool
    async fn blocking<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StoreError::Lock)?;
            op(&conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("Task join error: {}", e)))?
    }
}

fn insert_task(conn: &Connection, record: &TaskRecord) -> Result<RecordId, StoreError> {
    validate_record(record)?;

    let id = RecordId::generate();
    let inserted = conn.execute(
        "INSERT INTO tasks (id, title, project, priority, priority_rank, status, body, source_note_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(source_note_id) DO NOTHING",
        params![
            id.as_str(),
            &record.title,
            &record.project,
            record.priority.as_str(),
            priority_rank(record.priority),
            record.status.as_str(),
            &record.body,
            record.source_note_id.as_str(),
            now_secs() as i64,
        ],
    )?;

    if inserted == 1 {
        debug!(record_id = %id, note_id = %record.source_note_id, "Task created");
        return Ok(id);
    }

    let existing: String = conn.query_row(
        "SELECT id FROM tasks WHERE source_note_id = ?1",
        params![record.source_note_id.as_str()],
        |row| row.get(0),
    )?;
    debug!(record_id = %existing, note_id = %record.source_note_id, "Task already stored for note");
    Ok(RecordId::new(existing))
}

fn select_tasks(conn: &Connection, query: &TaskQuery) -> Result<Vec<StoredTask>, StoreError> {
    let mut sql = format!("{} WHERE 1=1", SELECT_COLUMNS);
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(project) = &query.project {
        sql.push_str(" AND project = ?");
        params.push(Box::new(project.clone()));
    }

    if let Some(note_id) = &query.source_note_id {
        sql.push_str(" AND source_note_id = ?");
        params.push(Box::new(note_id.as_str().to_string()));
    }

    if let Some(min_priority) = query.min_priority {
        sql.push_str(" AND priority_rank >= ?");
        params.push(Box::new(priority_rank(min_priority)));
    }

    sql.push_str(" ORDER BY created_at ASC, rowid ASC");

    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        params.push(Box::new(limit as i64));
    }

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

    let tasks = stmt
        .query_map(&param_refs[..], row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(tasks)
}

fn priority_rank(priority: Priority) -> i64 {
    match priority {
        Priority::Low => 0,
        Priority::Medium => 1,
        Priority::High => 2,
        Priority::Critical => 3,
    }
}

fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        Box::new(StoreError::InvalidData(message)),
    )
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<StoredTask> {
    let priority: String = row.get(3)?;
    let priority = priority
        .parse::<Priority>()
        .map_err(|e| conversion_error(3, e))?;

    let status: String = row.get(4)?;
    let status = status
        .parse::<TaskStatus>()
        .map_err(|e| conversion_error(4, e))?;

    Ok(StoredTask {
        id: RecordId::new(row.get::<_, String>(0)?),
        record: TaskRecord {
            title: row.get(1)?,
            project: row.get(2)?,
            priority,
            status,
            body: row.get(5)?,
            source_note_id: NoteId::new(row.get::<_, String>(6)?),
        },
        created_at: row.get::<_, i64>(7)? as u64,
    })
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    type Error = StoreError;

    async fn create(&self, record: &TaskRecord) -> Result<RecordId, Self::Error> {
        validate_record(record)?;
        let record = record.clone();
        self.blocking(move |conn| insert_task(conn, &record)).await
    }

    async fn query(&self, query: &TaskQuery) -> Result<Vec<StoredTask>, Self::Error> {
        let query = query.clone();
        self.blocking(move |conn| select_tasks(conn, &query)).await
    }
}
