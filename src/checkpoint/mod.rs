//! Durable, thread-scoped checkpoint storage
//!
//! Each successful turn appends an immutable snapshot of the turn state
//! keyed by `(thread_id, seq)`; "current state" for a thread is its
//! latest snapshot. The checkpoint schema is independent from the
//! conversations schema: soft-deleting a conversation never touches its
//! checkpoints, which keeps recovery and audit possible.
//!
//! The store is exposed through `CheckpointHandle`, an injected handle
//! whose underlying connection is created lazily under a lock so exactly
//! one instance exists even when concurrent requests race to initialize
//! it, and released exactly once on close.

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::Result;
use crate::state::TurnState;

/// A stored snapshot of turn state plus caller metadata
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub thread_id: String,
    pub seq: i64,
    pub state: TurnState,
    pub metadata: Map<String, Value>,
}

/// SQLite-backed checkpoint store
pub struct CheckpointDb {
    conn: Mutex<Connection>,
}

impl CheckpointDb {
    /// Open (or create) the database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.setup()?;
        Ok(db)
    }

    /// In-memory store, used by tests and non-persistent runs
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.setup()?;
        Ok(db)
    }

    /// Create the schema. Idempotent, safe to call on every startup.
    pub fn setup(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;

            CREATE TABLE IF NOT EXISTS checkpoints (
                thread_id  TEXT NOT NULL,
                seq        INTEGER NOT NULL,
                state      TEXT NOT NULL,
                metadata   TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL,
                PRIMARY KEY (thread_id, seq)
            );

            CREATE INDEX IF NOT EXISTS idx_checkpoints_thread
                ON checkpoints(thread_id, seq DESC);
            "#,
        )?;
        Ok(())
    }

    /// Append a snapshot for a thread with the next sequence number.
    ///
    /// Callers on different threads never interfere; ordering between
    /// concurrent callers on the SAME thread is the caller's
    /// responsibility.
    pub fn put(
        &self,
        thread_id: &str,
        state: &TurnState,
        metadata: &Map<String, Value>,
    ) -> Result<i64> {
        let state_json = serde_json::to_string(state)?;
        let metadata_json = serde_json::to_string(metadata)?;
        let now = Utc::now();

        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT INTO checkpoints (thread_id, seq, state, metadata, created_at)
            VALUES (
                ?1,
                (SELECT COALESCE(MAX(seq), 0) + 1 FROM checkpoints WHERE thread_id = ?1),
                ?2, ?3, ?4
            )
            "#,
            params![thread_id, state_json, metadata_json, now],
        )?;

        let seq: i64 = conn.query_row(
            "SELECT MAX(seq) FROM checkpoints WHERE thread_id = ?1",
            params![thread_id],
            |row| row.get(0),
        )?;
        Ok(seq)
    }

    /// Latest snapshot for a thread, or None when the thread has none
    pub fn latest(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                r#"
                SELECT seq, state, metadata FROM checkpoints
                WHERE thread_id = ?1
                ORDER BY seq DESC LIMIT 1
                "#,
                params![thread_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((seq, state_json, metadata_json)) => {
                let state: TurnState = serde_json::from_str(&state_json)?;
                let metadata: Map<String, Value> = serde_json::from_str(&metadata_json)?;
                Ok(Some(Checkpoint {
                    thread_id: thread_id.to_string(),
                    seq,
                    state,
                    metadata,
                }))
            }
        }
    }

    /// Number of snapshots stored for a thread
    pub fn count(&self, thread_id: &str) -> Result<i64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM checkpoints WHERE thread_id = ?1",
            params![thread_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

/// Where a checkpoint handle keeps its data
#[derive(Debug, Clone)]
pub enum CheckpointLocation {
    /// Durable SQLite file
    Path(PathBuf),
    /// Process-local, lost on shutdown
    InMemory,
}

/// Lazily-initialized, shared handle to the checkpoint store.
///
/// Cloning shares the same underlying resource. Initialization happens
/// on first use under an async lock, so racing callers still produce a
/// single connection; `close` drops the connection exactly once and is
/// safe to call when initialization never ran.
#[derive(Clone)]
pub struct CheckpointHandle {
    location: CheckpointLocation,
    inner: Arc<tokio::sync::Mutex<Option<Arc<CheckpointDb>>>>,
}

impl CheckpointHandle {
    pub fn new(location: CheckpointLocation) -> Self {
        Self {
            location,
            inner: Arc::new(tokio::sync::Mutex::new(None)),
        }
    }

    /// Get the store, initializing it on first use
    pub async fn get(&self) -> Result<Arc<CheckpointDb>> {
        let mut guard = self.inner.lock().await;
        if let Some(db) = guard.as_ref() {
            return Ok(db.clone());
        }

        info!("initializing checkpoint store");
        let db = match &self.location {
            CheckpointLocation::Path(path) => Arc::new(CheckpointDb::open(path)?),
            CheckpointLocation::InMemory => Arc::new(CheckpointDb::in_memory()?),
        };
        *guard = Some(db.clone());
        Ok(db)
    }

    /// Release the underlying connection. Safe to call repeatedly and
    /// before any initialization happened.
    pub async fn close(&self) {
        let mut guard = self.inner.lock().await;
        if guard.take().is_some() {
            info!("checkpoint store closed");
        } else {
            warn!("checkpoint close called before initialization; nothing to release");
        }
    }
}
