//! SQLite-backed conversation registry
//!
//! Deletion is soft: the row is flagged and vanishes from lists and
//! lookups, but the thread's checkpoints (a separate schema) are never
//! touched, so history stays recoverable and auditable.

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use crate::conversations::models::Conversation;
use crate::errors::Result;

pub struct ConversationDb {
    conn: Mutex<Connection>,
}

impl ConversationDb {
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

    /// In-memory registry, used by tests
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

            CREATE TABLE IF NOT EXISTS conversations (
                id         TEXT PRIMARY KEY,
                thread_id  TEXT NOT NULL UNIQUE,
                title      TEXT,
                user_id    TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                is_deleted INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_conversations_updated
                ON conversations(is_deleted, updated_at DESC);
            "#,
        )?;
        Ok(())
    }

    /// Create a conversation with server-generated ids.
    ///
    /// The thread id is never client-supplied; collisions are practically
    /// impossible and would surface as a uniqueness error.
    pub fn create(&self, title: Option<&str>, user_id: Option<&str>) -> Result<Conversation> {
        let id = Uuid::new_v4().to_string();
        let thread_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT INTO conversations (id, thread_id, title, user_id, created_at, updated_at, is_deleted)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5, 0)
            "#,
            params![id, thread_id, title, user_id, now],
        )?;
        info!(thread_id, "conversation created");

        Ok(Conversation {
            id,
            thread_id,
            title: title.map(str::to_string),
            user_id: user_id.map(str::to_string),
            created_at: now,
            updated_at: now,
            is_deleted: false,
        })
    }

    /// Look up a live conversation; soft-deleted threads resolve as absent
    pub fn get(&self, thread_id: &str) -> Result<Option<Conversation>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM conversations WHERE thread_id = ?1 AND is_deleted = 0",
                    COLUMNS
                ),
                params![thread_id],
                row_to_conversation,
            )
            .optional()?;
        Ok(row)
    }

    /// List conversations, most recently active first, with the total
    /// count of rows matching the deletion filter (for pagination).
    pub fn list(
        &self,
        limit: i64,
        offset: i64,
        include_deleted: bool,
    ) -> Result<(Vec<Conversation>, i64)> {
        let deleted_max: i64 = if include_deleted { 1 } else { 0 };

        let conn = self.conn.lock();
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM conversations WHERE is_deleted <= ?1",
            params![deleted_max],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM conversations
            WHERE is_deleted <= ?1
            ORDER BY updated_at DESC
            LIMIT ?2 OFFSET ?3
            "#,
            COLUMNS
        ))?;
        let rows = stmt.query_map(params![deleted_max, limit, offset], row_to_conversation)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok((items, total))
    }

    /// Rename a conversation, bumping its activity timestamp. Returns
    /// None when the thread is absent or soft-deleted; a deleted row is
    /// never updated.
    pub fn update(&self, thread_id: &str, title: &str) -> Result<Option<Conversation>> {
        let now = Utc::now();
        let changed = {
            let conn = self.conn.lock();
            conn.execute(
                r#"
                UPDATE conversations SET title = ?2, updated_at = ?3
                WHERE thread_id = ?1 AND is_deleted = 0
                "#,
                params![thread_id, title, now],
            )?
        };

        if changed == 0 {
            return Ok(None);
        }
        self.get(thread_id)
    }

    /// Mark a conversation as having new activity
    pub fn touch(&self, thread_id: &str) -> Result<()> {
        let now = Utc::now();
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE conversations SET updated_at = ?2 WHERE thread_id = ?1 AND is_deleted = 0",
            params![thread_id, now],
        )?;
        Ok(())
    }

    /// Soft-delete a conversation, returning whether a row was affected.
    /// Idempotent: a second delete (or a delete of a missing thread)
    /// returns false. Checkpoints for the thread are left intact.
    pub fn soft_delete(&self, thread_id: &str) -> Result<bool> {
        let changed = {
            let conn = self.conn.lock();
            conn.execute(
                "UPDATE conversations SET is_deleted = 1 WHERE thread_id = ?1 AND is_deleted = 0",
                params![thread_id],
            )?
        };
        if changed > 0 {
            info!(thread_id, "conversation deleted");
        } else {
            debug!(thread_id, "delete on absent conversation; no-op");
        }
        Ok(changed > 0)
    }
}

const COLUMNS: &str = "id, thread_id, title, user_id, created_at, updated_at, is_deleted";

fn row_to_conversation(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        title: row.get(2)?,
        user_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        is_deleted: row.get::<_, i64>(6)? != 0,
    })
}
