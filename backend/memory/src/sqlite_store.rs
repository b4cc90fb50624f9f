//! SQLite-backed conversation store.
//!
//! A single `kv` table holds JSON blobs under the keys `chatHistory`,
//! `sessions` and `pendingQuestion`. Every read-modify-write runs inside an
//! IMMEDIATE transaction, so concurrent writers (other processes included)
//! serialize on the database lock instead of overwriting each other's appends.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use studybuddy_core::{ConversationStore, Session, Turn};

use crate::history::{push_bounded, turns_for_page, DEFAULT_HISTORY_CAPACITY};

const HISTORY_KEY: &str = "chatHistory";
const SESSIONS_KEY: &str = "sessions";
const PENDING_QUESTION_KEY: &str = "pendingQuestion";

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv (
     key   TEXT PRIMARY KEY,
     value TEXT NOT NULL
 );";

pub struct SqliteStore {
    conn: Mutex<Connection>,
    capacity: usize,
}

impl SqliteStore {
    /// Create or open a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create store directory {}", parent.display())
                })?;
            }
        }
        let conn = Connection::open(path).context("Failed to open SQLite conversation store")?;
        conn.execute_batch(&format!("PRAGMA journal_mode=WAL;\n{SCHEMA}"))
            .context("Failed to initialize kv schema")?;

        info!("SqliteStore opened at {:?}", path);
        Ok(Self {
            conn: Mutex::new(conn),
            capacity: DEFAULT_HISTORY_CAPACITY,
        })
    }

    /// Open an in-memory database (for tests).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            capacity: DEFAULT_HISTORY_CAPACITY,
        })
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// The whole global log, oldest first.
    pub async fn all_turns(&self) -> Result<Vec<Turn>> {
        let conn = self.conn.lock().await;
        Ok(read_json(&conn, HISTORY_KEY)?.unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// JSON blob helpers
// ---------------------------------------------------------------------------

fn read_json<T: DeserializeOwned>(conn: &Connection, key: &str) -> Result<Option<T>> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
            row.get(0)
        })
        .optional()
        .with_context(|| format!("Failed to read '{key}'"))?;
    match raw {
        Some(raw) => {
            let value = serde_json::from_str(&raw)
                .with_context(|| format!("Corrupt JSON stored under '{key}'"))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

fn write_json<T: Serialize>(tx: &Transaction<'_>, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    tx.execute(
        "INSERT INTO kv (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, raw],
    )
    .with_context(|| format!("Failed to write '{key}'"))?;
    Ok(())
}

fn begin(conn: &mut Connection) -> Result<Transaction<'_>> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
        .context("Failed to begin store transaction")
}

#[async_trait]
impl ConversationStore for SqliteStore {
    async fn append(&self, turn: Turn) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let tx = begin(&mut conn)?;
        let mut history: Vec<Turn> = read_json(&tx, HISTORY_KEY)?.unwrap_or_default();
        let evicted = push_bounded(&mut history, turn, self.capacity);
        write_json(&tx, HISTORY_KEY, &history)?;
        tx.commit().context("Failed to commit history append")?;
        debug!(len = history.len(), evicted, "Appended turn");
        Ok(())
    }

    async fn query(&self, page_title: &str) -> Result<Vec<Turn>> {
        let conn = self.conn.lock().await;
        let history: Vec<Turn> = read_json(&conn, HISTORY_KEY)?.unwrap_or_default();
        Ok(turns_for_page(&history, page_title))
    }

    async fn session(&self, session_key: &str) -> Result<Option<Session>> {
        let conn = self.conn.lock().await;
        let mut sessions: HashMap<String, Session> =
            read_json(&conn, SESSIONS_KEY)?.unwrap_or_default();
        Ok(sessions.remove(session_key))
    }

    async fn upsert_session(&self, session: Session) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let tx = begin(&mut conn)?;
        let mut sessions: HashMap<String, Session> =
            read_json(&tx, SESSIONS_KEY)?.unwrap_or_default();
        sessions.insert(session.session_key.clone(), session);
        write_json(&tx, SESSIONS_KEY, &sessions)?;
        tx.commit().context("Failed to commit session update")?;
        Ok(())
    }

    async fn set_pending_question(&self, question: &str) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let tx = begin(&mut conn)?;
        write_json(&tx, PENDING_QUESTION_KEY, &question)?;
        tx.commit().context("Failed to store pending question")?;
        Ok(())
    }

    async fn take_pending_question(&self) -> Result<Option<String>> {
        let mut conn = self.conn.lock().await;
        let tx = begin(&mut conn)?;
        let question: Option<String> = read_json(&tx, PENDING_QUESTION_KEY)?;
        if question.is_some() {
            tx.execute("DELETE FROM kv WHERE key = ?1", params![PENDING_QUESTION_KEY])?;
        }
        tx.commit().context("Failed to clear pending question")?;
        Ok(question)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn append_trims_to_capacity() {
        let store = SqliteStore::in_memory().unwrap().with_capacity(10);
        for i in 0..15 {
            store
                .append(Turn::new(format!("q{i}"), "a", "Page"))
                .await
                .unwrap();
        }
        let turns = store.all_turns().await.unwrap();
        assert_eq!(turns.len(), 10);
        assert_eq!(turns[0].user_text, "q5");
        assert_eq!(turns[9].user_text, "q14");
    }

    #[tokio::test]
    async fn concurrent_appends_keep_every_write() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let mut tasks = Vec::new();
        for worker in 0..4 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..20 {
                    store
                        .append(Turn::new(format!("w{worker}-{i}"), "a", "Page"))
                        .await
                        .unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(store.all_turns().await.unwrap().len(), 80);
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("studybuddy.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.append(Turn::new("What is ATP?", "Energy.", "Cells")).await.unwrap();
            let mut session = Session::new("abc");
            session.replace_summary("Talked about ATP.", 16);
            store.upsert_session(session).await.unwrap();
            store.set_pending_question("Explain this: ATP").await.unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        let turns = store.query("Cells").await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].assistant_text, "Energy.");
        let session = store.session("abc").await.unwrap().unwrap();
        assert_eq!(session.summary.as_deref(), Some("Talked about ATP."));
        assert_eq!(
            store.take_pending_question().await.unwrap().as_deref(),
            Some("Explain this: ATP")
        );
        assert!(store.take_pending_question().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn history_blob_uses_extension_field_names() {
        let store = SqliteStore::in_memory().unwrap();
        store.append(Turn::new("u", "a", "P")).await.unwrap();
        let conn = store.conn.lock().await;
        let raw: String = conn
            .query_row("SELECT value FROM kv WHERE key = 'chatHistory'", [], |row| row.get(0))
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json[0]["user"], "u");
        assert_eq!(json[0]["ai"], "a");
        assert_eq!(json[0]["page"], "P");
    }

    #[tokio::test]
    async fn missing_session_is_none() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.session("nope").await.unwrap().is_none());
    }
}
