use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use studybuddy_core::{ConversationStore, Session, Turn};

use crate::history::{push_bounded, turns_for_page, DEFAULT_HISTORY_CAPACITY};

#[derive(Default)]
struct StoreState {
    history: Vec<Turn>,
    sessions: HashMap<String, Session>,
    pending_question: Option<String>,
}

/// Process-local store. The whole state sits behind one async mutex so the
/// append-then-trim sequence is never interleaved.
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    capacity: usize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            capacity,
        }
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.history.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of the global log, oldest first.
    pub async fn all_turns(&self) -> Vec<Turn> {
        self.state.lock().await.history.clone()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn append(&self, turn: Turn) -> Result<()> {
        let mut state = self.state.lock().await;
        let evicted = push_bounded(&mut state.history, turn, self.capacity);
        if evicted > 0 {
            debug!(evicted, "History trimmed to capacity");
        }
        Ok(())
    }

    async fn query(&self, page_title: &str) -> Result<Vec<Turn>> {
        let state = self.state.lock().await;
        Ok(turns_for_page(&state.history, page_title))
    }

    async fn session(&self, session_key: &str) -> Result<Option<Session>> {
        Ok(self.state.lock().await.sessions.get(session_key).cloned())
    }

    async fn upsert_session(&self, session: Session) -> Result<()> {
        let mut state = self.state.lock().await;
        state.sessions.insert(session.session_key.clone(), session);
        Ok(())
    }

    async fn set_pending_question(&self, question: &str) -> Result<()> {
        self.state.lock().await.pending_question = Some(question.to_string());
        Ok(())
    }

    async fn take_pending_question(&self) -> Result<Option<String>> {
        Ok(self.state.lock().await.pending_question.take())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn never_exceeds_capacity_and_drops_earliest() {
        let store = InMemoryStore::new();
        for i in 0..130 {
            store
                .append(Turn::new(format!("q{i}"), "a", "Page"))
                .await
                .unwrap();
        }
        let turns = store.all_turns().await;
        assert_eq!(turns.len(), 100);
        assert_eq!(turns[0].user_text, "q30");
        assert_eq!(turns[99].user_text, "q129");
    }

    #[tokio::test]
    async fn concurrent_appends_are_not_lost() {
        let store = Arc::new(InMemoryStore::with_capacity(50));
        let mut tasks = Vec::new();
        for worker in 0..8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..10 {
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
        assert_eq!(store.len().await, 50);
    }

    #[tokio::test]
    async fn query_filters_by_exact_title() {
        let store = InMemoryStore::new();
        store.append(Turn::new("a", "1", "Cells")).await.unwrap();
        store.append(Turn::new("b", "2", "cells")).await.unwrap();
        store.append(Turn::new("c", "3", "Cells")).await.unwrap();
        let turns = store.query("Cells").await.unwrap();
        let users: Vec<_> = turns.iter().map(|t| t.user_text.as_str()).collect();
        assert_eq!(users, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn sessions_are_replaced_wholesale() {
        let store = InMemoryStore::new();
        assert!(store.session("k").await.unwrap().is_none());

        let mut session = Session::new("k");
        session.replace_summary("first", 16);
        store.upsert_session(session.clone()).await.unwrap();
        session.replace_summary("second", 20);
        store.upsert_session(session).await.unwrap();

        let stored = store.session("k").await.unwrap().unwrap();
        assert_eq!(stored.summary.as_deref(), Some("second"));
        assert_eq!(stored.summarized_message_count, 20);
    }

    #[tokio::test]
    async fn pending_question_is_consumed_once() {
        let store = InMemoryStore::new();
        store.set_pending_question("Explain this: ATP").await.unwrap();
        assert_eq!(
            store.take_pending_question().await.unwrap().as_deref(),
            Some("Explain this: ATP")
        );
        assert!(store.take_pending_question().await.unwrap().is_none());
    }
}
