//! Summarization trigger and compactor.
//!
//! When a page's history grows past the policy thresholds, the whole history
//! is rendered as a transcript and sent to the chat endpoint with a request
//! for a short synthesis. The reply replaces the session summary wholesale.
//! The raw turn log is never modified.
//!
//! Compaction is best effort: any failure (endpoint or store) is logged and
//! reported as [`CompactionOutcome::Skipped`], leaving the previous summary in
//! place.

use std::sync::Arc;

use tracing::{debug, info, warn};

use studybuddy_core::{ChatEndpoint, ChatRequest, ConversationStore, Session, Turn};

/// Thresholds that decide when a history is too large to send as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryPolicy {
    /// Compact once the history holds more turns than this.
    pub max_turns: usize,
    /// Compact once user + assistant text exceeds this many chars.
    pub max_chars: usize,
}

impl Default for SummaryPolicy {
    fn default() -> Self {
        Self {
            max_turns: 15,
            max_chars: 5000,
        }
    }
}

/// What a call to [`Summarizer::maybe_compact`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompactionOutcome {
    NotNeeded,
    /// The session summary was replaced; carries the new summary.
    Compacted(String),
    /// Compaction was due but could not complete.
    Skipped(String),
}

/// Does `history` exceed either threshold?
pub fn should_compact(history: &[Turn], policy: &SummaryPolicy) -> bool {
    if history.len() > policy.max_turns {
        return true;
    }
    let total: usize = history.iter().map(Turn::char_len).sum();
    total > policy.max_chars
}

fn render_transcript(history: &[Turn]) -> String {
    history
        .iter()
        .map(|turn| format!("User: {}\nAssistant: {}", turn.user_text, turn.assistant_text))
        .collect::<Vec<_>>()
        .join("\n")
}

fn summary_prompt(history: &[Turn]) -> String {
    format!(
        "Summarize the following study conversation in 2-3 concise sentences. \
         Focus on the topics discussed, the questions asked, and the key points explained.\n\n\
         {}\n\nSummary:",
        render_transcript(history)
    )
}

pub struct Summarizer {
    endpoint: Arc<dyn ChatEndpoint>,
    store: Arc<dyn ConversationStore>,
    policy: SummaryPolicy,
}

impl Summarizer {
    pub fn new(
        endpoint: Arc<dyn ChatEndpoint>,
        store: Arc<dyn ConversationStore>,
        policy: SummaryPolicy,
    ) -> Self {
        Self {
            endpoint,
            store,
            policy,
        }
    }

    pub fn policy(&self) -> &SummaryPolicy {
        &self.policy
    }

    /// Compact `history` into the session stored under `session_key` if the
    /// policy says so.
    pub async fn maybe_compact(&self, session_key: &str, history: &[Turn]) -> CompactionOutcome {
        if !should_compact(history, &self.policy) {
            return CompactionOutcome::NotNeeded;
        }

        let existing = match self.store.session(session_key).await {
            Ok(existing) => existing,
            Err(e) => {
                warn!(session = session_key, error = %e, "Could not load session; skipping summary");
                return CompactionOutcome::Skipped(e.to_string());
            }
        };

        // Nothing new since the last synthesis.
        if let Some(session) = &existing {
            if session.covers(history) {
                debug!(session = session_key, "Summary already covers history");
                return CompactionOutcome::NotNeeded;
            }
        }

        debug!(session = session_key, turns = history.len(), "Compacting history");
        let reply = match self.endpoint.send(&ChatRequest::new(summary_prompt(history))).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session = session_key, error = %e, "Summarization failed; keeping previous summary");
                return CompactionOutcome::Skipped(e.to_string());
            }
        };

        let summary = reply.response.trim().to_string();
        let mut session = existing.unwrap_or_else(|| Session::new(session_key));
        session.summarize_turns(summary.clone(), history);
        if let Err(e) = self.store.upsert_session(session).await {
            warn!(session = session_key, error = %e, "Could not store summary");
            return CompactionOutcome::Skipped(e.to_string());
        }

        info!(session = session_key, turns = history.len(), "Session summary updated");
        CompactionOutcome::Compacted(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studybuddy_memory::InMemoryStore;
    use studybuddy_providers::ScriptedEndpoint;

    fn turns(n: usize, user: &str, assistant: &str) -> Vec<Turn> {
        (0..n).map(|_| Turn::new(user, assistant, "Page")).collect()
    }

    #[test]
    fn trigger_thresholds() {
        let policy = SummaryPolicy::default();
        assert!(should_compact(&turns(16, "a", ""), &policy));
        assert!(!should_compact(&turns(15, "a", ""), &policy));
        assert!(should_compact(&turns(10, &"u".repeat(300), &"a".repeat(300)), &policy));
        assert!(!should_compact(&turns(5, &"u".repeat(50), &"a".repeat(50)), &policy));
        // Exactly at the char limit does not fire.
        assert!(!should_compact(&turns(5, &"u".repeat(500), &"a".repeat(500)), &policy));
    }

    #[test]
    fn transcript_alternates_speakers() {
        let history = vec![Turn::new("q1", "a1", "P"), Turn::new("q2", "a2", "P")];
        assert_eq!(
            render_transcript(&history),
            "User: q1\nAssistant: a1\nUser: q2\nAssistant: a2"
        );
    }

    #[tokio::test]
    async fn compaction_replaces_summary() {
        let store = Arc::new(InMemoryStore::new());
        let endpoint = Arc::new(ScriptedEndpoint::new("mock").then_reply("  They covered ATP.  "));
        let summarizer = Summarizer::new(endpoint.clone(), store.clone(), SummaryPolicy::default());

        let mut old = Session::new("key");
        old.replace_summary("Old summary.", 3);
        store.upsert_session(old).await.unwrap();

        let history = turns(16, "What is ATP?", "Energy currency.");
        let outcome = summarizer.maybe_compact("key", &history).await;
        assert_eq!(outcome, CompactionOutcome::Compacted("They covered ATP.".into()));

        let session = store.session("key").await.unwrap().unwrap();
        assert_eq!(session.summary.as_deref(), Some("They covered ATP."));
        assert_eq!(session.summarized_message_count, 16);

        let prompts = endpoint.prompts().await;
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("2-3 concise sentences"));
        assert!(prompts[0].contains("User: What is ATP?\nAssistant: Energy currency."));
    }

    #[tokio::test]
    async fn failure_keeps_previous_summary() {
        let store = Arc::new(InMemoryStore::new());
        let endpoint = Arc::new(ScriptedEndpoint::new("mock").then_fail(500, "offline"));
        let summarizer = Summarizer::new(endpoint, store.clone(), SummaryPolicy::default());

        let mut old = Session::new("key");
        old.replace_summary("Old summary.", 3);
        store.upsert_session(old).await.unwrap();

        let outcome = summarizer.maybe_compact("key", &turns(20, "q", "a")).await;
        assert_eq!(outcome, CompactionOutcome::Skipped("offline".into()));
        let session = store.session("key").await.unwrap().unwrap();
        assert_eq!(session.summary.as_deref(), Some("Old summary."));
    }

    #[tokio::test]
    async fn small_history_makes_no_call() {
        let store = Arc::new(InMemoryStore::new());
        let endpoint = Arc::new(ScriptedEndpoint::new("mock"));
        let summarizer = Summarizer::new(endpoint.clone(), store.clone(), SummaryPolicy::default());

        let outcome = summarizer.maybe_compact("key", &turns(2, "q", "a")).await;
        assert_eq!(outcome, CompactionOutcome::NotNeeded);
        assert_eq!(endpoint.call_count().await, 0);
        assert!(store.session("key").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unchanged_history_is_not_resummarized() {
        let store = Arc::new(InMemoryStore::new());
        let endpoint = Arc::new(ScriptedEndpoint::new("mock").with_response("Summary."));
        let summarizer = Summarizer::new(endpoint.clone(), store, SummaryPolicy::default());

        let history = turns(16, "q", "a");
        summarizer.maybe_compact("key", &history).await;
        let again = summarizer.maybe_compact("key", &history).await;
        assert_eq!(again, CompactionOutcome::NotNeeded);
        assert_eq!(endpoint.call_count().await, 1);
    }

    #[tokio::test]
    async fn full_log_with_new_turns_is_resummarized() {
        let store = Arc::new(InMemoryStore::with_capacity(20));
        let endpoint = Arc::new(ScriptedEndpoint::new("mock").with_response("Summary."));
        let summarizer = Summarizer::new(endpoint.clone(), store.clone(), SummaryPolicy::default());

        for i in 0..30i64 {
            let mut turn = Turn::new(format!("q{i}"), format!("a{i}"), "P");
            turn.timestamp = chrono::DateTime::from_timestamp(1_700_000_000 + i, 0).unwrap();
            if i == 20 {
                let history = store.query("P").await.unwrap();
                assert_eq!(history.len(), 20);
                let first = summarizer.maybe_compact("key", &history).await;
                assert_eq!(first, CompactionOutcome::Compacted("Summary.".into()));
            }
            store.append(turn).await.unwrap();
        }

        // Ten evictions and ten appends leave the length unchanged.
        let history = store.query("P").await.unwrap();
        assert_eq!(history.len(), 20);
        assert_eq!(history[0].user_text, "q10");

        let second = summarizer.maybe_compact("key", &history).await;
        assert_eq!(second, CompactionOutcome::Compacted("Summary.".into()));
        assert_eq!(endpoint.call_count().await, 2);
        assert!(endpoint.prompts().await[1].contains("User: q29"));

        let session = store.session("key").await.unwrap().unwrap();
        assert!(session.covers(&history));
    }
}
