//! Context assembly.
//!
//! Builds the single flat prompt string sent to the chat endpoint for one
//! user message. Sections, in order:
//!
//! 1. behavioral preamble
//! 2. prior-context summary and recent turns, or a topic-change note when the
//!    message is a breakout
//! 3. page identity (title, selected text)
//! 4. page content, head and tail kept when over budget
//! 5. the user's message, last
//!
//! Summarization runs before anything is read, so a freshly compacted summary
//! is already in effect for this message.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use studybuddy_core::{ConversationStore, ExtractedPage, Turn};

use crate::summarizer::Summarizer;
use crate::system_prompt::with_preamble;

/// Inserted between the head and tail of over-budget page content.
pub const ELISION_MARKER: &str = "\n\n[...content continues...]\n\n";

/// Phrases that signal the user wants out of the current thread.
const BREAKOUT_PHRASES: &[&str] = &[
    "stop",
    "enough",
    "no more",
    "change topic",
    "different question",
    "tell me",
    "explain",
];

/// Canned requests whose earlier occurrences only add noise to a new question.
const COMMAND_PHRASES: &[&str] = &["quiz me", "explain what this page", "summarize the key points"];

/// Words that mark a message as a fresh request rather than a follow-up.
const FRESH_REQUEST_WORDS: &[&str] = &["quiz", "explain", "summarize"];

const TOPIC_CHANGE_NOTE: &str = "Note: the user is changing topics. Drop any previous task \
     (such as an ongoing quiz) and answer the new request directly.";

#[derive(Debug, Clone, PartialEq)]
pub struct ContextPolicy {
    /// Page content longer than this is cut down to exactly this many chars.
    pub max_page_chars: usize,
    /// Share of the page budget taken from the start of the content.
    pub head_ratio: f64,
    pub recent_turns_with_summary: usize,
    pub recent_turns_without_summary: usize,
    /// Filtering never leaves fewer turns than this.
    pub min_filtered_turns: usize,
    /// Messages shorter than this are treated as follow-ups.
    pub follow_up_max_chars: usize,
}

impl Default for ContextPolicy {
    fn default() -> Self {
        Self {
            max_page_chars: 8000,
            head_ratio: 0.6,
            recent_turns_with_summary: 5,
            recent_turns_without_summary: 8,
            min_filtered_turns: 3,
            follow_up_max_chars: 50,
        }
    }
}

/// Case-insensitive substring match against the breakout phrase set.
pub fn is_breakout(message: &str) -> bool {
    let lower = message.to_lowercase();
    BREAKOUT_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

fn is_follow_up(message: &str, policy: &ContextPolicy) -> bool {
    let lower = message.to_lowercase();
    message.chars().count() < policy.follow_up_max_chars
        && !FRESH_REQUEST_WORDS.iter().any(|word| lower.contains(word))
}

fn is_command(turn: &Turn) -> bool {
    let lower = turn.user_text.to_lowercase();
    COMMAND_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

fn last_n<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

/// Pick the turns worth repeating for `message`.
fn select_recent_turns<'a>(
    history: &'a [Turn],
    has_summary: bool,
    message: &str,
    policy: &ContextPolicy,
) -> Vec<&'a Turn> {
    let window = if has_summary {
        policy.recent_turns_with_summary
    } else {
        policy.recent_turns_without_summary
    };
    let recent = last_n(history, window);

    if is_follow_up(message, policy) {
        return recent.iter().collect();
    }

    let filtered: Vec<&Turn> = recent.iter().filter(|turn| !is_command(turn)).collect();
    if filtered.len() < policy.min_filtered_turns {
        last_n(recent, policy.min_filtered_turns).iter().collect()
    } else {
        filtered
    }
}

/// Keep `content` whole if it fits, otherwise keep its head and tail.
pub fn truncate_content(content: &str, policy: &ContextPolicy) -> String {
    let total = content.chars().count();
    if total <= policy.max_page_chars {
        return content.to_string();
    }
    let head_len = (policy.max_page_chars as f64 * policy.head_ratio).floor() as usize;
    let tail_len = policy.max_page_chars - head_len.min(policy.max_page_chars);
    let head: String = content.chars().take(head_len).collect();
    let tail: String = content.chars().skip(total - tail_len).collect();
    format!("{head}{ELISION_MARKER}{tail}")
}

fn history_section(summary: Option<&str>, turns: &[&Turn]) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(summary) = summary {
        parts.push(format!("Previous conversation summary: {summary}"));
    }
    if !turns.is_empty() {
        let lines = turns
            .iter()
            .map(|turn| format!("User: {}\nAssistant: {}", turn.user_text, turn.assistant_text))
            .collect::<Vec<_>>()
            .join("\n");
        parts.push(format!("Recent conversation:\n{lines}"));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

fn page_section(page: &ExtractedPage, policy: &ContextPolicy) -> String {
    let mut identity = format!("I'm looking at a webpage titled \"{}\".", page.title);
    if page.has_selection() {
        identity.push_str(&format!(" I've selected this text: \"{}\".", page.selection_text));
    }
    format!(
        "{identity}\n\nHere's the main content from the page:\n{}",
        truncate_content(&page.raw_text, policy)
    )
}

pub struct ContextAssembler {
    summarizer: Summarizer,
    store: Arc<dyn ConversationStore>,
    policy: ContextPolicy,
}

impl ContextAssembler {
    pub fn new(summarizer: Summarizer, store: Arc<dyn ConversationStore>, policy: ContextPolicy) -> Self {
        Self {
            summarizer,
            store,
            policy,
        }
    }

    pub fn policy(&self) -> &ContextPolicy {
        &self.policy
    }

    /// Build the outbound prompt for `message`.
    ///
    /// `history` is the page's turn log, oldest first. Fails only if the
    /// session cannot be read back from the store.
    pub async fn assemble(
        &self,
        session_key: &str,
        history: &[Turn],
        page: Option<&ExtractedPage>,
        message: &str,
    ) -> Result<String> {
        let compaction = self.summarizer.maybe_compact(session_key, history).await;
        debug!(session = session_key, ?compaction, "Summarization step done");

        let session = self
            .store
            .session(session_key)
            .await
            .context("Failed to load session for context assembly")?;
        let summary = session.as_ref().and_then(|s| s.summary.as_deref());

        let mut sections = Vec::new();
        if is_breakout(message) {
            debug!(session = session_key, "Breakout detected; history suppressed");
            sections.push(TOPIC_CHANGE_NOTE.to_string());
        } else {
            let turns = select_recent_turns(history, summary.is_some(), message, &self.policy);
            debug!(session = session_key, turns = turns.len(), summary = summary.is_some(), "History selected");
            if let Some(section) = history_section(summary, &turns) {
                sections.push(section);
            }
        }

        if let Some(page) = page {
            sections.push(page_section(page, &self.policy));
        }
        sections.push(format!("My question: {message}"));

        Ok(with_preamble(&sections.join("\n\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarizer::SummaryPolicy;
    use crate::system_prompt::PREAMBLE;
    use studybuddy_core::Session;
    use studybuddy_memory::InMemoryStore;
    use studybuddy_providers::ScriptedEndpoint;

    fn assembler(store: Arc<InMemoryStore>, endpoint: Arc<ScriptedEndpoint>) -> ContextAssembler {
        let summarizer = Summarizer::new(endpoint, store.clone(), SummaryPolicy::default());
        ContextAssembler::new(summarizer, store, ContextPolicy::default())
    }

    fn page(content: &str) -> ExtractedPage {
        ExtractedPage {
            locator: "https://example.com/bio".into(),
            title: "Cells".into(),
            raw_text: content.into(),
            selection_text: String::new(),
            questions: vec![],
        }
    }

    #[test]
    fn breakout_is_case_insensitive_substring() {
        assert!(is_breakout("Stop, that's enough"));
        assert!(is_breakout("Can you EXPLAIN osmosis"));
        assert!(!is_breakout("can you summarize"));
    }

    #[test]
    fn truncation_keeps_head_and_tail_of_budget() {
        let content: String = (0..10_000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let policy = ContextPolicy::default();
        let block = truncate_content(&content, &policy);
        let (head, tail) = block.split_once(ELISION_MARKER).unwrap();
        assert_eq!(head, &content[..4800]);
        assert_eq!(tail, &content[10_000 - 3200..]);
    }

    #[test]
    fn head_tail_split_follows_ratio() {
        // A 10000-char budget over 10000 chars of content splits 6000/4000.
        let content = "x".repeat(10_001);
        let policy = ContextPolicy {
            max_page_chars: 10_000,
            ..ContextPolicy::default()
        };
        let block = truncate_content(&content, &policy);
        let (head, tail) = block.split_once(ELISION_MARKER).unwrap();
        assert_eq!(head.len(), 6000);
        assert_eq!(tail.len(), 4000);
        assert_eq!(head.len() + tail.len(), policy.max_page_chars);
    }

    #[test]
    fn content_within_budget_is_untouched() {
        let content = "y".repeat(8000);
        assert_eq!(truncate_content(&content, &ContextPolicy::default()), content);
    }

    #[test]
    fn follow_up_keeps_command_turns() {
        let history = vec![
            Turn::new("Can you quiz me on the key concepts from this page?", "Q1", "P"),
            Turn::new("B", "answer", "P"),
        ];
        let picked = select_recent_turns(&history, false, "and then?", &ContextPolicy::default());
        assert_eq!(picked.len(), 2);
    }

    #[test]
    fn fresh_request_drops_command_turns() {
        let history: Vec<Turn> = vec![
            Turn::new("Can you quiz me on the key concepts from this page?", "Q1", "P"),
            Turn::new("What is a cell wall?", "a", "P"),
            Turn::new("Summarize the key points, main ideas", "s", "P"),
            Turn::new("Who found cells?", "Hooke", "P"),
            Turn::new("Why are cells small?", "diffusion", "P"),
        ];
        let picked = select_recent_turns(&history, false, "please summarize everything", &ContextPolicy::default());
        let users: Vec<_> = picked.iter().map(|t| t.user_text.as_str()).collect();
        assert_eq!(users, vec!["What is a cell wall?", "Who found cells?", "Why are cells small?"]);
    }

    #[test]
    fn heavy_filtering_falls_back_to_last_three() {
        let history: Vec<Turn> = vec![
            Turn::new("quiz me", "Q1", "P"),
            Turn::new("quiz me again", "Q2", "P"),
            Turn::new("What is ATP?", "a", "P"),
            Turn::new("quiz me more", "Q3", "P"),
        ];
        let picked = select_recent_turns(&history, false, "quiz me on something new please", &ContextPolicy::default());
        let users: Vec<_> = picked.iter().map(|t| t.user_text.as_str()).collect();
        assert_eq!(users, vec!["quiz me again", "What is ATP?", "quiz me more"]);
    }

    #[test]
    fn window_shrinks_when_summary_exists() {
        let history: Vec<Turn> = (0..12).map(|i| Turn::new(format!("q{i}"), "a", "P")).collect();
        let policy = ContextPolicy::default();
        assert_eq!(select_recent_turns(&history, true, "ok?", &policy).len(), 5);
        assert_eq!(select_recent_turns(&history, false, "ok?", &policy).len(), 8);
    }

    #[tokio::test]
    async fn breakout_suppresses_history_but_keeps_page() {
        let store = Arc::new(InMemoryStore::new());
        let mut session = Session::new("k");
        session.replace_summary("We were doing a quiz.", 16);
        store.upsert_session(session).await.unwrap();
        let assembler = assembler(store, Arc::new(ScriptedEndpoint::new("mock")));

        let history = vec![Turn::new("quiz me", "Question 1: what is DNA?", "Cells")];
        let prompt = assembler
            .assemble("k", &history, Some(&page("Cells are small.")), "stop, that's enough")
            .await
            .unwrap();

        assert!(prompt.starts_with(PREAMBLE));
        assert!(prompt.contains(TOPIC_CHANGE_NOTE));
        assert!(!prompt.contains("We were doing a quiz."));
        assert!(!prompt.contains("Question 1"));
        assert!(prompt.contains("Cells are small."));
        assert!(prompt.ends_with("My question: stop, that's enough"));
    }

    #[tokio::test]
    async fn non_breakout_includes_summary_and_turns() {
        let store = Arc::new(InMemoryStore::new());
        let mut session = Session::new("k");
        session.replace_summary("Covered mitosis.", 16);
        store.upsert_session(session).await.unwrap();
        let assembler = assembler(store, Arc::new(ScriptedEndpoint::new("mock")));

        let history = vec![Turn::new("What is mitosis?", "Cell division.", "Cells")];
        let prompt = assembler
            .assemble("k", &history, None, "can you summarize")
            .await
            .unwrap();

        assert!(!prompt.contains(TOPIC_CHANGE_NOTE));
        assert!(prompt.contains("Previous conversation summary: Covered mitosis."));
        assert!(prompt.contains("User: What is mitosis?\nAssistant: Cell division."));
        assert!(prompt.ends_with("My question: can you summarize"));
    }

    #[tokio::test]
    async fn summarizer_runs_before_assembly() {
        let store = Arc::new(InMemoryStore::new());
        let endpoint = Arc::new(ScriptedEndpoint::new("mock").then_reply("Fresh summary."));
        let assembler = assembler(store, endpoint.clone());

        let history: Vec<Turn> = (0..16).map(|i| Turn::new(format!("q{i}"), "a", "Cells")).collect();
        let prompt = assembler.assemble("k", &history, None, "next?").await.unwrap();

        assert_eq!(endpoint.call_count().await, 1);
        assert!(prompt.contains("Previous conversation summary: Fresh summary."));
        // Summary present: only the last five turns are repeated.
        assert!(prompt.contains("User: q11\n"));
        assert!(!prompt.contains("User: q10\n"));
    }

    #[tokio::test]
    async fn selection_is_quoted_in_page_identity() {
        let store = Arc::new(InMemoryStore::new());
        let assembler = assembler(store, Arc::new(ScriptedEndpoint::new("mock")));
        let mut page = page("Body.");
        page.selection_text = "the nucleus".into();
        let prompt = assembler.assemble("k", &[], Some(&page), "what?").await.unwrap();
        assert!(prompt.contains("I'm looking at a webpage titled \"Cells\". I've selected this text: \"the nucleus\"."));
    }
}
