use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Page title recorded on a turn when no page data was available.
pub const UNKNOWN_PAGE_TITLE: &str = "Unknown";

/// Best-effort rendition of the document the user is reading.
///
/// Produced once per activation and never mutated afterwards. The serialized
/// form is the page-content provider's response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedPage {
    /// Document address.
    #[serde(rename = "url")]
    pub locator: String,
    pub title: String,
    /// Normalized page text, already capped by the extractor boundary.
    #[serde(rename = "content")]
    pub raw_text: String,
    /// Highlighted text at the time of the request (possibly empty).
    #[serde(rename = "selectedText", default)]
    pub selection_text: String,
    #[serde(default)]
    pub questions: Vec<String>,
}

impl ExtractedPage {
    pub fn has_selection(&self) -> bool {
        !self.selection_text.is_empty()
    }
}

/// One completed exchange: a user message and the assistant's reply.
///
/// Field names on disk match the persisted `chatHistory` layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "user")]
    pub user_text: String,
    #[serde(rename = "ai")]
    pub assistant_text: String,
    #[serde(rename = "page")]
    pub page_title: String,
}

impl Turn {
    pub fn new(
        user_text: impl Into<String>,
        assistant_text: impl Into<String>,
        page_title: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            user_text: user_text.into(),
            assistant_text: assistant_text.into(),
            page_title: page_title.into(),
        }
    }

    /// Combined size of both sides of the exchange, in chars.
    pub fn char_len(&self) -> usize {
        self.user_text.chars().count() + self.assistant_text.chars().count()
    }
}

/// Per-document conversation state. Only `summary` ever changes, and it is
/// always replaced wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub summarized_message_count: usize,
    /// Timestamp of the newest turn the summary was built from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summarized_through: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(session_key: impl Into<String>) -> Self {
        Self {
            session_key: session_key.into(),
            summary: None,
            last_updated: Utc::now(),
            summarized_message_count: 0,
            summarized_through: None,
        }
    }

    /// Replace the summary with a fresh synthesis covering `turns` turns.
    pub fn replace_summary(&mut self, summary: impl Into<String>, turns: usize) {
        self.summary = Some(summary.into());
        self.summarized_message_count = turns;
        self.summarized_through = None;
        self.last_updated = Utc::now();
    }

    /// Replace the summary with a synthesis of exactly `covered`.
    pub fn summarize_turns(&mut self, summary: impl Into<String>, covered: &[Turn]) {
        self.replace_summary(summary, covered.len());
        self.summarized_through = covered.last().map(|turn| turn.timestamp);
    }

    /// Was the current summary built from this exact history?
    ///
    /// The log only grows at the tail, so an unchanged count with an
    /// unchanged newest turn means nothing was added or evicted.
    pub fn covers(&self, history: &[Turn]) -> bool {
        self.summary.is_some()
            && self.summarized_message_count == history.len()
            && self.summarized_through.is_some()
            && self.summarized_through == history.last().map(|turn| turn.timestamp)
    }
}
