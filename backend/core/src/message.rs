use serde::{Deserialize, Serialize};

use crate::types::ExtractedPage;

/// Body sent to the remote chat endpoint. The same shape carries both the
/// main exchange and summarization; only the prompt differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Successful endpoint reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

/// Error body returned alongside a non-success status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatErrorBody {
    pub error: String,
}

/// Requests understood by a page-content provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum PageRequest {
    #[serde(rename = "getPageContent")]
    GetPageContent,
}

/// Result of asking a provider for page content.
///
/// An unreachable provider is an expected outcome (restricted pages, no agent
/// injected), so it is a value rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageContentOutcome {
    Delivered(ExtractedPage),
    Unavailable(String),
}

impl PageContentOutcome {
    pub fn into_page(self) -> Option<ExtractedPage> {
        match self {
            PageContentOutcome::Delivered(page) => Some(page),
            PageContentOutcome::Unavailable(_) => None,
        }
    }
}
