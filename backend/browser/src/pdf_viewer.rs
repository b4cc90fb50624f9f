//! Standalone PDF viewer agent.
//!
//! Runs inside a viewer that may still be rendering when asked, so the
//! select-all read is retried on a short schedule before giving up with a
//! placeholder. Viewer documents never report questions.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use studybuddy_core::{ExtractedPage, PageRequest};

use crate::document::PageDocument;
use crate::extractor::{normalize_whitespace, truncate_chars, ExtractionLimits};
use crate::page_agent::{spawn_responder, PageAgentHandle, PageResponder};

/// Selection must exceed this many chars to count as real text.
pub const VIEWER_MIN_SELECTION_CHARS: usize = 50;

/// Title used when the viewer document has none.
pub const DEFAULT_VIEWER_TITLE: &str = "PDF Document";

/// Fragment that marks the viewer placeholder.
pub const VIEWER_PLACEHOLDER_MARKER: &str = "Content extraction not available";

pub struct PdfViewerAgent {
    document: Arc<RwLock<PageDocument>>,
    limits: ExtractionLimits,
    retry_delays: Vec<Duration>,
    cached: Option<String>,
}

impl PdfViewerAgent {
    /// `document` is shared so the renderer can keep filling it in while the
    /// agent waits between attempts.
    pub fn new(document: Arc<RwLock<PageDocument>>, limits: ExtractionLimits) -> Self {
        Self {
            document,
            limits,
            retry_delays: vec![Duration::from_secs(1), Duration::from_secs(2)],
            cached: None,
        }
    }

    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    async fn attempt(&self) -> Option<String> {
        let document = self.document.read().await;
        match document.select_all() {
            Ok(selected) => {
                let text = normalize_whitespace(&selected);
                let len = text.chars().count();
                if len > VIEWER_MIN_SELECTION_CHARS {
                    info!(chars = len, "PDF text extracted via selection");
                    Some(text)
                } else {
                    None
                }
            }
            Err(e) => {
                debug!(error = %e, "Selection attempt failed");
                None
            }
        }
    }

    /// Extract text, waiting out the retry schedule if the viewer is not ready.
    pub async fn extract_text(&self) -> String {
        if let Some(text) = self.attempt().await {
            return text;
        }
        for delay in &self.retry_delays {
            tokio::time::sleep(*delay).await;
            if let Some(text) = self.attempt().await {
                return text;
            }
        }
        let filename = self
            .document
            .read()
            .await
            .filename()
            .unwrap_or_else(|| "document.pdf".to_string());
        format!(
            "PDF file: {filename}. {VIEWER_PLACEHOLDER_MARKER}. Please describe what you need help \
             with or copy specific text from the PDF."
        )
    }

    /// Extract once up front so the first request is answered from cache.
    pub async fn preload(&mut self) {
        let text = self.extract_text().await;
        self.cached = Some(text);
    }

    pub fn spawn(self) -> PageAgentHandle {
        spawn_responder(self)
    }
}

#[async_trait]
impl PageResponder for PdfViewerAgent {
    async fn respond(&mut self, request: PageRequest) -> ExtractedPage {
        match request {
            PageRequest::GetPageContent => {
                let content = match &self.cached {
                    Some(text) => text.clone(),
                    None => {
                        let text = self.extract_text().await;
                        self.cached = Some(text.clone());
                        text
                    }
                };
                let document = self.document.read().await;
                let title = match document.title().trim() {
                    "" => DEFAULT_VIEWER_TITLE.to_string(),
                    t => t.to_string(),
                };
                ExtractedPage {
                    locator: document.locator().to_string(),
                    title,
                    raw_text: truncate_chars(&content, self.limits.max_content_chars),
                    selection_text: document.selection_text().trim().to_string(),
                    questions: Vec::new(),
                }
            }
        }
    }
}
