//! Activation controller.
//!
//! One [`Activation`] per time the user opens the assistant on a document.
//! It fetches the page description once, greets, replays recent history, and
//! then turns each user message into one assembled prompt and one endpoint
//! call. Rendering is left to the caller: the controller only keeps the
//! transcript entries and the current status line.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use studybuddy_browser::{PLACEHOLDER_MARKER, VIEWER_PLACEHOLDER_MARKER};
use studybuddy_core::{
    ChatEndpoint, ChatRequest, ConversationStore, ExtractedPage, PageContentOutcome,
    PageContentProvider, PageRequest, Turn, UNKNOWN_PAGE_TITLE,
};
use studybuddy_routing::key_for;

use crate::assembler::{ContextAssembler, ContextPolicy};
use crate::summarizer::{Summarizer, SummaryPolicy};

// ---------------------------------------------------------------------------
// Fixed user-facing text
// ---------------------------------------------------------------------------

const GREETING_UNAVAILABLE: &str =
    "I'm ready to help! However, I couldn't access the page content. You can still ask me questions!";
const GREETING_PDF_LIMITED: &str = "I can see you're viewing a PDF! While I couldn't automatically \
     read all the content, I'm here to help. Please copy and paste text from the PDF or describe \
     what you need help with.";
const GREETING_PDF_LOADED: &str =
    "I've loaded the PDF content! I can help you understand this document. What would you like to know?";
const GREETING_DEFAULT: &str =
    "I'm ready to help you understand this page! What would you like to know?";

const EMPTY_MESSAGE: &str = "Please enter a message";
const NO_PAGE_CONTENT: &str = "No page content available";

const EXPLAIN_PAGE_PROMPT: &str = "Can you explain what this page is about?";
const SUMMARIZE_PROMPT: &str = "Summarize the key points, main ideas, and important facts from \
     this page in bullet points or short paragraphs";
const QUIZ_PROMPT: &str = "Can you quiz me on the key concepts from this page?";

/// Content fragments that mean a viewer could not read its document.
const LIMITED_ACCESS_MARKERS: &[&str] = &[PLACEHOLDER_MARKER, VIEWER_PLACEHOLDER_MARKER];

/// A loaded PDF needs more than this many chars to count as readable.
const PDF_LOADED_MIN_CHARS: usize = 100;

/// Turns replayed into the transcript on activation.
const REPLAY_TURNS: usize = 5;

// ---------------------------------------------------------------------------
// Transcript types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub text: String,
}

impl ChatEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}

/// Transient status line. Expiry is up to whoever displays it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// Result of one attempt to send a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Replied(String),
    /// The endpoint call failed; carries the error message shown to the user.
    Failed(String),
    /// Nothing was sent; carries the status text explaining why.
    Rejected(String),
    /// Another message is still in flight.
    Busy,
}

#[derive(Debug, Clone, Default)]
pub struct ActivationSettings {
    pub context: ContextPolicy,
    pub summary: SummaryPolicy,
}

/// Text queued by the "explain selection" context-menu action.
pub fn pending_question_for_selection(selection: &str) -> String {
    format!("Explain this: {selection}")
}

/// Store the context-menu question for the next activation to pick up.
pub async fn queue_selection_question(store: &dyn ConversationStore, selection: &str) -> Result<String> {
    let question = pending_question_for_selection(selection);
    store.set_pending_question(&question).await?;
    Ok(question)
}

fn greeting_for(page: &ExtractedPage) -> String {
    let is_pdf = page.locator.to_lowercase().contains(".pdf");
    let limited = LIMITED_ACCESS_MARKERS
        .iter()
        .any(|marker| page.raw_text.contains(marker));

    if is_pdf && limited {
        GREETING_PDF_LIMITED.to_string()
    } else if is_pdf && page.raw_text.chars().count() > PDF_LOADED_MIN_CHARS {
        GREETING_PDF_LOADED.to_string()
    } else if !page.questions.is_empty() {
        format!(
            "I detected {} question(s) on this page. Click on any question below to get help, or ask me anything!",
            page.questions.len()
        )
    } else {
        GREETING_DEFAULT.to_string()
    }
}

/// Resets the busy flag however the send ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct Activation {
    store: Arc<dyn ConversationStore>,
    endpoint: Arc<dyn ChatEndpoint>,
    assembler: ContextAssembler,
    page: Option<ExtractedPage>,
    session_key: String,
    draft: Option<String>,
    transcript: Mutex<Vec<ChatEntry>>,
    status: Mutex<Option<StatusMessage>>,
    busy: AtomicBool,
}

impl Activation {
    /// Open the assistant on whatever `provider` is showing.
    ///
    /// Never fails: an unreachable page or store degrades to an activation
    /// without page data or without history.
    pub async fn start(
        store: Arc<dyn ConversationStore>,
        provider: &dyn PageContentProvider,
        endpoint: Arc<dyn ChatEndpoint>,
        settings: ActivationSettings,
    ) -> Self {
        let draft = match store.take_pending_question().await {
            Ok(draft) => draft,
            Err(e) => {
                warn!(error = %e, "Could not read pending question");
                None
            }
        };

        let page = match provider.request(PageRequest::GetPageContent).await {
            PageContentOutcome::Delivered(page) => Some(page),
            PageContentOutcome::Unavailable(reason) => {
                warn!(reason = %reason, "Page content unavailable");
                None
            }
        };

        let (locator, title) = match &page {
            Some(page) => (page.locator.as_str(), page.title.as_str()),
            None => ("", UNKNOWN_PAGE_TITLE),
        };
        let session_key = key_for(locator, title);

        let summarizer = Summarizer::new(endpoint.clone(), store.clone(), settings.summary);
        let assembler = ContextAssembler::new(summarizer, store.clone(), settings.context);

        let mut transcript = Vec::new();
        if page.is_some() {
            match store.query(title).await {
                Ok(history) => {
                    let start = history.len().saturating_sub(REPLAY_TURNS);
                    for turn in &history[start..] {
                        transcript.push(ChatEntry::user(turn.user_text.clone()));
                        transcript.push(ChatEntry::assistant(turn.assistant_text.clone()));
                    }
                }
                Err(e) => warn!(error = %e, "Could not load page history"),
            }
        }

        let greeting = match &page {
            Some(page) => greeting_for(page),
            None => GREETING_UNAVAILABLE.to_string(),
        };
        transcript.push(ChatEntry::assistant(greeting));

        info!(
            session = %session_key,
            has_page = page.is_some(),
            replayed = transcript.len() - 1,
            "Activation started"
        );

        Self {
            store,
            endpoint,
            assembler,
            page,
            session_key,
            draft,
            transcript: Mutex::new(transcript),
            status: Mutex::new(None),
            busy: AtomicBool::new(false),
        }
    }

    pub fn page(&self) -> Option<&ExtractedPage> {
        self.page.as_ref()
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    /// The pending question this activation started with, if any.
    pub fn draft(&self) -> Option<&str> {
        self.draft.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub async fn transcript(&self) -> Vec<ChatEntry> {
        self.transcript.lock().await.clone()
    }

    pub async fn status(&self) -> Option<StatusMessage> {
        self.status.lock().await.clone()
    }

    fn page_title(&self) -> &str {
        self.page
            .as_ref()
            .map(|page| page.title.as_str())
            .unwrap_or(UNKNOWN_PAGE_TITLE)
    }

    async fn set_status(&self, text: impl Into<String>, is_error: bool) {
        *self.status.lock().await = Some(StatusMessage {
            text: text.into(),
            is_error,
        });
    }

    async fn push(&self, entry: ChatEntry) {
        self.transcript.lock().await.push(entry);
    }

    /// Send one user message and wait for the reply.
    pub async fn send(&self, message: &str) -> SendOutcome {
        let message = message.trim();
        if message.is_empty() {
            self.set_status(EMPTY_MESSAGE, true).await;
            return SendOutcome::Rejected(EMPTY_MESSAGE.to_string());
        }
        if self.busy.swap(true, Ordering::SeqCst) {
            debug!("Send rejected; previous message still in flight");
            return SendOutcome::Busy;
        }
        let _guard = BusyGuard(&self.busy);

        self.push(ChatEntry::user(message)).await;
        match self.exchange(message).await {
            Ok(reply) => {
                self.push(ChatEntry::assistant(reply.clone())).await;
                let turn = Turn::new(message, reply.clone(), self.page_title());
                if let Err(e) = self.store.append(turn).await {
                    warn!(error = %e, "Failed to save turn to history");
                }
                SendOutcome::Replied(reply)
            }
            Err(e) => {
                let msg = e.to_string();
                warn!(error = %msg, "Chat exchange failed");
                self.set_status(format!("Error: {msg}"), true).await;
                self.push(ChatEntry::assistant(format!(
                    "Sorry, I encountered an error: {msg}. Please make sure the API is running."
                )))
                .await;
                SendOutcome::Failed(msg)
            }
        }
    }

    async fn exchange(&self, message: &str) -> Result<String> {
        let history = match self.store.query(self.page_title()).await {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, "Could not load history; sending without it");
                Vec::new()
            }
        };
        let prompt = self
            .assembler
            .assemble(&self.session_key, &history, self.page.as_ref(), message)
            .await?;
        let reply = self.endpoint.send(&ChatRequest::new(prompt)).await?;
        Ok(reply.response)
    }

    async fn quick_action(&self, prompt: &str) -> SendOutcome {
        if self.page.is_none() {
            self.set_status(NO_PAGE_CONTENT, true).await;
            return SendOutcome::Rejected(NO_PAGE_CONTENT.to_string());
        }
        self.send(prompt).await
    }

    pub async fn explain_page(&self) -> SendOutcome {
        self.quick_action(EXPLAIN_PAGE_PROMPT).await
    }

    pub async fn summarize(&self) -> SendOutcome {
        self.quick_action(SUMMARIZE_PROMPT).await
    }

    pub async fn quiz_me(&self) -> SendOutcome {
        self.quick_action(QUIZ_PROMPT).await
    }

    /// Ask for help with one of the detected questions.
    pub async fn ask_about(&self, question: &str) -> SendOutcome {
        self.quick_action(&format!("Help me understand: {question}")).await
    }
}
