use anyhow::Result;
use async_trait::async_trait;

use crate::message::{ChatReply, ChatRequest, PageContentOutcome, PageRequest};
use crate::types::{Session, Turn};

/// Remote language-model endpoint: one prompt string in, one reply out.
#[async_trait]
pub trait ChatEndpoint: Send + Sync {
    /// Endpoint name for logs (e.g., "http", "mock").
    fn name(&self) -> &str;

    /// Send a prompt and wait for the reply. Non-success responses surface as
    /// [`crate::StudyError::Endpoint`].
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply>;
}

/// Something that can inspect the current document and describe it.
#[async_trait]
pub trait PageContentProvider: Send + Sync {
    async fn request(&self, request: PageRequest) -> PageContentOutcome;
}

/// Persistent conversational memory shared by all activations.
///
/// Holds the global turn log (capacity-bounded, oldest evicted first), the
/// per-document sessions, and the one-shot pending question.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Append a turn to the tail of the log, evicting from the head past capacity.
    async fn append(&self, turn: Turn) -> Result<()>;

    /// All turns recorded for a page title, in insertion order.
    async fn query(&self, page_title: &str) -> Result<Vec<Turn>>;

    async fn session(&self, session_key: &str) -> Result<Option<Session>>;

    /// Insert or wholesale-replace a session.
    async fn upsert_session(&self, session: Session) -> Result<()>;

    async fn set_pending_question(&self, question: &str) -> Result<()>;

    /// Read and clear the pending question.
    async fn take_pending_question(&self) -> Result<Option<String>>;
}
