//! Page Agent
//!
//! Owns a document and answers `getPageContent` requests over a channel, the
//! way a content script answers the popup. Callers hold a cheap
//! [`PageAgentHandle`]; a dead agent shows up as
//! [`PageContentOutcome::Unavailable`] rather than an error.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use studybuddy_core::{ExtractedPage, PageContentOutcome, PageContentProvider, PageRequest};

use crate::document::PageDocument;
use crate::extractor::{extract, truncate_chars, ExtractionLimits};
use crate::questions::QuestionDetector;

const AGENT_BUFFER_SIZE: usize = 16;

/// Something that can answer page requests. Runs inside the agent task.
#[async_trait]
pub trait PageResponder: Send + 'static {
    async fn respond(&mut self, request: PageRequest) -> ExtractedPage;
}

struct Envelope {
    request: PageRequest,
    reply: oneshot::Sender<ExtractedPage>,
}

/// Client side of a running page agent.
#[derive(Clone)]
pub struct PageAgentHandle {
    tx: mpsc::Sender<Envelope>,
}

/// Run `responder` in its own task and return a handle to it. The task ends
/// when every handle has been dropped.
pub fn spawn_responder<R: PageResponder>(mut responder: R) -> PageAgentHandle {
    let (tx, mut rx) = mpsc::channel::<Envelope>(AGENT_BUFFER_SIZE);
    tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            let page = responder.respond(envelope.request).await;
            if envelope.reply.send(page).is_err() {
                debug!("Page request abandoned by caller");
            }
        }
        debug!("Page agent stopped");
    });
    PageAgentHandle { tx }
}

#[async_trait]
impl PageContentProvider for PageAgentHandle {
    async fn request(&self, request: PageRequest) -> PageContentOutcome {
        let (reply, response) = oneshot::channel();
        if self.tx.send(Envelope { request, reply }).await.is_err() {
            return PageContentOutcome::Unavailable("page agent is not running".into());
        }
        match response.await {
            Ok(page) => PageContentOutcome::Delivered(page),
            Err(_) => PageContentOutcome::Unavailable("page agent dropped the request".into()),
        }
    }
}

/// Responder for ordinary pages.
pub struct PageAgent {
    document: PageDocument,
    limits: ExtractionLimits,
    detector: QuestionDetector,
}

impl PageAgent {
    pub fn new(document: PageDocument, limits: ExtractionLimits) -> Self {
        let detector = QuestionDetector::new(limits.max_questions);
        Self {
            document,
            limits,
            detector,
        }
    }

    /// Extract, detect questions on the full text, then cap the content.
    pub fn describe(&self) -> ExtractedPage {
        let content = extract(&self.document, &self.limits);
        let questions = self.detector.detect(&content);
        info!(
            locator = self.document.locator(),
            chars = content.chars().count(),
            questions = questions.len(),
            "Page described"
        );
        ExtractedPage {
            locator: self.document.locator().to_string(),
            title: self.document.title().to_string(),
            raw_text: truncate_chars(&content, self.limits.max_content_chars),
            selection_text: self.document.selection_text().trim().to_string(),
            questions,
        }
    }

    pub fn spawn(self) -> PageAgentHandle {
        spawn_responder(self)
    }
}

#[async_trait]
impl PageResponder for PageAgent {
    async fn respond(&mut self, request: PageRequest) -> ExtractedPage {
        match request {
            PageRequest::GetPageContent => self.describe(),
        }
    }
}
