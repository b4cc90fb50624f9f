//! `ask` and `explain`: one assistant activation against a saved page.

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use tracing::info;

use studybuddy_agent::{queue_selection_question, Activation, ActivationSettings, SendOutcome};
use studybuddy_browser::ExtractionLimits;
use studybuddy_core::{ChatEndpoint, ConversationStore};

use crate::page_cmd::{spawn_page_agent, PageArgs};
use crate::terminal_output::{note_error, note_info, note_success, print_entry};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    /// Explain the main concepts of the page
    Explain,
    /// Summarize the key points
    Summarize,
    /// Quiz on the page content
    Quiz,
}

#[derive(Args, Debug, Clone)]
pub struct AskArgs {
    #[command(flatten)]
    pub page: PageArgs,

    /// Message to send; falls back to a queued "explain this" question
    #[arg(short, long)]
    pub message: Option<String>,

    /// Send a quick-action prompt instead of a message
    #[arg(long, value_enum, conflicts_with = "message")]
    pub action: Option<QuickAction>,

    /// Ask about the Nth detected question (1-based)
    #[arg(long, conflicts_with_all = ["message", "action"])]
    pub question: Option<usize>,
}

/// What to send once the activation is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskRequest {
    Message(String),
    Action(QuickAction),
    DetectedQuestion(usize),
    Draft,
}

impl AskArgs {
    pub fn request(&self) -> AskRequest {
        if let Some(action) = self.action {
            AskRequest::Action(action)
        } else if let Some(n) = self.question {
            AskRequest::DetectedQuestion(n)
        } else if let Some(message) = &self.message {
            AskRequest::Message(message.clone())
        } else {
            AskRequest::Draft
        }
    }
}

/// Dispatch `request` on a started activation and return the reply text.
pub async fn ask(activation: &Activation, request: AskRequest) -> Result<String> {
    let outcome = match request {
        AskRequest::Message(message) => activation.send(&message).await,
        AskRequest::Action(QuickAction::Explain) => activation.explain_page().await,
        AskRequest::Action(QuickAction::Summarize) => activation.summarize().await,
        AskRequest::Action(QuickAction::Quiz) => activation.quiz_me().await,
        AskRequest::DetectedQuestion(n) => {
            let question = activation
                .page()
                .and_then(|page| n.checked_sub(1).and_then(|i| page.questions.get(i)))
                .cloned();
            match question {
                Some(question) => activation.ask_about(&question).await,
                None => bail!("No detected question #{n} on this page"),
            }
        }
        AskRequest::Draft => match activation.draft() {
            Some(draft) => {
                note_info(&format!("Sending queued question: {draft}"));
                activation.send(draft).await
            }
            None => bail!("Nothing to ask: pass --message, --action or --question"),
        },
    };

    match outcome {
        SendOutcome::Replied(reply) => Ok(reply),
        SendOutcome::Failed(message) => bail!("Error: {message}"),
        SendOutcome::Rejected(reason) => bail!(reason),
        SendOutcome::Busy => bail!("A message is already in flight"),
    }
}

pub async fn run_ask(
    args: &AskArgs,
    store: Arc<dyn ConversationStore>,
    endpoint: Arc<dyn ChatEndpoint>,
    limits: ExtractionLimits,
    settings: ActivationSettings,
) -> Result<()> {
    let handle = spawn_page_agent(&args.page, limits).await?;
    let activation = Activation::start(store, &handle, endpoint, settings).await;
    info!(session = activation.session_key(), "Session ready");

    for entry in activation.transcript().await {
        print_entry(&entry);
    }

    match ask(&activation, args.request()).await {
        Ok(_) => {
            // The reply was appended to the transcript; show only what is new.
            if let Some(last) = activation.transcript().await.last() {
                print_entry(last);
            }
            Ok(())
        }
        Err(e) => {
            note_error(&e.to_string());
            Err(e)
        }
    }
}

pub async fn run_explain(store: &dyn ConversationStore, selection: &str) -> Result<()> {
    let selection = selection.trim();
    if selection.is_empty() {
        bail!("Selection is empty");
    }
    let question = queue_selection_question(store, selection).await?;
    note_success(&format!("Queued for the next activation: {question}"));
    Ok(())
}
