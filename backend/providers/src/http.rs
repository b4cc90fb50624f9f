use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use studybuddy_core::{ChatEndpoint, ChatErrorBody, ChatReply, ChatRequest, StudyError};

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/chat";

/// Message used when a rejected call carries no readable error body.
const FALLBACK_ERROR: &str = "Request failed";

/// JSON-over-HTTP chat endpoint. No timeout or retry is applied here; a
/// failed call goes straight back to the caller.
pub struct HttpChatEndpoint {
    client: Client,
    url: String,
}

impl HttpChatEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Default for HttpChatEndpoint {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

#[async_trait]
impl ChatEndpoint for HttpChatEndpoint {
    fn name(&self) -> &str {
        "http"
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatReply> {
        debug!(url = %self.url, chars = request.message.chars().count(), "Sending chat request");

        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| StudyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ChatErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| FALLBACK_ERROR.to_string());
            warn!(status = status.as_u16(), error = %message, "Chat endpoint rejected request");
            return Err(StudyError::Endpoint {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        response
            .json::<ChatReply>()
            .await
            .context("Failed to parse chat endpoint response")
    }
}
