use std::collections::VecDeque;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use studybuddy_core::{ChatEndpoint, ChatReply, ChatRequest, StudyError};

enum Scripted {
    Reply(String),
    Fail { status: u16, message: String },
}

/// A chat endpoint that plays back scripted replies and records every prompt
/// it was sent. Once the script runs out it answers with the fixed response.
pub struct ScriptedEndpoint {
    name: String,
    fixed_response: Option<String>,
    script: Mutex<VecDeque<Scripted>>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedEndpoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_response: None,
            script: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    /// Hold every call for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn then_reply(mut self, response: impl Into<String>) -> Self {
        self.script.get_mut().push_back(Scripted::Reply(response.into()));
        self
    }

    pub fn then_fail(mut self, status: u16, message: impl Into<String>) -> Self {
        self.script.get_mut().push_back(Scripted::Fail {
            status,
            message: message.into(),
        });
        self
    }

    /// Every prompt received so far, in order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.prompts.lock().await.len()
    }
}

#[async_trait]
impl ChatEndpoint for ScriptedEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatReply> {
        self.prompts.lock().await.push(request.message.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.script.lock().await.pop_front() {
            Some(Scripted::Reply(response)) => Ok(ChatReply { response }),
            Some(Scripted::Fail { status, message }) => {
                Err(StudyError::Endpoint { status, message }.into())
            }
            None => Ok(ChatReply {
                response: self
                    .fixed_response
                    .clone()
                    .unwrap_or_else(|| "Mock response".to_string()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plays_script_then_fixed_response() {
        let endpoint = ScriptedEndpoint::new("mock")
            .with_response("fallback")
            .then_reply("first")
            .then_fail(500, "boom");

        let first = endpoint.send(&ChatRequest::new("a")).await.unwrap();
        assert_eq!(first.response, "first");
        let err = endpoint.send(&ChatRequest::new("b")).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        let third = endpoint.send(&ChatRequest::new("c")).await.unwrap();
        assert_eq!(third.response, "fallback");

        assert_eq!(endpoint.prompts().await, vec!["a", "b", "c"]);
    }
}
