use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::LlmError;
use crate::config::LlmSettings;

pub const TEMPERATURE: f32 = 0.2;

/// A synchronous chat-completion backend. Implementations block the calling
/// thread for the whole round trip; callers go through `LlmGateway`.
pub trait ChatCompletion: Send + Sync {
    fn complete(&self, api_key: &str, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible `chat/completions` client (Nebius AI Studio by default).
pub struct OpenAiChatClient {
    http_client: reqwest::blocking::Client,
    completions_url: Url,
    model: String,
    timeout: Duration,
}

impl OpenAiChatClient {
    /// Builds the blocking HTTP client. Call outside the async runtime.
    pub fn new(settings: &LlmSettings) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        let completions_url = settings
            .base_url
            .join("chat/completions")
            .unwrap_or_else(|_| settings.base_url.clone());

        Ok(Self {
            http_client,
            completions_url,
            model: settings.model.clone(),
            timeout: settings.timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ChatCompletion for OpenAiChatClient {
    fn complete(&self, api_key: &str, prompt: &str) -> Result<String, LlmError> {
        let body = request_body(&self.model, prompt);
        debug!("POST {} model={}", self.completions_url, self.model);

        let response = self
            .http_client
            .post(self.completions_url.clone())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Invocation(format!(
                        "request timed out after {}s",
                        self.timeout.as_secs()
                    ))
                } else {
                    LlmError::Invocation(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| LlmError::Invocation(e.to_string()))?;

        if !status.is_success() {
            error!("LLM provider returned {}: {}", status, text);
            return Err(LlmError::Invocation(format!(
                "provider returned {}: {}",
                status, text
            )));
        }

        parse_completion(&text)
    }
}

fn request_body<'a>(model: &'a str, prompt: &'a str) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: [ChatMessage {
            role: "user",
            content: prompt,
        }],
        temperature: TEMPERATURE,
        stream: false,
    }
}

/// Extracts the first choice's message content.
pub fn parse_completion(body: &str) -> Result<String, LlmError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::Invocation(format!("malformed completion: {}", e)))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::Invocation("completion has no content".to_string()))
}
