/// LLM Client: the AI gateway for the interviewer.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// The engine only sees the `AiGateway` trait; `LlmClient` is built once at startup.
///
/// Model: claude-sonnet-4-5 (hardcoded)
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for every interview turn.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 2048;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Text generation boundary: directive in, raw reply out.
/// Shared read-only for the life of the process.
#[async_trait]
pub trait AiGateway: Send + Sync {
    async fn generate(&self, directive: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Wraps the Anthropic Messages API. One attempt per call: failures surface to the
/// caller unchanged.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
        })
    }

    /// Makes a raw call to the Claude API, returning the full response object.
    /// The directive carries the persona itself, so it goes out as the single user message.
    pub async fn call(&self, prompt: &str) -> Result<LlmResponse, LlmError> {
        let request_body = request_body(prompt);

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: api_error_message(body),
            });
        }

        let llm_response: LlmResponse = response.json().await?;

        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}",
            llm_response.usage.input_tokens, llm_response.usage.output_tokens
        );

        Ok(llm_response)
    }
}

#[async_trait]
impl AiGateway for LlmClient {
    async fn generate(&self, directive: &str) -> Result<String, LlmError> {
        let response = self.call(directive).await?;
        response
            .text()
            .map(str::to_owned)
            .ok_or(LlmError::EmptyContent)
    }
}

fn request_body(prompt: &str) -> AnthropicRequest<'_> {
    AnthropicRequest {
        model: MODEL,
        max_tokens: MAX_TOKENS,
        messages: vec![AnthropicMessage {
            role: "user",
            content: prompt,
        }],
    }
}

/// Prefers the API's structured error message over the raw body.
fn api_error_message(body: String) -> String {
    serde_json::from_str::<AnthropicError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_picks_first_text_block() {
        let response: LlmResponse = serde_json::from_str(
            r#"{
                "content": [
                    {"type": "thinking", "text": null},
                    {"type": "text", "text": "<Question>Hi</Question>"},
                    {"type": "text", "text": "ignored"}
                ],
                "usage": {"input_tokens": 10, "output_tokens": 4}
            }"#,
        )
        .unwrap();
        assert_eq!(response.text(), Some("<Question>Hi</Question>"));
    }

    #[test]
    fn test_text_absent_without_text_block() {
        let response: LlmResponse = serde_json::from_str(
            r#"{"content": [], "usage": {"input_tokens": 1, "output_tokens": 0}}"#,
        )
        .unwrap();
        assert_eq!(response.text(), None);
    }

    #[test]
    fn test_request_sends_directive_as_only_message() {
        let json = serde_json::to_value(request_body("directive")).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "directive");
        assert_eq!(json["model"], MODEL);
        assert_eq!(json["max_tokens"], MAX_TOKENS);
    }

    #[test]
    fn test_api_error_message_prefers_structured_body() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        assert_eq!(api_error_message(body.to_string()), "Overloaded");
        assert_eq!(api_error_message("bad gateway".to_string()), "bad gateway");
    }
}
