//! Groq chat-completions client (OpenAI-compatible API).

use super::llm::{LlmError, LlmProvider, MAX_OUTPUT_TOKENS, SYSTEM_PROMPT, TEMPERATURE};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Model used for dependency detection.
pub const GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// Groq API client.
pub struct GroqClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GroqClient {
    /// Create a client for the public Groq endpoint.
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self::with_endpoint(client, api_key, GROQ_API_URL)
    }

    /// Create a client for a custom OpenAI-compatible endpoint.
    pub fn with_endpoint(
        client: Client,
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }
}

impl std::fmt::Debug for GroqClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    response_format: ResponseFormat,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

impl<'a> ChatRequest<'a> {
    fn new(prompt: &'a str) -> Self {
        Self {
            model: GROQ_MODEL,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: TEMPERATURE,
            max_tokens: MAX_OUTPUT_TOKENS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

/// Pull the first choice's text out of a chat-completions body.
fn extract_content(body: &str) -> Result<String, LlmError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::parse(format!("Failed to parse response: {e}")))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::parse("No choices in response"))
}

#[async_trait]
impl LlmProvider for GroqClient {
    fn name(&self) -> &'static str {
        "groq"
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&ChatRequest::new(prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::http(status.as_u16(), &body));
        }

        extract_content(&body)
    }
}
