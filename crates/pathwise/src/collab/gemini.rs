//! Gemini `generateContent` client.

use super::llm::{LlmError, LlmProvider, MAX_OUTPUT_TOKENS, TEMPERATURE};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Model used for dependency detection.
pub const GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Gemini API client.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GeminiClient {
    /// Create a client for the public Gemini endpoint.
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self::with_endpoint(
            client,
            api_key,
            format!("{GEMINI_API_BASE}/{GEMINI_MODEL}:generateContent"),
        )
    }

    /// Create a client for a custom `generateContent` endpoint.
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

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
    max_output_tokens: u32,
}

impl<'a> GenerateRequest<'a> {
    fn new(prompt: &'a str) -> Self {
        Self {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    text: Option<String>,
}

/// Pull the first candidate's text out of a `generateContent` body.
fn extract_text(body: &str) -> Result<String, LlmError> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::parse(format!("Failed to parse response: {e}")))?;

    parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or_else(|| LlmError::parse("No candidate text in response"))
}

#[async_trait]
impl LlmProvider for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateRequest::new(prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::http(status.as_u16(), &body));
        }

        extract_text(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::llm::LlmErrorKind;

    #[test]
    fn test_request_shape() {
        let value = serde_json::to_value(GenerateRequest::new("find deps")).unwrap();

        assert_eq!(value["contents"][0]["parts"][0]["text"], "find deps");
        let config = &value["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(config["maxOutputTokens"], 1024);
    }

    #[test]
    fn test_default_endpoint_names_model() {
        let client = GeminiClient::new(Client::new(), "key");
        assert!(client.endpoint.ends_with("/gemini-1.5-flash:generateContent"));
    }

    #[test]
    fn test_extract_text() {
        let body = r#"{"candidates": [{"content": {"role": "model", "parts": [{"text": "{}"}]}}]}"#;
        assert_eq!(extract_text(body).unwrap(), "{}");
    }

    #[test]
    fn test_extract_text_blocked_candidate() {
        let body = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let err = extract_text(body).unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Parse);
    }
}
