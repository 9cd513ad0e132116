//! LLM provider abstraction for semantic dependency detection.
//!
//! Providers only turn a prompt into reply text. Building the prompt and
//! interpreting the reply is shared, so every provider is held to the same
//! filtering rules.

use async_trait::async_trait;
use chrono::SecondsFormat;
use pathwise_core::{DependencyType, SuggestedDependency, Task, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Suggestions below this confidence are discarded.
pub const MIN_CONFIDENCE: f64 = 0.7;

/// Maximum suggestions returned per request.
pub const MAX_SUGGESTIONS: usize = 5;

/// Reason used when the model does not give one.
pub const DEFAULT_REASON: &str = "AI detected semantic relationship";

/// Sampling temperature for dependency detection requests.
pub const TEMPERATURE: f32 = 0.1;

/// Output token budget for dependency detection requests.
pub const MAX_OUTPUT_TOKENS: u32 = 1024;

/// System instruction for chat-style providers.
pub const SYSTEM_PROMPT: &str = "You are an expert project manager. Return only valid JSON.";

/// Classification of LLM errors for fallback and logging decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// The provider has no credentials
    NotConfigured,
    /// HTTP 429
    RateLimited,
    /// HTTP 5xx
    ServerError,
    /// HTTP 4xx other than 429
    ClientError,
    /// Connection failures
    Network,
    /// The request did not finish in time
    Timeout,
    /// The reply could not be interpreted
    Parse,
}

impl fmt::Display for LlmErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotConfigured => "not configured",
            Self::RateLimited => "rate limited",
            Self::ServerError => "server error",
            Self::ClientError => "client error",
            Self::Network => "network error",
            Self::Timeout => "timeout",
            Self::Parse => "parse error",
        };
        f.write_str(name)
    }
}

/// Map an HTTP status code to an error kind.
pub fn classify_http_status(status: u16) -> LlmErrorKind {
    match status {
        429 => LlmErrorKind::RateLimited,
        500..=599 => LlmErrorKind::ServerError,
        _ => LlmErrorKind::ClientError,
    }
}

/// An error from an LLM provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct LlmError {
    /// What went wrong
    pub kind: LlmErrorKind,
    /// HTTP status, for HTTP failures
    pub status: Option<u16>,
    /// Details
    pub message: String,
}

impl LlmError {
    fn new(kind: LlmErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }

    /// A provider without credentials.
    pub fn not_configured(provider: &str) -> Self {
        Self::new(
            LlmErrorKind::NotConfigured,
            None,
            format!("No API key set for {provider}"),
        )
    }

    /// A non-success HTTP response.
    pub fn http(status: u16, body: &str) -> Self {
        Self::new(classify_http_status(status), Some(status), truncate(body, 300))
    }

    /// A failure before any response arrived.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Network, None, message)
    }

    /// A request that exceeded its deadline.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Timeout, None, message)
    }

    /// An unreadable reply.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Parse, None, message)
    }

    /// Whether the provider asked us to back off.
    pub fn is_rate_limited(&self) -> bool {
        self.kind == LlmErrorKind::RateLimited
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::timeout(format!("Request timeout: {e}"))
        } else if e.is_connect() {
            Self::network(format!("Connection failed: {e}"))
        } else if e.is_decode() {
            Self::parse(format!("Invalid response body: {e}"))
        } else {
            Self::network(format!("Request failed: {e}"))
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// A model endpoint that answers a single prompt.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Send `prompt` and return the reply text.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Serialize)]
struct PromptTask<'a> {
    id: &'a str,
    title: &'a str,
    description: &'a str,
    status: String,
    priority: String,
    assignee: &'a str,
    due_date: String,
}

impl<'a> From<&'a Task> for PromptTask<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            id: task.id.as_str(),
            title: &task.title,
            description: task
                .description
                .as_deref()
                .filter(|d| !d.is_empty())
                .unwrap_or("No description"),
            status: task.status.to_string(),
            priority: task.priority.to_string(),
            assignee: task
                .assignee_name
                .as_deref()
                .filter(|n| !n.is_empty())
                .unwrap_or(task.assignee_id.as_str()),
            due_date: task.due_date.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Build the dependency detection prompt.
///
/// `existing` holds `"<taskId>-><dependsOnTaskId>"` pairs the model must not
/// repeat.
pub fn build_prompt(tasks: &[Task], existing: &[String]) -> String {
    let listed: Vec<PromptTask<'_>> = tasks.iter().map(PromptTask::from).collect();
    let tasks_json = serde_json::to_string_pretty(&listed).unwrap_or_else(|_| "[]".to_string());
    let existing_json = if existing.is_empty() {
        "None".to_string()
    } else {
        serde_json::to_string(existing).unwrap_or_else(|_| "None".to_string())
    };

    format!(
        r#"You are reviewing a project plan. Find dependencies between the tasks below that are not recorded yet.

Consider:
1. Tasks that consume another task's output (for example "Design API" before "Implement API")
2. Work that has to happen in sequence (for example a database schema before backend CRUD)
3. Shared resources one task must finish before another can use them
4. Technical prerequisites (for example a frontend waiting on a backend API)

TASKS:
{tasks_json}

EXISTING DEPENDENCIES (already recorded, do not repeat):
{existing_json}

Reply with a JSON object listing new dependencies:
{{
  "dependencies": [
    {{
      "taskId": "id of the task that depends on another",
      "dependsOnTaskId": "id of the task it depends on",
      "confidence": 0.85,
      "reason": "one sentence explaining the dependency"
    }}
  ]
}}

Rules:
- Only include dependencies with confidence >= {MIN_CONFIDENCE}
- Never introduce a cycle
- Never repeat an existing dependency
- At most {MAX_SUGGESTIONS} dependencies
- Return an empty array if nothing stands out

Reply with the JSON object only."#
    )
}

#[derive(Deserialize)]
struct Reply {
    #[serde(default)]
    dependencies: Vec<RawSuggestion>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSuggestion {
    task_id: Option<String>,
    depends_on_task_id: Option<String>,
    confidence: Option<f64>,
    reason: Option<String>,
}

/// Strip a Markdown code fence around a reply, if any.
pub fn strip_code_fence(text: &str) -> &str {
    let mut cleaned = text.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }
    cleaned.trim()
}

/// Interpret a model reply as dependency suggestions.
///
/// Entries below [`MIN_CONFIDENCE`] (or without a confidence) are dropped,
/// confidences are clamped to `[0, 1]`, and at most [`MAX_SUGGESTIONS`] are
/// kept. A retained entry without both task ids invalidates the reply.
///
/// # Errors
///
/// Returns a parse error if the reply is not a dependency object.
pub fn parse_suggestions(text: &str) -> Result<Vec<SuggestedDependency>, LlmError> {
    let reply: Reply = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| LlmError::parse(format!("Failed to parse model reply: {e}")))?;

    let mut suggestions = Vec::new();
    for raw in reply.dependencies {
        let confidence = raw.confidence.unwrap_or(0.0);
        if confidence.is_nan() || confidence < MIN_CONFIDENCE {
            continue;
        }
        let (Some(task_id), Some(depends_on)) = (raw.task_id, raw.depends_on_task_id) else {
            return Err(LlmError::parse("Suggestion is missing a task id"));
        };

        suggestions.push(SuggestedDependency {
            task_id: TaskId::new(task_id),
            depends_on_task_id: TaskId::new(depends_on),
            dep_type: DependencyType::FinishToStart,
            confidence: confidence.clamp(0.0, 1.0),
            reason: raw.reason.unwrap_or_else(|| DEFAULT_REASON.to_string()),
        });
    }

    suggestions.truncate(MAX_SUGGESTIONS);
    Ok(suggestions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pathwise_core::{Priority, TaskStatus};
    use rstest::rstest;

    fn task(id: &str, name: Option<&str>, description: Option<&str>) -> Task {
        let at = Utc.with_ymd_and_hms(2024, 4, 2, 9, 30, 0).unwrap();
        Task {
            id: TaskId::new(id),
            title: format!("Title {id}"),
            description: description.map(str::to_string),
            status: TaskStatus::InProgress,
            priority: Priority::High,
            assignee_id: "user-7".to_string(),
            assignee_name: name.map(str::to_string),
            due_date: at,
            created_at: at,
        }
    }

    #[rstest]
    #[case(429, LlmErrorKind::RateLimited)]
    #[case(500, LlmErrorKind::ServerError)]
    #[case(503, LlmErrorKind::ServerError)]
    #[case(400, LlmErrorKind::ClientError)]
    #[case(401, LlmErrorKind::ClientError)]
    fn test_classify_http_status(#[case] status: u16, #[case] expected: LlmErrorKind) {
        assert_eq!(classify_http_status(status), expected);
    }

    #[test]
    fn test_http_error_keeps_status() {
        let err = LlmError::http(429, "slow down");
        assert!(err.is_rate_limited());
        assert_eq!(err.status, Some(429));
        assert_eq!(err.to_string(), "rate limited: slow down");
    }

    #[test]
    fn test_prompt_lists_tasks_and_existing_pairs() {
        let tasks = vec![task("a", Some("Ada"), None), task("b", None, Some("Wire it up"))];
        let prompt = build_prompt(&tasks, &["b->a".to_string()]);

        assert!(prompt.contains(r#""id": "a""#));
        assert!(prompt.contains(r#""assignee": "Ada""#));
        assert!(prompt.contains(r#""assignee": "user-7""#));
        assert!(prompt.contains(r#""description": "No description""#));
        assert!(prompt.contains(r#""description": "Wire it up""#));
        assert!(prompt.contains(r#""status": "IN_PROGRESS""#));
        assert!(prompt.contains(r#""due_date": "2024-04-02T09:30:00Z""#));
        assert!(prompt.contains(r#"["b->a"]"#));
    }

    #[test]
    fn test_prompt_without_existing_pairs_says_none() {
        let prompt = build_prompt(&[task("a", None, None)], &[]);
        assert!(prompt.contains("do not repeat):\nNone"));
    }

    #[rstest]
    #[case::plain(r#"{"dependencies": []}"#)]
    #[case::json_fence("```json\n{\"dependencies\": []}\n```")]
    #[case::bare_fence("```\n{\"dependencies\": []}```")]
    #[case::padded("  \n{\"dependencies\": []}  \n")]
    fn test_strip_code_fence(#[case] reply: &str) {
        assert_eq!(strip_code_fence(reply), r#"{"dependencies": []}"#);
    }

    #[test]
    fn test_parse_filters_and_fills_defaults() {
        let reply = r#"{"dependencies": [
            {"taskId": "b", "dependsOnTaskId": "a", "confidence": 0.9, "reason": "B uses A"},
            {"taskId": "c", "dependsOnTaskId": "a", "confidence": 0.5},
            {"taskId": "d", "dependsOnTaskId": "c"},
            {"taskId": "e", "dependsOnTaskId": "d", "confidence": 1.4},
            {"taskId": "f", "dependsOnTaskId": "e", "confidence": 0.7}
        ]}"#;

        let suggestions = parse_suggestions(reply).unwrap();
        let pairs: Vec<(&str, &str)> = suggestions
            .iter()
            .map(|s| (s.task_id.as_str(), s.depends_on_task_id.as_str()))
            .collect();
        assert_eq!(pairs, vec![("b", "a"), ("e", "d"), ("f", "e")]);
        assert_eq!(suggestions[0].reason, "B uses A");
        assert_eq!(suggestions[1].confidence, 1.0);
        assert_eq!(suggestions[2].reason, DEFAULT_REASON);
        assert!(suggestions
            .iter()
            .all(|s| s.dep_type == DependencyType::FinishToStart));
    }

    #[test]
    fn test_parse_caps_at_five() {
        let entries: Vec<String> = (0..8)
            .map(|i| format!(r#"{{"taskId": "t{i}", "dependsOnTaskId": "x", "confidence": 0.8}}"#))
            .collect();
        let reply = format!(r#"{{"dependencies": [{}]}}"#, entries.join(","));

        let suggestions = parse_suggestions(&reply).unwrap();
        assert_eq!(suggestions.len(), MAX_SUGGESTIONS);
        assert_eq!(suggestions[4].task_id, TaskId::new("t4"));
    }

    #[test]
    fn test_parse_missing_array_is_empty() {
        assert!(parse_suggestions("{}").unwrap().is_empty());
    }

    #[rstest]
    #[case::prose("Sure! Here are some dependencies.")]
    #[case::missing_id(r#"{"dependencies": [{"taskId": "b", "confidence": 0.9}]}"#)]
    #[case::wrong_shape(r#"{"dependencies": "none"}"#)]
    fn test_parse_rejects(#[case] reply: &str) {
        let err = parse_suggestions(reply).unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Parse);
    }

    #[test]
    fn test_low_confidence_entry_without_ids_is_ignored() {
        let reply = r#"{"dependencies": [{"confidence": 0.2}]}"#;
        assert!(parse_suggestions(reply).unwrap().is_empty());
    }
}
