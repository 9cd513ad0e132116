//! Dependency detection with provider fallback.
//!
//! Attempts run through a fixed sequence of stages:
//!
//! ```text
//! Primary --(error)--> Secondary --(error)--> Exhausted (no suggestions)
//! ```
//!
//! A stage whose provider is not configured is skipped. A reply that arrives
//! but cannot be interpreted ends detection with no suggestions; it is not
//! retried on the next provider.

use super::gemini::GeminiClient;
use super::groq::GroqClient;
use super::llm::{build_prompt, parse_suggestions, LlmError, LlmProvider};
use super::DependencyDetector;
use crate::config::PathwiseConfig;
use async_trait::async_trait;
use pathwise_core::{SuggestedDependency, Task};
use std::time::Duration;

/// Detector needs at least this many tasks to relate.
pub const MIN_TASKS_FOR_DETECTION: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Primary,
    Secondary,
    Exhausted,
}

impl Stage {
    fn next(self) -> Self {
        match self {
            Self::Primary => Self::Secondary,
            Self::Secondary | Self::Exhausted => Self::Exhausted,
        }
    }
}

/// LLM-backed dependency detector with a primary and a fallback provider.
pub struct FallbackDetector {
    primary: Option<Box<dyn LlmProvider>>,
    secondary: Option<Box<dyn LlmProvider>>,
    timeout: Duration,
}

impl std::fmt::Debug for FallbackDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackDetector")
            .field("primary", &self.primary.as_ref().map(|p| p.name()))
            .field("secondary", &self.secondary.as_ref().map(|p| p.name()))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl FallbackDetector {
    /// Create a detector from explicit providers.
    pub fn new(
        primary: Option<Box<dyn LlmProvider>>,
        secondary: Option<Box<dyn LlmProvider>>,
        timeout: Duration,
    ) -> Self {
        Self {
            primary,
            secondary,
            timeout,
        }
    }

    /// Groq as primary and Gemini as fallback, each only when its key is set.
    pub fn from_config(config: &PathwiseConfig, client: &reqwest::Client) -> Self {
        let primary = config.groq_api_key().map(|key| {
            tracing::debug!("Groq provider configured");
            Box::new(GroqClient::new(client.clone(), key)) as Box<dyn LlmProvider>
        });
        let secondary = config.gemini_api_key().map(|key| {
            tracing::debug!("Gemini provider configured");
            Box::new(GeminiClient::new(client.clone(), key)) as Box<dyn LlmProvider>
        });
        Self::new(primary, secondary, config.llm_timeout())
    }

    /// Whether any provider is available.
    pub fn is_configured(&self) -> bool {
        self.primary.is_some() || self.secondary.is_some()
    }

    fn provider(&self, stage: Stage) -> Option<&dyn LlmProvider> {
        match stage {
            Stage::Primary => self.primary.as_deref(),
            Stage::Secondary => self.secondary.as_deref(),
            Stage::Exhausted => None,
        }
    }

    async fn complete_within_timeout(
        &self,
        provider: &dyn LlmProvider,
        prompt: &str,
    ) -> Result<String, LlmError> {
        match tokio::time::timeout(self.timeout, provider.complete(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::timeout(format!(
                "No reply within {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}

#[async_trait]
impl DependencyDetector for FallbackDetector {
    async fn detect_dependencies(
        &self,
        tasks: &[Task],
        existing: &[String],
    ) -> Vec<SuggestedDependency> {
        if tasks.len() < MIN_TASKS_FOR_DETECTION {
            return Vec::new();
        }
        if !self.is_configured() {
            let err = LlmError::not_configured("Groq and Gemini");
            tracing::error!(error = %err, "No LLM provider available for dependency detection");
            return Vec::new();
        }

        let prompt = build_prompt(tasks, existing);
        let mut stage = Stage::Primary;

        while stage != Stage::Exhausted {
            let Some(provider) = self.provider(stage) else {
                stage = stage.next();
                continue;
            };

            tracing::info!(provider = provider.name(), "Detecting dependencies");
            match self.complete_within_timeout(provider, &prompt).await {
                Ok(reply) => {
                    return match parse_suggestions(&reply) {
                        Ok(suggestions) => {
                            tracing::info!(
                                provider = provider.name(),
                                suggestions = suggestions.len(),
                                "Dependency detection complete"
                            );
                            suggestions
                        }
                        Err(e) => {
                            let preview: String = reply.chars().take(500).collect();
                            tracing::error!(
                                provider = provider.name(),
                                error = %e,
                                reply = %preview,
                                "Discarding unreadable model reply"
                            );
                            Vec::new()
                        }
                    };
                }
                Err(e) if e.is_rate_limited() => {
                    tracing::warn!(provider = provider.name(), "Rate limited, falling back");
                }
                Err(e) => {
                    tracing::error!(provider = provider.name(), error = %e, "Provider failed, falling back");
                }
            }
            stage = stage.next();
        }

        tracing::warn!("All LLM providers failed; returning no suggestions");
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pathwise_core::{Priority, TaskId, TaskStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const ONE_SUGGESTION: &str =
        r#"{"dependencies": [{"taskId": "b", "dependsOnTaskId": "a", "confidence": 0.9}]}"#;

    enum Behavior {
        Reply(&'static str),
        Fail(LlmError),
        Hang,
    }

    struct ScriptedProvider {
        name: &'static str,
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedProvider {
        fn boxed(
            name: &'static str,
            behavior: Behavior,
        ) -> (Option<Box<dyn LlmProvider>>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let provider: Box<dyn LlmProvider> = Box::new(Self {
                name,
                behavior,
                calls: Arc::clone(&calls),
            });
            (Some(provider), calls)
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Reply(text) => Ok((*text).to_string()),
                Behavior::Fail(e) => Err(e.clone()),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(String::new())
                }
            }
        }
    }

    fn tasks(n: usize) -> Vec<Task> {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| Task {
                id: TaskId::new(format!("t{i}")),
                title: format!("Task {i}"),
                description: None,
                status: TaskStatus::Todo,
                priority: Priority::Medium,
                assignee_id: "u1".to_string(),
                assignee_name: None,
                due_date: at,
                created_at: at,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_primary_success_skips_secondary() {
        let (primary, primary_calls) = ScriptedProvider::boxed("p", Behavior::Reply(ONE_SUGGESTION));
        let (secondary, secondary_calls) = ScriptedProvider::boxed("s", Behavior::Reply("{}"));
        let detector = FallbackDetector::new(primary, secondary, Duration::from_secs(5));

        let suggestions = detector.detect_dependencies(&tasks(2), &[]).await;
        assert_eq!(suggestions.len(), 1);
        assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
        assert_eq!(secondary_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rate_limit_falls_back() {
        let (primary, _) = ScriptedProvider::boxed("p", Behavior::Fail(LlmError::http(429, "")));
        let (secondary, secondary_calls) =
            ScriptedProvider::boxed("s", Behavior::Reply(ONE_SUGGESTION));
        let detector = FallbackDetector::new(primary, secondary, Duration::from_secs(5));

        let suggestions = detector.detect_dependencies(&tasks(3), &[]).await;
        assert_eq!(suggestions.len(), 1);
        assert_eq!(secondary_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_both_failing_yields_empty() {
        let (primary, _) = ScriptedProvider::boxed("p", Behavior::Fail(LlmError::network("down")));
        let (secondary, _) = ScriptedProvider::boxed("s", Behavior::Fail(LlmError::http(500, "")));
        let detector = FallbackDetector::new(primary, secondary, Duration::from_secs(5));

        assert!(detector.detect_dependencies(&tasks(3), &[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_primary_goes_straight_to_secondary() {
        let (secondary, secondary_calls) =
            ScriptedProvider::boxed("s", Behavior::Reply(ONE_SUGGESTION));
        let detector = FallbackDetector::new(None, secondary, Duration::from_secs(5));

        assert_eq!(detector.detect_dependencies(&tasks(2), &[]).await.len(), 1);
        assert_eq!(secondary_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreadable_reply_does_not_fall_back() {
        let (primary, _) = ScriptedProvider::boxed("p", Behavior::Reply("not json"));
        let (secondary, secondary_calls) =
            ScriptedProvider::boxed("s", Behavior::Reply(ONE_SUGGESTION));
        let detector = FallbackDetector::new(primary, secondary, Duration::from_secs(5));

        assert!(detector.detect_dependencies(&tasks(2), &[]).await.is_empty());
        assert_eq!(secondary_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_primary_times_out_and_falls_back() {
        let (primary, _) = ScriptedProvider::boxed("p", Behavior::Hang);
        let (secondary, _) = ScriptedProvider::boxed("s", Behavior::Reply(ONE_SUGGESTION));
        let detector = FallbackDetector::new(primary, secondary, Duration::from_secs(2));

        assert_eq!(detector.detect_dependencies(&tasks(2), &[]).await.len(), 1);
    }

    #[tokio::test]
    async fn test_fewer_than_two_tasks_skips_providers() {
        let (primary, primary_calls) =
            ScriptedProvider::boxed("p", Behavior::Reply(ONE_SUGGESTION));
        let detector = FallbackDetector::new(primary, None, Duration::from_secs(5));

        assert!(detector.detect_dependencies(&tasks(1), &[]).await.is_empty());
        assert_eq!(primary_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unconfigured_detector_is_empty() {
        let detector = FallbackDetector::new(None, None, Duration::from_secs(5));
        assert!(!detector.is_configured());
        assert!(detector.detect_dependencies(&tasks(4), &[]).await.is_empty());
    }

    #[test]
    fn test_from_config_uses_available_keys() {
        let config = PathwiseConfig {
            gemini_api_key: Some("g-key".to_string()),
            ..PathwiseConfig::default()
        };
        let detector = FallbackDetector::from_config(&config, &reqwest::Client::new());

        let debug = format!("{detector:?}");
        assert!(debug.contains("primary: None"));
        assert!(debug.contains(r#"secondary: Some("gemini")"#));
    }
}
