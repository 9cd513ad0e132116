//! External collaborators of an analysis.
//!
//! The engine's results never depend on these: a detector that fails yields
//! no suggestions, and a notifier that fails is only logged. Both are
//! explicitly constructed and handed to
//! [`AnalysisService`](crate::service::AnalysisService), so tests can swap in
//! doubles.
//!
//! # Implementations
//!
//! - [`FallbackDetector`]: Groq first, then Gemini, then nothing
//! - [`HttpRiskNotifier`]: `POST {base}/api/internal/risk-alert`

pub mod fallback;
pub mod gemini;
pub mod groq;
pub mod llm;
pub mod notifier;

pub use fallback::FallbackDetector;
pub use gemini::GeminiClient;
pub use groq::GroqClient;
pub use llm::{LlmError, LlmErrorKind, LlmProvider};
pub use notifier::HttpRiskNotifier;

use async_trait::async_trait;
use pathwise_core::{ProjectSnapshot, RiskAnalysis, RiskLevel, SuggestedDependency, Task};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Proposes dependencies the project has not recorded yet.
#[async_trait]
pub trait DependencyDetector: Send + Sync {
    /// Suggest new dependencies between `tasks`.
    ///
    /// `existing` holds the already-recorded edges as
    /// `"<taskId>-><dependsOnTaskId>"`. Implementations absorb their own
    /// failures and return an empty list instead.
    async fn detect_dependencies(
        &self,
        tasks: &[Task],
        existing: &[String],
    ) -> Vec<SuggestedDependency>;
}

/// Payload of a risk alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAlert {
    /// Project the alert is about
    pub project_id: String,

    /// Project display name
    pub project_name: String,

    /// Score that triggered the alert
    pub risk_score: u8,

    /// Level for that score
    pub risk_level: RiskLevel,
}

impl RiskAlert {
    /// Build the alert for an analysis of `snapshot`.
    pub fn for_analysis(snapshot: &ProjectSnapshot, analysis: &RiskAnalysis) -> Self {
        Self {
            project_id: snapshot.id.clone(),
            project_name: snapshot.name.clone(),
            risk_score: analysis.risk_score(),
            risk_level: analysis.risk_level(),
        }
    }
}

/// Errors from delivering a risk alert.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The request could not be sent or did not complete.
    #[error("Risk alert request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The notifier answered with a non-success status.
    #[error("Risk alert rejected with status {0}")]
    Status(u16),

    /// Delivery did not finish in time.
    #[error("Risk alert timed out")]
    Timeout,
}

/// Delivers risk alerts to whoever watches project health.
#[async_trait]
pub trait RiskNotifier: Send + Sync {
    /// Send `alert`.
    ///
    /// # Errors
    ///
    /// Returns an error when delivery fails; callers only log it.
    async fn notify(&self, alert: &RiskAlert) -> Result<(), NotifyError>;
}
