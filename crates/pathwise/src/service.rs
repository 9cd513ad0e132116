//! Analysis orchestration.
//!
//! [`AnalysisService`] runs the deterministic engine, then consults the
//! optional collaborators. Collaborators run under their own timeouts and
//! their failures are logged, never returned: the engine's findings are
//! always delivered.
//!
//! Risk alerts are sent on a background task so `analyze` returns as soon as
//! the result is known. Call [`AnalysisService::flush_alerts`] before the
//! runtime shuts down to wait for alerts still in flight.

use crate::collab::fallback::MIN_TASKS_FOR_DETECTION;
use crate::collab::{
    DependencyDetector, FallbackDetector, HttpRiskNotifier, RiskAlert, RiskNotifier,
};
use crate::config::{
    PathwiseConfig, DEFAULT_ALERT_THRESHOLD, DEFAULT_LLM_TIMEOUT_SECS, DEFAULT_NOTIFY_TIMEOUT_SECS,
};
use chrono::{DateTime, Utc};
use pathwise_core::{ProjectSnapshot, RiskAnalysis, SuggestedDependency};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Runs analyses and their collaborators.
pub struct AnalysisService {
    detector: Option<Box<dyn DependencyDetector>>,
    notifier: Option<Arc<dyn RiskNotifier>>,
    alert_threshold: u8,
    detector_timeout: Duration,
    notify_timeout: Duration,
    pending_alerts: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for AnalysisService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisService")
            .field("detector", &self.detector.is_some())
            .field("notifier", &self.notifier.is_some())
            .field("alert_threshold", &self.alert_threshold)
            .finish_non_exhaustive()
    }
}

impl Default for AnalysisService {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_THRESHOLD)
    }
}

impl AnalysisService {
    /// Create a service without collaborators.
    pub fn new(alert_threshold: u8) -> Self {
        Self {
            detector: None,
            notifier: None,
            alert_threshold,
            // The detector tries two providers, each with its own timeout.
            detector_timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS * 2),
            notify_timeout: Duration::from_secs(DEFAULT_NOTIFY_TIMEOUT_SECS),
            pending_alerts: Mutex::new(Vec::new()),
        }
    }

    /// Use `detector` for dependency suggestions.
    #[must_use]
    pub fn with_detector(mut self, detector: impl DependencyDetector + 'static) -> Self {
        self.detector = Some(Box::new(detector));
        self
    }

    /// Use `notifier` for risk alerts.
    #[must_use]
    pub fn with_notifier(mut self, notifier: impl RiskNotifier + 'static) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    /// Override the overall collaborator timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, detector: Duration, notify: Duration) -> Self {
        self.detector_timeout = detector;
        self.notify_timeout = notify;
        self
    }

    /// Build the service described by `config`.
    ///
    /// With `offline` set no collaborators are attached.
    pub fn from_config(config: &PathwiseConfig, offline: bool) -> Self {
        let service = Self::new(config.alert_threshold)
            .with_timeouts(config.llm_timeout() * 2, config.notify_timeout());
        if offline {
            tracing::debug!("Offline mode, collaborators disabled");
            return service;
        }

        let client = reqwest::Client::new();
        service
            .with_detector(FallbackDetector::from_config(config, &client))
            .with_notifier(HttpRiskNotifier::from_config(config, &client))
    }

    /// The alert threshold.
    pub fn alert_threshold(&self) -> u8 {
        self.alert_threshold
    }

    /// Run the full analysis of `snapshot` at `now`.
    pub async fn analyze(&self, snapshot: &ProjectSnapshot, now: DateTime<Utc>) -> RiskAnalysis {
        tracing::info!(
            project = %snapshot.id,
            tasks = snapshot.tasks.len(),
            dependencies = snapshot.existing_dependencies.len(),
            "Analyzing project"
        );

        let report = pathwise_core::analyze(snapshot, now);
        let suggestions = self.detect_dependencies(snapshot).await;
        let analysis = RiskAnalysis::new(snapshot.id.clone(), report, suggestions, now);

        if analysis.risk_score() < self.alert_threshold {
            self.send_alert(RiskAlert::for_analysis(snapshot, &analysis))
                .await;
        }

        analysis
    }

    /// Ask the detector for new dependencies between the snapshot's tasks.
    ///
    /// Empty when fewer than two tasks exist, no detector is attached, or
    /// the detector does not answer in time.
    pub async fn detect_dependencies(&self, snapshot: &ProjectSnapshot) -> Vec<SuggestedDependency> {
        if snapshot.tasks.len() < MIN_TASKS_FOR_DETECTION {
            return Vec::new();
        }
        let Some(detector) = &self.detector else {
            return Vec::new();
        };

        let existing = snapshot.dependency_pairs();
        let detection = detector.detect_dependencies(&snapshot.tasks, &existing);
        if let Ok(suggestions) = tokio::time::timeout(self.detector_timeout, detection).await {
            suggestions
        } else {
            tracing::warn!(
                timeout_secs = self.detector_timeout.as_secs(),
                "Dependency detection timed out"
            );
            Vec::new()
        }
    }

    /// Wait for risk alerts that are still being delivered.
    pub async fn flush_alerts(&self) {
        let pending = std::mem::take(&mut *self.pending_alerts.lock().await);
        for handle in pending {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Risk alert task failed");
            }
        }
    }

    async fn send_alert(&self, alert: RiskAlert) {
        let Some(notifier) = &self.notifier else {
            tracing::debug!(score = alert.risk_score, "No notifier attached, alert not sent");
            return;
        };

        let notifier = Arc::clone(notifier);
        let timeout = self.notify_timeout;
        let handle = tokio::spawn(async move {
            match tokio::time::timeout(timeout, notifier.notify(&alert)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(project = %alert.project_id, error = %e, "Failed to send risk alert");
                }
                Err(_) => {
                    tracing::warn!(project = %alert.project_id, "Risk alert timed out");
                }
            }
        });

        let mut pending = self.pending_alerts.lock().await;
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }
}
