//! HTTP risk notifier.

use super::{NotifyError, RiskAlert, RiskNotifier};
use crate::config::PathwiseConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Path appended to the notifier base URL.
pub const RISK_ALERT_PATH: &str = "/api/internal/risk-alert";

/// Posts risk alerts to the project service's internal endpoint.
#[derive(Debug, Clone)]
pub struct HttpRiskNotifier {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpRiskNotifier {
    /// Create a notifier for the service at `base_url`.
    pub fn new(client: Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: format!("{}{RISK_ALERT_PATH}", base_url.trim_end_matches('/')),
            timeout,
        }
    }

    /// Create a notifier from configuration.
    pub fn from_config(config: &PathwiseConfig, client: &Client) -> Self {
        Self::new(client.clone(), &config.notifier_url, config.notify_timeout())
    }

    /// Full URL alerts are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RiskNotifier for HttpRiskNotifier {
    async fn notify(&self, alert: &RiskAlert) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(alert)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Timeout
                } else {
                    NotifyError::Request(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }

        tracing::info!(
            project = %alert.project_id,
            score = alert.risk_score,
            "Risk alert sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://localhost:5000", "http://localhost:5000/api/internal/risk-alert")]
    #[case("http://localhost:5000/", "http://localhost:5000/api/internal/risk-alert")]
    #[case("https://pm.example.com/node", "https://pm.example.com/node/api/internal/risk-alert")]
    fn test_endpoint(#[case] base: &str, #[case] expected: &str) {
        let notifier = HttpRiskNotifier::new(Client::new(), base, Duration::from_secs(10));
        assert_eq!(notifier.endpoint(), expected);
    }

    #[test]
    fn test_from_config() {
        let config = PathwiseConfig {
            notifier_url: "http://node:4000".to_string(),
            notify_timeout_secs: 3,
            ..PathwiseConfig::default()
        };
        let notifier = HttpRiskNotifier::from_config(&config, &Client::new());

        assert_eq!(notifier.endpoint(), "http://node:4000/api/internal/risk-alert");
        assert_eq!(notifier.timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        // Port 9 (discard) is not expected to serve HTTP.
        let notifier =
            HttpRiskNotifier::new(Client::new(), "http://127.0.0.1:9", Duration::from_secs(2));
        let alert = RiskAlert {
            project_id: "p1".to_string(),
            project_name: "Apollo".to_string(),
            risk_score: 10,
            risk_level: pathwise_core::RiskLevel::Critical,
        };

        assert!(notifier.notify(&alert).await.is_err());
    }
}
