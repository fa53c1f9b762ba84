//! REST notifier: one JSON POST per assessment result with violations.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use sla_model::{Agreement, AssessmentResult, Client, Violation};
use tracing::{debug, info};

use crate::error::NotifyError;
use crate::traits::{NotifyOutcome, ViolationNotifier};

/// Unique identifier of this notifier
pub const NAME: &str = "rest";

/// Content type sent with every notification
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

/// Default notification request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// REST notifier configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestNotifierConfig {
    /// Endpoint receiving the POST; empty disables the notifier
    pub url: String,
    pub timeout_ms: u64,
}

impl Default for RestNotifierConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl RestNotifierConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Load from `SLA_NOTIFICATIONURL`
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("SLA_NOTIFICATIONURL") {
            self.url = url;
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn is_enabled(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// Body of a violation notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub agreement_id: String,
    pub client: Client,
    /// Distinct violated guarantee names, sorted and comma-separated
    pub guarantee_name: String,
    pub violations: Vec<Violation>,
}

impl ViolationInfo {
    /// Build the notification body, or `None` when there is nothing to report.
    pub fn from_result(agreement: &Agreement, result: &AssessmentResult) -> Option<Self> {
        if !result.has_violations() {
            return None;
        }

        let guarantee_name = result
            .violated_guarantees()
            .into_iter()
            .collect::<Vec<_>>()
            .join(",");

        Some(Self {
            kind: "violation".to_string(),
            agreement_id: agreement.id.clone(),
            client: agreement.client().clone(),
            guarantee_name,
            violations: result.violations().into_iter().cloned().collect(),
        })
    }
}

/// Notifier posting violations to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct RestNotifier {
    config: RestNotifierConfig,
    http_client: reqwest::Client,
}

impl RestNotifier {
    pub fn new(config: RestNotifierConfig) -> Result<Self, NotifyError> {
        if !config.is_enabled() {
            return Err(NotifyError::NotConfigured(
                "REST notifier requires a notification URL".to_string(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("sla-notifier/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()?;

        info!(url = %config.url, "REST notifier configured");
        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    async fn post(&self, info: &ViolationInfo) -> Result<(), NotifyError> {
        let body = serde_json::to_vec(info)?;
        let response = self
            .http_client
            .post(&self.config.url)
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status {
                status: status.as_u16(),
            });
        }
        debug!(status = status.as_u16(), "notification accepted");
        Ok(())
    }
}

#[async_trait]
impl ViolationNotifier for RestNotifier {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn deliver(&self, agreement: &Agreement, result: &AssessmentResult) -> NotifyOutcome {
        let Some(info) = ViolationInfo::from_result(agreement, result) else {
            return NotifyOutcome::NothingToSend;
        };

        let count = info.violations.len();
        info!(
            agreement_id = %agreement.id,
            violations = count,
            url = %self.config.url,
            "Sending violation notification"
        );

        match self.post(&info).await {
            Ok(()) => NotifyOutcome::Delivered { violations: count },
            Err(err) => NotifyOutcome::Failed {
                delivered: 0,
                failed: count,
                reason: err.to_string(),
            },
        }
    }
}
