//! The notifier capability and delivery outcomes.

use async_trait::async_trait;
use sla_model::{Agreement, AssessmentResult};
use tracing::{debug, info, warn};

/// Result of one delivery attempt by a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// The result carried no violations; nothing was sent
    NothingToSend,
    /// Every violation was handed to the destination
    Delivered { violations: usize },
    /// Some or all violations could not be delivered
    Failed {
        delivered: usize,
        failed: usize,
        reason: String,
    },
}

impl NotifyOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, NotifyOutcome::Failed { .. })
    }

    /// Violations handed to the destination
    pub fn delivered(&self) -> usize {
        match self {
            NotifyOutcome::NothingToSend => 0,
            NotifyOutcome::Delivered { violations } => *violations,
            NotifyOutcome::Failed { delivered, .. } => *delivered,
        }
    }
}

/// Capability to tell an external party that an agreement was violated.
///
/// `deliver` reports what happened; `notify_violations` is the
/// fire-and-forget entry point the assessment engine uses. Neither may
/// panic or surface an error to the caller.
#[async_trait]
pub trait ViolationNotifier: Send + Sync {
    /// Short sink name used in logs and configuration
    fn name(&self) -> &'static str;

    async fn deliver(&self, agreement: &Agreement, result: &AssessmentResult) -> NotifyOutcome;

    async fn notify_violations(&self, agreement: &Agreement, result: &AssessmentResult) {
        let outcome = self.deliver(agreement, result).await;
        emit_notify_outcome(self.name(), &agreement.id, &outcome);
    }

    /// Release held connections. Delivery after shutdown reopens them.
    async fn shutdown(&self) {}
}

/// Emit event: a sink finished handling an assessment result.
pub fn emit_notify_outcome(sink: &str, agreement_id: &str, outcome: &NotifyOutcome) {
    match outcome {
        NotifyOutcome::NothingToSend => debug!(
            event = "notify.skipped",
            sink = %sink,
            agreement_id = %agreement_id,
        ),
        NotifyOutcome::Delivered { violations } => info!(
            event = "notify.delivered",
            sink = %sink,
            agreement_id = %agreement_id,
            violations = violations,
        ),
        NotifyOutcome::Failed {
            delivered,
            failed,
            reason,
        } => warn!(
            event = "notify.failed",
            sink = %sink,
            agreement_id = %agreement_id,
            delivered = delivered,
            failed = failed,
            reason = %reason,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_outcome_counts() {
        assert_eq!(NotifyOutcome::NothingToSend.delivered(), 0);
        assert_eq!(NotifyOutcome::Delivered { violations: 3 }.delivered(), 3);
        let failed = NotifyOutcome::Failed {
            delivered: 1,
            failed: 2,
            reason: "broker down".to_string(),
        };
        assert_eq!(failed.delivered(), 1);
        assert!(failed.is_failure());
        assert!(!NotifyOutcome::NothingToSend.is_failure());
    }

    #[traced_test]
    #[test]
    fn failed_outcome_is_logged_as_warning() {
        emit_notify_outcome(
            "rest",
            "a01",
            &NotifyOutcome::Failed {
                delivered: 0,
                failed: 1,
                reason: "HTTP 500".to_string(),
            },
        );
        assert!(logs_contain("notify.failed"));
        assert!(logs_contain("HTTP 500"));
    }
}
