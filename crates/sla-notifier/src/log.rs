//! Notifier that only writes violations to the log.

use async_trait::async_trait;
use sla_model::{Agreement, AssessmentResult};
use tracing::warn;

use crate::traits::{NotifyOutcome, ViolationNotifier};

/// Unique identifier of this notifier
pub const NAME: &str = "log";

/// Emits one warning event per violation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl ViolationNotifier for LogNotifier {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn deliver(&self, agreement: &Agreement, result: &AssessmentResult) -> NotifyOutcome {
        let violations = result.violations();
        if violations.is_empty() {
            return NotifyOutcome::NothingToSend;
        }

        for violation in &violations {
            warn!(
                event = "violation",
                agreement_id = %agreement.id,
                guarantee = %violation.guarantee,
                datetime = %violation.datetime.to_rfc3339(),
                constraint = %violation.constraint,
            );
        }
        NotifyOutcome::Delivered {
            violations: violations.len(),
        }
    }
}
