//! Delivery to several sinks at once.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use sla_model::{Agreement, AssessmentResult};

use crate::traits::{emit_notify_outcome, NotifyOutcome, ViolationNotifier};

/// Unique identifier of this notifier
pub const NAME: &str = "fanout";

/// Delivers every result to all registered sinks concurrently.
///
/// A failing sink never prevents delivery to the others; each sink's
/// outcome is logged on its own.
#[derive(Clone, Default)]
pub struct FanoutNotifier {
    sinks: Vec<Arc<dyn ViolationNotifier>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn ViolationNotifier>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn push(&mut self, sink: Arc<dyn ViolationNotifier>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Deliver to every sink and return each outcome in registration order.
    pub async fn deliver_all(
        &self,
        agreement: &Agreement,
        result: &AssessmentResult,
    ) -> Vec<(&'static str, NotifyOutcome)> {
        let deliveries = self.sinks.iter().map(|sink| async move {
            let outcome = sink.deliver(agreement, result).await;
            emit_notify_outcome(sink.name(), &agreement.id, &outcome);
            (sink.name(), outcome)
        });
        join_all(deliveries).await
    }
}

impl std::fmt::Debug for FanoutNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutNotifier")
            .field("sinks", &self.sink_names())
            .finish()
    }
}

#[async_trait]
impl ViolationNotifier for FanoutNotifier {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn deliver(&self, agreement: &Agreement, result: &AssessmentResult) -> NotifyOutcome {
        let outcomes = self.deliver_all(agreement, result).await;
        summarize(&outcomes)
    }

    async fn shutdown(&self) {
        join_all(self.sinks.iter().map(|sink| sink.shutdown())).await;
    }
}

fn summarize(outcomes: &[(&'static str, NotifyOutcome)]) -> NotifyOutcome {
    let mut delivered = 0;
    let mut failed = 0;
    let mut reasons = Vec::new();
    let mut sent_anything = false;

    for (name, outcome) in outcomes {
        match outcome {
            NotifyOutcome::NothingToSend => {}
            NotifyOutcome::Delivered { violations } => {
                sent_anything = true;
                delivered += violations;
            }
            NotifyOutcome::Failed {
                delivered: d,
                failed: f,
                reason,
            } => {
                delivered += d;
                failed += f;
                reasons.push(format!("{name}: {reason}"));
            }
        }
    }

    if !reasons.is_empty() {
        NotifyOutcome::Failed {
            delivered,
            failed,
            reason: reasons.join("; "),
        }
    } else if sent_anything {
        NotifyOutcome::Delivered {
            violations: delivered,
        }
    } else {
        NotifyOutcome::NothingToSend
    }
}
