//! Structured observability hooks for metric retrieval.
//!
//! This module provides:
//! - An agreement-scoped tracing span via the `RetrievalSpan` RAII guard
//! - Emission functions for per-query events: completed, failed, and the
//!   end-of-call summary
//!
//! Events are emitted with an `event` field so they can be filtered in JSON
//! log pipelines (`event = "query.failed"`).

use tracing::{info, warn};

use crate::error::RetrievalError;

/// Span covering one retrieval call for an agreement.
pub struct RetrievalSpan {
    span: tracing::Span,
}

impl RetrievalSpan {
    /// Create a span tagged with the agreement id and item count.
    pub fn new(agreement_id: &str, items: usize) -> Self {
        Self {
            span: tracing::info_span!("sla.retrieve", agreement_id = %agreement_id, items = items),
        }
    }

    /// The span, for instrumenting futures.
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }
}

/// Emit event: a query answered and was translated.
pub fn emit_query_completed(variable: &str, url: &str, status: u16, samples: usize) {
    info!(
        event = "query.completed",
        variable = %variable,
        url = %url,
        status = status,
        samples = samples,
    );
}

/// Emit event: a query produced no values (warning level).
///
/// Decode failures and availability failures are told apart by the
/// `kind` field.
pub fn emit_query_failed(variable: &str, url: &str, error: &RetrievalError) {
    let kind = if error.is_decode() {
        "decode"
    } else if error.is_availability() {
        "availability"
    } else {
        "aborted"
    };
    warn!(
        event = "query.failed",
        variable = %variable,
        url = %url,
        kind = kind,
        error = %error,
    );
}

/// Emit event: a retrieval call finished.
pub fn emit_retrieval_finished(agreement_id: &str, fetched: usize, failed: usize) {
    info!(
        event = "retrieve.finished",
        agreement_id = %agreement_id,
        fetched = fetched,
        failed = failed,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn query_failed_reports_kind() {
        emit_query_failed(
            "latency",
            "http://localhost:9090/api/v1/query?query=up",
            &RetrievalError::Status { status: 503 },
        );
        assert!(logs_contain("query.failed"));
        assert!(logs_contain("availability"));
    }

    #[test]
    fn retrieval_span_create() {
        let span = RetrievalSpan::new("a01", 3);
        let _entered = span.span().enter();
    }
}
