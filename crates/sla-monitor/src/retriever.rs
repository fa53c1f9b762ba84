//! Prometheus retrieval adapter.
//!
//! One instant query per retrieval item against
//! `{root}/api/v1/query?query={expr}`. Items are isolated from each other:
//! a transport, status, or decode failure leaves that item's variable with
//! an empty list and never aborts the batch.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use sla_model::{Agreement, MetricValue, RetrievalItem, Variable};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};

use crate::config::PrometheusConfig;
use crate::error::RetrievalError;
use crate::obs::{emit_query_completed, emit_query_failed, emit_retrieval_finished, RetrievalSpan};
use crate::response::{self, QueryResult};
use crate::translate::translate;

/// Unique identifier of this retriever
pub const NAME: &str = "prometheus";

/// Capability to fetch metric values for the items of an agreement.
///
/// Implementations must not fail the call as a whole: every requested
/// variable is present in the returned map, with an empty list when its
/// values could not be obtained.
#[async_trait]
pub trait MetricRetriever: Send + Sync {
    async fn retrieve(
        &self,
        agreement: &Agreement,
        items: &[RetrievalItem],
    ) -> HashMap<Variable, Vec<MetricValue>>;
}

/// What happened to one retrieval item.
#[derive(Debug)]
pub enum ItemOutcome {
    Fetched { samples: usize },
    Failed(RetrievalError),
}

impl ItemOutcome {
    pub fn is_fetched(&self) -> bool {
        matches!(self, ItemOutcome::Fetched { .. })
    }

    pub fn error(&self) -> Option<&RetrievalError> {
        match self {
            ItemOutcome::Failed(err) => Some(err),
            ItemOutcome::Fetched { .. } => None,
        }
    }
}

/// Per-item record of a retrieval call.
#[derive(Debug)]
pub struct ItemReport {
    pub variable: Variable,
    pub url: String,
    pub outcome: ItemOutcome,
}

/// Values plus per-item outcomes of one retrieval call.
#[derive(Debug, Default)]
pub struct RetrievalReport {
    pub values: HashMap<Variable, Vec<MetricValue>>,
    /// In request order
    pub items: Vec<ItemReport>,
}

impl RetrievalReport {
    pub fn fetched(&self) -> usize {
        self.items.iter().filter(|i| i.outcome.is_fetched()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.fetched()
    }

    /// Outcome of the last item requesting `variable`.
    pub fn outcome(&self, variable: &Variable) -> Option<&ItemOutcome> {
        self.items
            .iter()
            .rev()
            .find(|i| &i.variable == variable)
            .map(|i| &i.outcome)
    }

    pub fn into_values(self) -> HashMap<Variable, Vec<MetricValue>> {
        self.values
    }
}

/// Retriever backed by the Prometheus HTTP query API.
#[derive(Debug, Clone)]
pub struct PrometheusRetriever {
    config: PrometheusConfig,
    http_client: reqwest::Client,
}

impl PrometheusRetriever {
    /// Create a retriever; the HTTP client enforces the configured query timeout.
    pub fn new(config: PrometheusConfig) -> Result<Self, RetrievalError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("sla-monitor/", env!("CARGO_PKG_VERSION")))
            .timeout(config.query_timeout())
            .build()?;

        tracing::info!(
            url = %config.root_url(),
            query_timeout_ms = config.query_timeout_ms,
            call_deadline_ms = ?config.call_deadline_ms,
            max_concurrent_queries = config.concurrency(),
            "Prometheus retriever configured"
        );

        Ok(PrometheusRetriever {
            config,
            http_client,
        })
    }

    /// Create a retriever from `SLA_*` environment variables
    pub fn from_env() -> Result<Self, RetrievalError> {
        Self::new(PrometheusConfig::from_env())
    }

    pub fn config(&self) -> &PrometheusConfig {
        &self.config
    }

    /// Effective backend root: the agreement's monitoring URL when set,
    /// otherwise the configured default.
    pub fn prometheus_root<'a>(&'a self, agreement: &'a Agreement) -> &'a str {
        agreement
            .monitoring_url()
            .unwrap_or_else(|| self.config.root_url())
    }

    /// Run a retrieval call and report every item's outcome.
    ///
    /// Cancelling `cancel` makes all unfinished items fail with
    /// [`RetrievalError::Cancelled`]; their variables still appear in the
    /// returned values.
    pub async fn retrieve_report(
        &self,
        agreement: &Agreement,
        items: &[RetrievalItem],
        cancel: &CancellationToken,
    ) -> RetrievalReport {
        let span = RetrievalSpan::new(&agreement.id, items.len());
        let root = self.prometheus_root(agreement);
        let deadline = self
            .config
            .call_deadline()
            .map(|budget| (Instant::now() + budget, budget));

        async move {
            debug!(root = %root, "retrieving metrics");

            let pending: Vec<_> = items
                .iter()
                .map(|item| self.retrieve_item(root, item, deadline, cancel))
                .collect();
            let results: Vec<(ItemReport, Vec<MetricValue>)> = stream::iter(pending)
                .buffered(self.config.concurrency())
                .collect()
                .await;

            let mut report = RetrievalReport::default();
            for (item, values) in results {
                report.values.insert(item.variable.clone(), values);
                report.items.push(item);
            }

            emit_retrieval_finished(&agreement.id, report.fetched(), report.failed());
            report
        }
        .instrument(span.span().clone())
        .await
    }

    async fn retrieve_item(
        &self,
        root: &str,
        item: &RetrievalItem,
        deadline: Option<(Instant, Duration)>,
        cancel: &CancellationToken,
    ) -> (ItemReport, Vec<MetricValue>) {
        let variable = &item.variable;
        let url = query_url(root, &variable.metric);

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RetrievalError::Cancelled),
            result = within_deadline(deadline, self.query(&url)) => result,
        };

        let (outcome, values) = match fetched {
            Ok((status, result)) => {
                let values = translate(&result, &variable.name);
                emit_query_completed(&variable.name, &url, status, values.len());
                (
                    ItemOutcome::Fetched {
                        samples: values.len(),
                    },
                    values,
                )
            }
            Err(err) => {
                emit_query_failed(&variable.name, &url, &err);
                (ItemOutcome::Failed(err), Vec::new())
            }
        };

        let report = ItemReport {
            variable: variable.clone(),
            url,
            outcome,
        };
        (report, values)
    }

    async fn query(&self, url: &str) -> Result<(u16, QueryResult), RetrievalError> {
        let response = self.http_client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let result = response::decode(&body)?;
        Ok((status.as_u16(), result))
    }
}

#[async_trait]
impl MetricRetriever for PrometheusRetriever {
    async fn retrieve(
        &self,
        agreement: &Agreement,
        items: &[RetrievalItem],
    ) -> HashMap<Variable, Vec<MetricValue>> {
        self.retrieve_report(agreement, items, &CancellationToken::new())
            .await
            .into_values()
    }
}

/// Instant-query URL for a raw expression. The expression is not escaped.
pub fn query_url(root: &str, expr: &str) -> String {
    format!("{}/api/v1/query?query={}", root.trim_end_matches('/'), expr)
}

async fn within_deadline<T, F>(
    deadline: Option<(Instant, Duration)>,
    fut: F,
) -> Result<T, RetrievalError>
where
    F: Future<Output = Result<T, RetrievalError>>,
{
    match deadline {
        Some((at, budget)) => tokio::time::timeout_at(at, fut)
            .await
            .unwrap_or(Err(RetrievalError::DeadlineExceeded(budget))),
        None => fut.await,
    }
}
