//! Prometheus retriever configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backend root used when neither configuration nor agreement sets one.
pub const DEFAULT_PROMETHEUS_URL: &str = "http://localhost:9090";

const DEFAULT_QUERY_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_MAX_CONCURRENT_QUERIES: usize = 4;

/// Prometheus retriever configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrometheusConfig {
    /// Default Prometheus root URL (agreements may override it)
    pub url: String,
    /// Timeout of each query request, in milliseconds
    pub query_timeout_ms: u64,
    /// Deadline for a whole retrieval call, in milliseconds
    pub call_deadline_ms: Option<u64>,
    /// Maximum number of queries in flight per retrieval call
    pub max_concurrent_queries: usize,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        PrometheusConfig {
            url: DEFAULT_PROMETHEUS_URL.to_string(),
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT_MS,
            call_deadline_ms: None,
            max_concurrent_queries: DEFAULT_MAX_CONCURRENT_QUERIES,
        }
    }
}

impl PrometheusConfig {
    /// Create a config for a specific Prometheus root
    pub fn new(url: &str) -> Self {
        PrometheusConfig {
            url: url.to_string(),
            ..Default::default()
        }
    }

    /// Build from defaults overridden by `SLA_*` environment variables
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `SLA_PROMETHEUSURL`, `SLA_QUERYTIMEOUTMS`, `SLA_CALLDEADLINEMS`
    /// and `SLA_MAXCONCURRENTQUERIES` when present. Unparseable numbers are
    /// ignored with a warning.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("SLA_PROMETHEUSURL") {
            if !url.trim().is_empty() {
                self.url = url;
            }
        }
        if let Some(ms) = env_number("SLA_QUERYTIMEOUTMS") {
            self.query_timeout_ms = ms;
        }
        if let Some(ms) = env_number("SLA_CALLDEADLINEMS") {
            self.call_deadline_ms = Some(ms);
        }
        if let Some(n) = env_number("SLA_MAXCONCURRENTQUERIES") {
            self.max_concurrent_queries = n;
        }
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_call_deadline(mut self, deadline: Duration) -> Self {
        self.call_deadline_ms = Some(deadline.as_millis() as u64);
        self
    }

    pub fn with_max_concurrent_queries(mut self, n: usize) -> Self {
        self.max_concurrent_queries = n;
        self
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn call_deadline(&self) -> Option<Duration> {
        self.call_deadline_ms.map(Duration::from_millis)
    }

    /// Never zero.
    pub fn concurrency(&self) -> usize {
        self.max_concurrent_queries.max(1)
    }

    /// Default root with an unset value replaced by the built-in default
    pub fn root_url(&self) -> &str {
        let url = self.url.trim();
        if url.is_empty() {
            DEFAULT_PROMETHEUS_URL
        } else {
            url
        }
    }
}

fn env_number<T: std::str::FromStr>(var: &str) -> Option<T> {
    let raw = std::env::var(var).ok()?;
    match raw.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!(var = %var, value = %raw, "ignoring non-numeric setting");
            None
        }
    }
}
