//! Metric retrieval requests and canonical samples.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A monitored metric dimension.
///
/// `metric` is the raw backend query expression. Identity (`Hash`/`Eq`)
/// covers both fields, so the same variable always maps to the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub metric: String,
}

impl Variable {
    pub fn new(name: impl Into<String>, metric: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metric: metric.into(),
        }
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Closed evaluation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Window of the given length ending at `to`; `None` when the start
    /// falls outside the representable date range.
    pub fn ending_at(to: DateTime<Utc>, length: Duration) -> Option<Self> {
        let from = to.checked_sub_signed(length)?;
        Some(Self { from, to })
    }

    pub fn duration(&self) -> Duration {
        self.to - self.from
    }
}

/// One fetch request: a variable over an evaluation window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalItem {
    pub variable: Variable,
    pub window: TimeWindow,
}

impl RetrievalItem {
    pub fn new(variable: Variable, window: TimeWindow) -> Self {
        Self { variable, window }
    }
}

/// Canonical metric sample handed back to the assessment engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    /// Composite key, e.g. `execution_time{localhost:9090}`
    pub key: String,
    pub value: f64,
    pub datetime: DateTime<Utc>,
}

impl MetricValue {
    pub fn new(key: impl Into<String>, value: f64, datetime: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            value,
            datetime,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn variable_identity_is_stable_as_map_key() {
        let mut map = HashMap::new();
        map.insert(Variable::new("latency", "http_latency_seconds"), 1);
        map.insert(Variable::new("latency", "http_latency_seconds"), 2);
        map.insert(Variable::new("latency", "other_expr"), 3);

        assert_eq!(map.len(), 2);
        assert_eq!(map[&Variable::new("latency", "http_latency_seconds")], 2);
    }

    #[test]
    fn window_ending_at() {
        let to = Utc::now();
        let w = TimeWindow::ending_at(to, Duration::minutes(5)).unwrap();
        assert_eq!(w.to, to);
        assert_eq!(w.duration(), Duration::minutes(5));
    }

    #[test]
    fn window_start_out_of_range() {
        let huge = Duration::seconds(i64::MAX / 1000);
        assert!(TimeWindow::ending_at(Utc::now(), huge).is_none());
    }
}
