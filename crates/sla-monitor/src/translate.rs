//! Mapping from decoded query results to canonical metric values.

use sla_model::MetricValue;

use crate::response::{Labels, QueryResult};

/// Translate a query result into metric values keyed `key{instance}`.
///
/// Vector results yield one value per series; matrix results yield one
/// value per sample, series first, then samples, in the order received.
///
/// Series that share an `instance` but differ in `job` or `handler` yield
/// identical keys. They are passed through as-is.
pub fn translate(result: &QueryResult, key: &str) -> Vec<MetricValue> {
    match result {
        QueryResult::Vector(series) => series
            .iter()
            .map(|s| MetricValue::new(metric_key(key, &s.labels), s.sample.value, s.sample.timestamp))
            .collect(),
        QueryResult::Matrix(series) => series
            .iter()
            .flat_map(|s| {
                let key = metric_key(key, &s.labels);
                s.samples
                    .iter()
                    .map(move |sample| MetricValue::new(key.clone(), sample.value, sample.timestamp))
            })
            .collect(),
    }
}

fn metric_key(key: &str, labels: &Labels) -> String {
    format!("{}{{{}}}", key, labels.instance())
}
