//! Violations and assessment results produced by the assessment engine.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metric::MetricValue;

/// Values of the variables of one guarantee expression, keyed by variable name.
pub type ExpressionData = HashMap<String, MetricValue>;

/// A detected breach of a guarantee at a specific time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub id: String,
    pub agreement_id: String,
    pub guarantee: String,
    pub datetime: DateTime<Utc>,
    #[serde(default)]
    pub constraint: String,
    #[serde(default)]
    pub values: Vec<MetricValue>,
}

impl Violation {
    /// Create a violation with a fresh id.
    pub fn new(
        agreement_id: impl Into<String>,
        guarantee: impl Into<String>,
        datetime: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            agreement_id: agreement_id.into(),
            guarantee: guarantee.into(),
            datetime,
            constraint: String::new(),
            values: Vec::new(),
        }
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = constraint.into();
        self
    }

    pub fn with_values(mut self, values: Vec<MetricValue>) -> Self {
        self.values = values;
        self
    }
}

/// Evaluation outcome of one guarantee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuaranteeResult {
    #[serde(default)]
    pub metrics: Vec<ExpressionData>,
    #[serde(default)]
    pub violations: Vec<Violation>,
}

/// Outcome of assessing one agreement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    /// Guarantee name -> result; ordered so violations iterate deterministically
    #[serde(default)]
    pub violated: BTreeMap<String, GuaranteeResult>,
    #[serde(default)]
    pub last_values: BTreeMap<String, ExpressionData>,
}

impl AssessmentResult {
    /// Record violations for a guarantee, appending to any already present.
    pub fn add_violations(&mut self, guarantee: &str, violations: Vec<Violation>) {
        self.violated
            .entry(guarantee.to_string())
            .or_default()
            .violations
            .extend(violations);
    }

    /// All violations, guarantees in name order, violations in insertion order.
    pub fn violations(&self) -> Vec<&Violation> {
        self.violated
            .values()
            .flat_map(|gt| gt.violations.iter())
            .collect()
    }

    pub fn violation_count(&self) -> usize {
        self.violated.values().map(|gt| gt.violations.len()).sum()
    }

    pub fn has_violations(&self) -> bool {
        self.violation_count() > 0
    }

    /// Names of the guarantees with at least one violation, sorted.
    pub fn violated_guarantees(&self) -> BTreeSet<&str> {
        self.violated
            .iter()
            .filter(|(_, gt)| !gt.violations.is_empty())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_has_no_violations() {
        let r = AssessmentResult::default();
        assert!(!r.has_violations());
        assert!(r.violations().is_empty());
        assert!(r.violated_guarantees().is_empty());
    }

    #[test]
    fn violations_are_flattened_across_guarantees() {
        let now = Utc::now();
        let mut r = AssessmentResult::default();
        r.add_violations(
            "latency",
            vec![Violation::new("a01", "latency", now), Violation::new("a01", "latency", now)],
        );
        r.add_violations("availability", vec![Violation::new("a01", "availability", now)]);
        r.violated.insert("idle".to_string(), GuaranteeResult::default());

        assert_eq!(r.violation_count(), 3);
        let guarantees: Vec<&str> = r.violations().iter().map(|v| v.guarantee.as_str()).collect();
        assert_eq!(guarantees, vec!["availability", "latency", "latency"]);
        assert_eq!(
            r.violated_guarantees().into_iter().collect::<Vec<_>>(),
            vec!["availability", "latency"]
        );
    }

    #[test]
    fn violation_ids_are_unique() {
        let now = Utc::now();
        let a = Violation::new("a01", "g", now);
        let b = Violation::new("a01", "g", now);
        assert_ne!(a.id, b.id);
    }
}
