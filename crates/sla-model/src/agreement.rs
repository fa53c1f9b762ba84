//! Agreement entities, as stored by the repository layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metric::Variable;

/// A party of an agreement (client or provider).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
}

impl Client {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Providers share the client shape.
pub type Provider = Client;

/// A named condition over monitored variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guarantee {
    pub name: String,
    #[serde(default)]
    pub constraint: String,
}

/// Assessment bookkeeping attached to an agreement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Overrides the retriever's default monitoring backend when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_execution: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_execution: Option<DateTime<Utc>>,
}

/// Contractual details of an agreement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgreementDetails {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub provider: Provider,
    #[serde(default)]
    pub client: Client,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub guarantees: Vec<Guarantee>,
}

/// An SLA agreement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Agreement {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub assessment: Assessment,
    #[serde(default)]
    pub details: AgreementDetails,
}

impl Agreement {
    pub fn new(id: impl Into<String>, name: impl Into<String>, client: Client) -> Self {
        let id = id.into();
        let name = name.into();
        Self {
            details: AgreementDetails {
                id: id.clone(),
                name: name.clone(),
                client,
                ..Default::default()
            },
            id,
            name,
            state: "started".to_string(),
            assessment: Assessment::default(),
        }
    }

    /// Set the monitoring backend override.
    pub fn with_monitoring_url(mut self, url: impl Into<String>) -> Self {
        self.assessment.monitoring_url = Some(url.into());
        self
    }

    /// The monitoring backend override, if any. Blank values count as unset.
    pub fn monitoring_url(&self) -> Option<&str> {
        self.assessment
            .monitoring_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn client(&self) -> &Client {
        &self.details.client
    }

    /// Look up a declared variable by name.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.details.variables.iter().find(|v| v.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitoring_url_blank_is_unset() {
        let a = Agreement::new("a01", "test", Client::new("c01", "client"));
        assert_eq!(a.monitoring_url(), None);

        let a = a.with_monitoring_url("   ");
        assert_eq!(a.monitoring_url(), None);

        let a = a.with_monitoring_url("http://localhost:8080");
        assert_eq!(a.monitoring_url(), Some("http://localhost:8080"));
    }

    #[test]
    fn deserializes_minimal_agreement() {
        let json = r#"{
            "id": "a02",
            "name": "an-agreement",
            "details": {
                "client": {"id": "c02", "name": "A client"},
                "variables": [{"name": "execution_time", "metric": "job_execution_seconds"}],
                "guarantees": [{"name": "TestGuarantee", "constraint": "execution_time < 100"}]
            }
        }"#;
        let a: Agreement = serde_json::from_str(json).unwrap();
        assert_eq!(a.id, "a02");
        assert_eq!(a.client().name, "A client");
        assert_eq!(a.monitoring_url(), None);
        assert_eq!(
            a.variable("execution_time").map(|v| v.metric.as_str()),
            Some("job_execution_seconds")
        );
        assert!(a.variable("missing").is_none());
    }
}
