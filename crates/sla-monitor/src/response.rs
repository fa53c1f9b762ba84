//! Typed model of the Prometheus query API response.
//!
//! The wire document is decoded in two steps: [`QueryResponse`] mirrors the
//! JSON as sent, and [`QueryResponse::into_result`] turns it into a
//! [`QueryResult`] whose shape is chosen by the `resultType` tag alone.
//!
//! ```text
//! {"status": "success",
//!  "data": {"resultType": "vector",
//!           "result": [{"metric": {"__name__": "up", "instance": "localhost:9090"},
//!                       "value": [1571987564.298, "1"]}]}}
//! ```

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;

use crate::error::DecodeError;
use crate::timestamp::decode_timestamp;

/// Result shape announced by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    /// One sample per series
    Vector,
    /// Ordered samples per series
    Matrix,
}

impl ResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultType::Vector => "vector",
            ResultType::Matrix => "matrix",
        }
    }
}

impl std::fmt::Display for ResultType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultType {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vector" => Ok(ResultType::Vector),
            "matrix" => Ok(ResultType::Matrix),
            other => Err(DecodeError::UnsupportedResultType(other.to_string())),
        }
    }
}

/// Label set of a series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Labels(BTreeMap<String, String>);

impl Labels {
    pub fn get(&self, label: &str) -> Option<&str> {
        self.0.get(label).map(String::as_str)
    }

    /// `__name__`, empty when absent.
    pub fn name(&self) -> &str {
        self.get("__name__").unwrap_or_default()
    }

    pub fn instance(&self) -> &str {
        self.get("instance").unwrap_or_default()
    }

    pub fn job(&self) -> &str {
        self.get("job").unwrap_or_default()
    }

    pub fn handler(&self) -> &str {
        self.get("handler").unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Labels {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Labels(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One `[timestamp, "value"]` point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl<'de> Deserialize<'de> for Sample {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // The timestamp is kept as raw JSON text so it never passes through f64.
        let (timestamp, value): (Box<RawValue>, String) = Deserialize::deserialize(deserializer)?;

        let raw = timestamp.get().trim_matches('"');
        let timestamp = decode_timestamp(raw).map_err(D::Error::custom)?;
        let value = parse_sample_value(&value).map_err(D::Error::custom)?;

        Ok(Sample { timestamp, value })
    }
}

/// Parse a string-encoded sample value (`"862037"`, `"NaN"`, `"+Inf"`).
pub fn parse_sample_value(raw: &str) -> Result<f64, DecodeError> {
    raw.parse::<f64>()
        .map_err(|_| DecodeError::InvalidSampleValue {
            raw: raw.to_string(),
        })
}

#[derive(Debug, Deserialize)]
struct RawData {
    #[serde(rename = "resultType")]
    result_type: String,
    #[serde(default)]
    result: Vec<RawSeries>,
}

#[derive(Debug, Deserialize)]
struct RawSeries {
    #[serde(default)]
    metric: Labels,
    value: Option<Sample>,
    values: Option<Vec<Sample>>,
}

/// Query API response exactly as received.
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    pub status: String,
    #[serde(default)]
    data: Option<RawData>,
    #[serde(default, rename = "errorType")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl QueryResponse {
    /// Decode a response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Check the status and build the typed result for the announced shape.
    pub fn into_result(self) -> Result<QueryResult, DecodeError> {
        let QueryResponse {
            status,
            data,
            error_type,
            error,
            ..
        } = self;

        if status != "success" {
            return Err(DecodeError::Backend {
                error_type: error_type.unwrap_or(status),
                message: error.unwrap_or_default(),
            });
        }

        let data = data.ok_or(DecodeError::MissingData)?;
        let result_type: ResultType = data.result_type.parse()?;

        let series = data.result.into_iter().enumerate();
        match result_type {
            ResultType::Vector => series
                .map(|(index, s)| {
                    let sample = s.value.ok_or(DecodeError::MissingSamples {
                        result_type,
                        field: "value",
                        index,
                    })?;
                    Ok(VectorSeries {
                        labels: s.metric,
                        sample,
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(QueryResult::Vector),
            ResultType::Matrix => series
                .map(|(index, s)| {
                    let samples = s.values.ok_or(DecodeError::MissingSamples {
                        result_type,
                        field: "values",
                        index,
                    })?;
                    Ok(MatrixSeries {
                        labels: s.metric,
                        samples,
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(QueryResult::Matrix),
        }
    }
}

/// Decode a response body straight into a typed result.
pub fn decode(body: &[u8]) -> Result<QueryResult, DecodeError> {
    QueryResponse::from_slice(body)?.into_result()
}

/// A series of an instant vector.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSeries {
    pub labels: Labels,
    pub sample: Sample,
}

/// A series of a range matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixSeries {
    pub labels: Labels,
    pub samples: Vec<Sample>,
}

/// Decoded query result.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Vector(Vec<VectorSeries>),
    Matrix(Vec<MatrixSeries>),
}

impl QueryResult {
    pub fn result_type(&self) -> ResultType {
        match self {
            QueryResult::Vector(_) => ResultType::Vector,
            QueryResult::Matrix(_) => ResultType::Matrix,
        }
    }

    /// Number of series.
    pub fn len(&self) -> usize {
        match self {
            QueryResult::Vector(series) => series.len(),
            QueryResult::Matrix(series) => series.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of samples across all series.
    pub fn sample_count(&self) -> usize {
        match self {
            QueryResult::Vector(series) => series.len(),
            QueryResult::Matrix(series) => series.iter().map(|s| s.samples.len()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VECTOR: &str = include_str!("../tests/testdata/vector.json");
    const VECTOR2: &str = include_str!("../tests/testdata/vector2.json");
    const MATRIX: &str = include_str!("../tests/testdata/matrix.json");
    const ERROR: &str = include_str!("../tests/testdata/error.json");

    #[test]
    fn parses_vector() {
        let result = decode(VECTOR.as_bytes()).unwrap();
        assert_eq!(result.result_type(), ResultType::Vector);

        let QueryResult::Vector(series) = result else {
            panic!("expected vector");
        };
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].labels.name(), "go_memstats_frees_total");
        assert_eq!(series[0].labels.instance(), "localhost:9090");
        assert_eq!(series[0].labels.job(), "prometheus");
        assert_eq!(series[0].sample.value, 862037.0);
        assert_eq!(
            series[0].sample.timestamp.timestamp_nanos_opt(),
            Some(1_571_988_825_630_000_000)
        );
    }

    #[test]
    fn parses_vector_with_several_series() {
        let result = decode(VECTOR2.as_bytes()).unwrap();
        assert_eq!(result.result_type(), ResultType::Vector);
        assert_eq!(result.len(), 3);
        assert_eq!(result.sample_count(), 3);
    }

    #[test]
    fn parses_matrix() {
        let result = decode(MATRIX.as_bytes()).unwrap();
        let QueryResult::Matrix(series) = result else {
            panic!("expected matrix");
        };
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].labels.name(), "prometheus_http_response_size_bytes_count");
        assert_eq!(series[0].labels.handler(), "/api/v1/query");
        assert_eq!(series[0].samples.len(), 2);
        assert_eq!(series[0].samples[0].timestamp.timestamp(), 1572339600);
        assert_eq!(series[0].samples[0].value, 3.0);
        assert_eq!(series[1].samples.len(), 3);
    }

    #[test]
    fn string_timestamps_are_accepted() {
        let body = r#"{"status":"success","data":{"resultType":"vector",
            "result":[{"metric":{"instance":"a"},"value":["10.5","1"]}]}}"#;
        let QueryResult::Vector(series) = decode(body.as_bytes()).unwrap() else {
            panic!("expected vector");
        };
        assert_eq!(series[0].sample.timestamp.timestamp(), 10);
        assert_eq!(series[0].sample.timestamp.timestamp_subsec_nanos(), 500_000_000);
    }

    #[test]
    fn special_float_values_are_accepted() {
        let body = r#"{"status":"success","data":{"resultType":"matrix",
            "result":[{"metric":{},"values":[[1,"NaN"],[2,"+Inf"],[3,"-Inf"]]}]}}"#;
        let QueryResult::Matrix(series) = decode(body.as_bytes()).unwrap() else {
            panic!("expected matrix");
        };
        let values: Vec<f64> = series[0].samples.iter().map(|s| s.value).collect();
        assert!(values[0].is_nan());
        assert_eq!(values[1], f64::INFINITY);
        assert_eq!(values[2], f64::NEG_INFINITY);
    }

    #[test]
    fn non_numeric_value_is_a_decode_error() {
        let body = r#"{"status":"success","data":{"resultType":"vector",
            "result":[{"metric":{},"value":[1571988825.63,"lots"]}]}}"#;
        let err = decode(body.as_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
        assert!(err.to_string().contains("invalid sample value"));
    }

    #[test]
    fn sample_value_text_is_kept_in_the_error() {
        let err = parse_sample_value("lots").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidSampleValue { ref raw } if raw == "lots"));
        assert!(parse_sample_value("+Inf").unwrap().is_infinite());
        assert!(parse_sample_value("NaN").unwrap().is_nan());
        assert_eq!(parse_sample_value("862037").unwrap(), 862037.0);
    }

    #[test]
    fn shape_follows_the_tag_not_the_fields() {
        // vector tag with matrix-shaped series
        let body = r#"{"status":"success","data":{"resultType":"vector",
            "result":[{"metric":{},"values":[[1,"1"],[2,"2"]]}]}}"#;
        let err = decode(body.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MissingSamples {
                result_type: ResultType::Vector,
                field: "value",
                index: 0
            }
        ));

        // matrix tag with a stray single value is still read as matrix
        let body = r#"{"status":"success","data":{"resultType":"matrix",
            "result":[{"metric":{},"value":[9,"9"],"values":[[1,"1"]]}]}}"#;
        let result = decode(body.as_bytes()).unwrap();
        assert_eq!(result.result_type(), ResultType::Matrix);
        assert_eq!(result.sample_count(), 1);
    }

    #[test]
    fn unsupported_result_type() {
        let body = r#"{"status":"success","data":{"resultType":"scalar","result":[]}}"#;
        assert!(matches!(
            decode(body.as_bytes()),
            Err(DecodeError::UnsupportedResultType(t)) if t == "scalar"
        ));
    }

    #[test]
    fn backend_error_status() {
        let err = decode(ERROR.as_bytes()).unwrap_err();
        match err {
            DecodeError::Backend {
                error_type,
                message,
            } => {
                assert_eq!(error_type, "bad_data");
                assert!(message.contains("parse error"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_result_is_valid() {
        let body = r#"{"status":"success","data":{"resultType":"vector","result":[]}}"#;
        let result = decode(body.as_bytes()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(decode(b"<html>"), Err(DecodeError::Json(_))));
    }
}
