//! SLA Monitor: metric retrieval from Prometheus
//!
//! This crate fetches metric samples for the variables of an agreement and
//! normalizes them into the canonical [`sla_model::MetricValue`] model
//! consumed by the assessment engine.
//!
//! ## Key Components
//!
//! - `response`: typed Prometheus query API response (vector / matrix)
//! - `timestamp`: exact `seconds.fraction` decoding
//! - `translate`: pure result → `MetricValue` mapping
//! - `PrometheusRetriever`: per-item HTTP queries with failure isolation,
//!   bounded concurrency, deadline and cancellation
//! - `MetricRetriever`: the capability the engine depends on

pub mod config;
mod error;
pub mod obs;
pub mod response;
pub mod retriever;
pub mod timestamp;
pub mod translate;

pub use config::{PrometheusConfig, DEFAULT_PROMETHEUS_URL};
pub use error::{DecodeError, RetrievalError};
pub use response::{
    decode, Labels, MatrixSeries, QueryResponse, QueryResult, ResultType, Sample, VectorSeries,
};
pub use retriever::{
    query_url, ItemOutcome, ItemReport, MetricRetriever, PrometheusRetriever, RetrievalReport,
};
pub use timestamp::{decode_timestamp, timestamp_from_float_secs};
pub use translate::translate;

pub use tokio_util::sync::CancellationToken;
