//! SLA Model: shared domain types for SLA telemetry integration
//!
//! This crate holds the entities exchanged between the assessment engine,
//! the metric retrieval adapters and the violation notifiers.
//!
//! ## Key Components
//!
//! - `Agreement`: the SLA agreement, including its monitoring URL override
//! - `Variable` / `RetrievalItem`: what to fetch and over which window
//! - `MetricValue`: the canonical metric sample returned to the engine
//! - `Violation` / `AssessmentResult`: what notifiers consume

mod agreement;
mod metric;
mod violation;

pub use agreement::{Agreement, AgreementDetails, Assessment, Client, Guarantee, Provider};
pub use metric::{MetricValue, RetrievalItem, TimeWindow, Variable};
pub use violation::{AssessmentResult, ExpressionData, GuaranteeResult, Violation};
