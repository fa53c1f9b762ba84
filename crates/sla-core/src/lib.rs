//! SLA Core: settings and wiring for the SLA telemetry integration layer
//!
//! Loads [`Settings`], installs the tracing subscriber and builds the
//! Prometheus retriever and the configured violation notifiers. The
//! component crates are re-exported for binaries.

mod error;
pub mod settings;
pub mod telemetry;

pub use error::SettingsError;
pub use settings::{build_notifiers, build_retriever, LogSettings, Settings, KNOWN_NOTIFIERS};
pub use telemetry::init_tracing;

pub use sla_model as model;
pub use sla_monitor as monitor;
pub use sla_notifier as notifier;
