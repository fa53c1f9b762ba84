//! Error types for sla-core

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading settings or wiring components from them
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Settings file could not be read
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid TOML for [`Settings`](crate::Settings)
    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Settings could not be rendered as TOML
    #[error("failed to render settings: {0}")]
    Render(#[from] toml::ser::Error),

    /// A name in `notifiers` matches no known sink
    #[error("unknown notifier '{0}' (expected one of: rest, rabbit, log)")]
    UnknownNotifier(String),

    /// A setting is required by another one but unset
    #[error("missing setting: {0}")]
    Missing(&'static str),

    /// `log.level` is not a tracing level
    #[error("invalid log level '{0}'")]
    InvalidLogLevel(String),

    /// Retriever construction failed
    #[error("retriever setup failed: {0}")]
    Retriever(#[from] sla_monitor::RetrievalError),

    /// Notifier construction failed
    #[error("notifier setup failed: {0}")]
    Notifier(#[from] sla_notifier::NotifyError),
}
