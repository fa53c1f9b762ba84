//! Process settings: built-in defaults, an optional TOML file, then
//! `SLA_*` environment overrides, in that order of precedence.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sla_monitor::{PrometheusConfig, PrometheusRetriever};
use sla_notifier::{
    log, queue, rest, FanoutNotifier, LogNotifier, QueueNotifier, QueueNotifierConfig,
    RestNotifier, RestNotifierConfig,
};
use tracing::{debug, Level};

use crate::error::SettingsError;

/// Sink names accepted in `notifiers`
pub const KNOWN_NOTIFIERS: [&str; 3] = [rest::NAME, queue::NAME, log::NAME];

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Verbosity used when `RUST_LOG` is not set
    pub level: String,
    /// Emit newline-delimited JSON
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LogSettings {
    pub fn level(&self) -> Result<Level, SettingsError> {
        Level::from_str(self.level.trim())
            .map_err(|_| SettingsError::InvalidLogLevel(self.level.clone()))
    }
}

/// All settings of an SLA telemetry process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Enabled violation sinks
    pub notifiers: Vec<String>,
    pub prometheus: PrometheusConfig,
    pub rest: RestNotifierConfig,
    pub queue: QueueNotifierConfig,
    pub log: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notifiers: vec![log::NAME.to_string()],
            prometheus: PrometheusConfig::default(),
            rest: RestNotifierConfig::default(),
            queue: QueueNotifierConfig::default(),
            log: LogSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from an optional file, apply env overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let settings = settings.with_env_overrides();
        settings.validate()?;
        Ok(settings)
    }

    /// Parse a TOML settings file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = toml::from_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "settings file loaded");
        Ok(settings)
    }

    /// Apply `SLA_*` variables over the current values. `SLA_NOTIFIERS` is a
    /// comma-separated sink list.
    pub fn with_env_overrides(mut self) -> Self {
        self.prometheus = self.prometheus.with_env_overrides();
        self.rest = self.rest.with_env_overrides();
        self.queue = self.queue.with_env_overrides();
        if let Ok(list) = std::env::var("SLA_NOTIFIERS") {
            self.notifiers = list
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Ok(level) = std::env::var("SLA_LOGLEVEL") {
            self.log.level = level;
        }
        self
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        for name in &self.notifiers {
            if !KNOWN_NOTIFIERS.contains(&name.as_str()) {
                return Err(SettingsError::UnknownNotifier(name.clone()));
            }
        }
        if self.notifier_enabled(rest::NAME) && !self.rest.is_enabled() {
            return Err(SettingsError::Missing("rest.url"));
        }
        if self.notifier_enabled(queue::NAME) && self.queue.broker_url.trim().is_empty() {
            return Err(SettingsError::Missing("queue.broker_url"));
        }
        self.log.level()?;
        Ok(())
    }

    pub fn notifier_enabled(&self, name: &str) -> bool {
        self.notifiers.iter().any(|n| n == name)
    }

    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Build the Prometheus retriever described by `settings`.
pub fn build_retriever(settings: &Settings) -> Result<PrometheusRetriever, SettingsError> {
    Ok(PrometheusRetriever::new(settings.prometheus.clone())?)
}

/// Build one fan-out over the enabled sinks, in `notifiers` order.
/// Duplicate names yield a single sink.
pub fn build_notifiers(settings: &Settings) -> Result<FanoutNotifier, SettingsError> {
    let mut fanout = FanoutNotifier::new();
    let mut seen: Vec<&str> = Vec::new();

    for name in &settings.notifiers {
        let name = name.as_str();
        if seen.contains(&name) {
            continue;
        }
        seen.push(name);

        match name {
            rest::NAME => fanout.push(Arc::new(RestNotifier::new(settings.rest.clone())?)),
            queue::NAME => fanout.push(Arc::new(QueueNotifier::new(settings.queue.clone()))),
            log::NAME => fanout.push(Arc::new(LogNotifier)),
            other => return Err(SettingsError::UnknownNotifier(other.to_string())),
        }
    }
    Ok(fanout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.notifiers, vec!["log"]);
        assert_eq!(settings.log.level().unwrap(), Level::INFO);
    }

    #[test]
    fn test_unknown_notifier_rejected() {
        let settings = Settings {
            notifiers: vec!["smtp".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::UnknownNotifier(name)) if name == "smtp"
        ));
    }

    #[test]
    fn test_rest_requires_url() {
        let settings = Settings {
            notifiers: vec!["rest".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Missing("rest.url"))
        ));
    }

    #[test]
    fn test_invalid_log_level() {
        let mut settings = Settings::default();
        settings.log.level = "loud".to_string();
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_build_notifiers_dedups() {
        let settings = Settings {
            notifiers: vec!["log".into(), "rabbit".into(), "log".into()],
            ..Default::default()
        };
        let fanout = build_notifiers(&settings).unwrap();
        assert_eq!(fanout.sink_names(), vec!["log", "rabbit"]);
    }

    #[test]
    fn test_render_round_trips() {
        let settings = Settings::default();
        let text = settings.to_toml().unwrap();
        assert!(text.contains("[prometheus]"));
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }
}
