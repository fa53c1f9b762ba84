//! Environment overrides on top of a settings file.
//!
//! Kept in its own test binary: it mutates process-wide `SLA_*` variables.

use std::io::Write;

use sla_core::{Settings, SettingsError};
use tempfile::NamedTempFile;

#[test]
fn env_overrides_file_and_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"
notifiers = ["log"]

[prometheus]
url = "http://from-file:9090"
max_concurrent_queries = 2
"#,
    )
    .unwrap();

    std::env::set_var("SLA_PROMETHEUSURL", "http://from-env:9090");
    std::env::set_var("SLA_QUERYTIMEOUTMS", "1500");
    std::env::set_var("SLA_MAXCONCURRENTQUERIES", "not-a-number");
    std::env::set_var("SLA_NOTIFICATIONURL", "http://hooks:8080/sla");
    std::env::set_var("SLA_QUEUENAME", "violations");
    std::env::set_var("SLA_NOTIFIERS", "rest, rabbit");

    let settings = Settings::load(Some(file.path())).unwrap();
    assert_eq!(settings.prometheus.url, "http://from-env:9090");
    assert_eq!(settings.prometheus.query_timeout_ms, 1500);
    // unparseable number keeps the file value
    assert_eq!(settings.prometheus.max_concurrent_queries, 2);
    assert_eq!(settings.rest.url, "http://hooks:8080/sla");
    assert_eq!(settings.queue.queue_name, "violations");
    assert_eq!(settings.notifiers, vec!["rest", "rabbit"]);

    std::env::set_var("SLA_NOTIFIERS", "rest,pager");
    let err = Settings::load(None).unwrap_err();
    assert!(matches!(err, SettingsError::UnknownNotifier(name) if name == "pager"));

    for var in [
        "SLA_PROMETHEUSURL",
        "SLA_QUERYTIMEOUTMS",
        "SLA_MAXCONCURRENTQUERIES",
        "SLA_NOTIFICATIONURL",
        "SLA_QUEUENAME",
        "SLA_NOTIFIERS",
    ] {
        std::env::remove_var(var);
    }
}
