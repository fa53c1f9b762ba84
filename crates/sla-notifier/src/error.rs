//! Error types for sla-notifier

use thiserror::Error;

/// Errors raised inside a notifier. They never leave
/// [`ViolationNotifier::notify_violations`](crate::ViolationNotifier::notify_violations).
#[derive(Error, Debug)]
pub enum NotifyError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Notification endpoint answered with a non-2xx status
    #[error("notification endpoint responded with HTTP {status}")]
    Status { status: u16 },

    /// Payload serialization error
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Could not connect to the broker or declare the queue
    #[error("broker connection failed: {0}")]
    BrokerConnect(String),

    /// Could not publish a message
    #[error("broker publish failed: {0}")]
    BrokerPublish(String),

    /// Notifier is missing required configuration
    #[error("notifier not configured: {0}")]
    NotConfigured(String),
}

impl From<lapin::Error> for NotifyError {
    fn from(err: lapin::Error) -> Self {
        NotifyError::BrokerPublish(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_error_display() {
        let err = NotifyError::Status { status: 404 };
        assert!(err.to_string().contains("404"));

        let err = NotifyError::BrokerConnect("connection refused".to_string());
        assert!(err.to_string().contains("broker connection failed"));
        assert!(err.to_string().contains("connection refused"));
    }
}
