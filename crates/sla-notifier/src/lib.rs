//! SLA Notifier: violation notification sinks
//!
//! Every sink implements [`ViolationNotifier`]. Delivery is fire-and-forget
//! from the caller's point of view: failures are logged and reported as a
//! [`NotifyOutcome`], never raised.
//!
//! ## Sinks
//!
//! - `RestNotifier`: one JSON POST per result with violations
//! - `QueueNotifier`: one durable-queue message per violation
//! - `LogNotifier`: one warning event per violation
//! - `FanoutNotifier`: all of the above, concurrently and isolated

mod error;
pub mod fakes;
pub mod fanout;
pub mod log;
pub mod queue;
pub mod rest;
pub mod traits;

pub use error::NotifyError;
pub use fanout::FanoutNotifier;
pub use log::LogNotifier;
pub use queue::{
    AmqpConnector, BrokerConnector, BrokerSession, QueueMessage, QueueNotifier,
    QueueNotifierConfig,
};
pub use rest::{RestNotifier, RestNotifierConfig, ViolationInfo};
pub use traits::{NotifyOutcome, ViolationNotifier};
