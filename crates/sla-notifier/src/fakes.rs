//! In-memory fakes for notifier seams (testing only)
//!
//! Provides `MemoryBroker`, a `BrokerConnector` that records sessions and
//! published messages, and `RecordingNotifier`, a sink returning a canned
//! outcome.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sla_model::{Agreement, AssessmentResult};

use crate::error::NotifyError;
use crate::queue::{BrokerConnector, BrokerSession, OutboundMessage, QueueSpec};
use crate::traits::{NotifyOutcome, ViolationNotifier};

// ---------------------------------------------------------------------------
// MemoryBroker
// ---------------------------------------------------------------------------

/// A message as seen by the fake broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub queue: String,
    pub message: OutboundMessage,
}

impl PublishedMessage {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.message.payload).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Default)]
struct BrokerState {
    connections: usize,
    closed: usize,
    declared: Vec<QueueSpec>,
    published: Vec<PublishedMessage>,
    unavailable: bool,
    failing_publishes: usize,
    failing_closes: bool,
}

/// In-memory broker. Clones share state, so a test can keep one handle
/// while the notifier owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse (or accept again) new connections
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().unavailable = unavailable;
    }

    /// Fail the next `count` publishes; the failing session is marked closed
    pub fn fail_next_publishes(&self, count: usize) {
        self.state.lock().unwrap().failing_publishes = count;
    }

    /// Make session close report an error (the session still ends up closed)
    pub fn fail_closes(&self, fail: bool) {
        self.state.lock().unwrap().failing_closes = fail;
    }

    pub fn connections(&self) -> usize {
        self.state.lock().unwrap().connections
    }

    pub fn closed_sessions(&self) -> usize {
        self.state.lock().unwrap().closed
    }

    pub fn declared_queues(&self) -> Vec<QueueSpec> {
        self.state.lock().unwrap().declared.clone()
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.state.lock().unwrap().published.clone()
    }
}

#[async_trait]
impl BrokerConnector for MemoryBroker {
    async fn connect(&self, queue: &QueueSpec) -> Result<Box<dyn BrokerSession>, NotifyError> {
        let mut state = self.state.lock().unwrap();
        if state.unavailable {
            return Err(NotifyError::BrokerConnect("connection refused".to_string()));
        }
        state.connections += 1;
        state.declared.push(queue.clone());
        Ok(Box::new(MemorySession {
            state: Arc::clone(&self.state),
            open: AtomicBool::new(true),
        }))
    }
}

struct MemorySession {
    state: Arc<Mutex<BrokerState>>,
    open: AtomicBool,
}

#[async_trait]
impl BrokerSession for MemorySession {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn publish(&self, queue: &str, message: &OutboundMessage) -> Result<(), NotifyError> {
        let mut state = self.state.lock().unwrap();
        if !self.is_open() {
            return Err(NotifyError::BrokerPublish("channel closed".to_string()));
        }
        if state.failing_publishes > 0 {
            state.failing_publishes -= 1;
            self.open.store(false, Ordering::SeqCst);
            return Err(NotifyError::BrokerPublish("channel error".to_string()));
        }
        state.published.push(PublishedMessage {
            queue: queue.to_string(),
            message: message.clone(),
        });
        Ok(())
    }

    async fn close(&self) -> Result<(), NotifyError> {
        self.open.store(false, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        state.closed += 1;
        if state.failing_closes {
            return Err(NotifyError::BrokerPublish("close handshake failed".to_string()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

/// Sink that records the agreements it was called for and returns a fixed
/// outcome.
#[derive(Debug)]
pub struct RecordingNotifier {
    name: &'static str,
    outcome: NotifyOutcome,
    calls: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new(name: &'static str, outcome: NotifyOutcome) -> Self {
        Self {
            name,
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Agreement ids in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ViolationNotifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn deliver(&self, agreement: &Agreement, _result: &AssessmentResult) -> NotifyOutcome {
        self.calls.lock().unwrap().push(agreement.id.clone());
        self.outcome.clone()
    }
}
