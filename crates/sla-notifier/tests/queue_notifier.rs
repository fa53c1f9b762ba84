//! Queue notifier and fan-out against in-memory fakes.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use sla_model::{Agreement, AssessmentResult, Client, Violation};
use sla_notifier::fakes::{MemoryBroker, RecordingNotifier};
use sla_notifier::{
    FanoutNotifier, LogNotifier, NotifyOutcome, QueueNotifier, QueueNotifierConfig,
    ViolationNotifier,
};

fn agreement() -> Agreement {
    Agreement::new("a03", "queue test", Client::new("c03", "client"))
}

fn result_with(count: u32) -> AssessmentResult {
    let mut result = AssessmentResult::default();
    let violations = (0..count)
        .map(|i| {
            let at = Utc.with_ymd_and_hms(2019, 10, 25, 7, i, 0).unwrap();
            Violation::new("a03", "availability", at)
        })
        .collect();
    result.add_violations("availability", violations);
    result
}

fn notifier(broker: &MemoryBroker) -> QueueNotifier<MemoryBroker> {
    QueueNotifier::with_connector(QueueNotifierConfig::default(), broker.clone())
}

#[tokio::test]
async fn one_message_per_violation() {
    let broker = MemoryBroker::new();
    let outcome = notifier(&broker).deliver(&agreement(), &result_with(3)).await;

    assert_eq!(outcome, NotifyOutcome::Delivered { violations: 3 });
    let published = broker.published();
    assert_eq!(published.len(), 3);
    assert!(published.iter().all(|m| m.queue == "Cloudbutton"));
    assert!(published.iter().all(|m| m.message.persistent));

    let body = published[1].json();
    assert_eq!(body["Application"], "a03");
    assert_eq!(body["Message"], "QoS_Violation");
    assert_eq!(body["Fields"]["Guarantee"], "availability");
    assert_eq!(body["Fields"]["ViolationTime"], "2019-10-25T07:01:00Z");

    let declared = broker.declared_queues();
    assert_eq!(declared.len(), 1);
    assert!(declared[0].durable);
}

#[tokio::test]
async fn no_violations_opens_no_connection() {
    let broker = MemoryBroker::new();
    let outcome = notifier(&broker)
        .deliver(&agreement(), &AssessmentResult::default())
        .await;

    assert_eq!(outcome, NotifyOutcome::NothingToSend);
    assert_eq!(broker.connections(), 0);
}

#[tokio::test]
async fn session_is_reused_across_calls() {
    let broker = MemoryBroker::new();
    let notifier = notifier(&broker);

    notifier.deliver(&agreement(), &result_with(2)).await;
    notifier.deliver(&agreement(), &result_with(1)).await;

    assert_eq!(broker.connections(), 1);
    assert_eq!(broker.published().len(), 3);

    notifier.shutdown().await;
    assert_eq!(broker.closed_sessions(), 1);
}

#[tokio::test]
async fn failed_publish_reconnects_for_next_message() {
    let broker = MemoryBroker::new();
    broker.fail_next_publishes(1);

    let outcome = notifier(&broker).deliver(&agreement(), &result_with(3)).await;

    match outcome {
        NotifyOutcome::Failed {
            delivered, failed, ..
        } => {
            assert_eq!(delivered, 2);
            assert_eq!(failed, 1);
        }
        other => panic!("expected partial failure, got {other:?}"),
    }
    assert_eq!(broker.connections(), 2);
    assert_eq!(broker.published().len(), 2);
}

#[tokio::test]
async fn unavailable_broker_fails_the_whole_batch() {
    let broker = MemoryBroker::new();
    broker.set_unavailable(true);
    let notifier = notifier(&broker);

    let outcome = notifier.deliver(&agreement(), &result_with(4)).await;
    assert_eq!(
        outcome,
        NotifyOutcome::Failed {
            delivered: 0,
            failed: 4,
            reason: "broker connection failed: connection refused".to_string(),
        }
    );

    broker.set_unavailable(false);
    let outcome = notifier.deliver(&agreement(), &result_with(1)).await;
    assert_eq!(outcome, NotifyOutcome::Delivered { violations: 1 });
}

#[tokio::test]
async fn fanout_isolates_failing_sinks() {
    let broker = MemoryBroker::new();
    broker.set_unavailable(true);
    let failing = Arc::new(notifier(&broker));
    let recording = Arc::new(RecordingNotifier::new(
        "recording",
        NotifyOutcome::Delivered { violations: 2 },
    ));

    let fanout = FanoutNotifier::new()
        .with_sink(failing)
        .with_sink(recording.clone())
        .with_sink(Arc::new(LogNotifier));
    assert_eq!(fanout.sink_names(), vec!["rabbit", "recording", "log"]);

    let outcomes = fanout.deliver_all(&agreement(), &result_with(2)).await;
    assert!(outcomes[0].1.is_failure());
    assert_eq!(outcomes[1].1, NotifyOutcome::Delivered { violations: 2 });
    assert_eq!(outcomes[2].1, NotifyOutcome::Delivered { violations: 2 });
    assert_eq!(recording.calls(), vec!["a03".to_string()]);

    // unit-returning entry point swallows the failure
    fanout.notify_violations(&agreement(), &result_with(2)).await;
    assert_eq!(recording.calls().len(), 2);
}
