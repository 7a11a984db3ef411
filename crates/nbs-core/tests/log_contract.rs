//! Contract Test: Per-Decision Log Lines
//!
//! Constraints verified:
//! - Every upsert emits exactly one reconciler event, whatever the outcome
//! - The update line carries both the old and the new description
//! - Garbage collection emits one `deleted:` line per removed record

mod common;

use common::*;
use nbs_core::{Host, Reconciler};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Collects `(level, message)` for every event the reconciler emits
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<(Level, String)>>>);

impl Captured {
    fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().iter().map(|(_, m)| m.clone()).collect()
    }

    fn levels(&self) -> Vec<Level> {
        self.0.lock().unwrap().iter().map(|(l, _)| *l).collect()
    }

    fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}

impl<S: Subscriber> Layer<S> for Captured {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if !event.metadata().target().starts_with("nbs_core::reconciler") {
            return;
        }
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.0
            .lock()
            .unwrap()
            .push((*event.metadata().level(), visitor.0));
    }
}

/// Install a capturing subscriber for the current thread
fn capture() -> (Captured, tracing::subscriber::DefaultGuard) {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::registry().with(captured.clone());
    let guard = tracing::subscriber::set_default(subscriber);
    (captured, guard)
}

#[tokio::test]
async fn created_host_logs_one_line() {
    let (log, _guard) = capture();
    let store = CountingStore::new();
    let reconciler = Reconciler::new(Box::new(store), gateway_and_dns(), TAG, false);

    reconciler
        .upsert(&Host::new("10.0.0.1", "Gateway"))
        .await
        .unwrap();

    let lines = log.lines();
    assert_eq!(lines.len(), 1, "{:?}", lines);
    assert!(lines[0].starts_with("created: 10.0.0.1/32 \"Gateway\""));
}

#[tokio::test]
async fn unchanged_and_untagged_hosts_log_one_line_each() {
    let (log, _guard) = capture();
    let store = CountingStore::new();
    store.records().insert("10.0.0.1", "Gateway", [TAG]).await;
    store.records().insert("10.0.0.2", "Manual", ["manual"]).await;
    let reconciler = Reconciler::new(Box::new(store), gateway_and_dns(), TAG, false);

    reconciler
        .upsert(&Host::new("10.0.0.1", "Gateway"))
        .await
        .unwrap();
    assert_eq!(log.lines(), vec!["unchanged: 10.0.0.1/32 \"Gateway\""]);

    log.clear();
    reconciler.upsert(&Host::new("10.0.0.2", "DNS")).await.unwrap();
    let lines = log.lines();
    assert_eq!(lines.len(), 1, "{:?}", lines);
    assert!(lines[0].starts_with("unchanged: 10.0.0.2/32"));
}

#[tokio::test]
async fn updated_host_logs_old_and_new_description() {
    let (log, _guard) = capture();
    let store = CountingStore::new();
    store.records().insert("10.0.0.1", "Old gateway", [TAG]).await;
    let reconciler = Reconciler::new(Box::new(store), gateway_and_dns(), TAG, false);

    reconciler
        .upsert(&Host::new("10.0.0.1", "Gateway"))
        .await
        .unwrap();

    assert_eq!(
        log.lines(),
        vec!["updated: 10.0.0.1/32 \"Old gateway\" -> \"Gateway\""]
    );
}

#[tokio::test]
async fn duplicated_host_logs_one_error_line() {
    let (log, _guard) = capture();
    let store = CountingStore::new();
    store.records().insert("10.0.0.1", "a", [TAG]).await;
    store.records().insert("10.0.0.1", "b", [TAG]).await;
    let reconciler = Reconciler::new(Box::new(store), gateway_and_dns(), TAG, false);

    let _ = reconciler.upsert(&Host::new("10.0.0.1", "Gateway")).await;

    let lines = log.lines();
    assert_eq!(lines.len(), 1, "{:?}", lines);
    assert!(lines[0].starts_with("duplicated: 10.0.0.1/32"));
    assert_eq!(log.levels(), vec![Level::ERROR]);
}

#[tokio::test]
async fn failed_create_logs_one_error_line() {
    let (log, _guard) = capture();
    let store = CountingStore::new();
    store.fail(Op::Create, "10.0.0.1");
    let reconciler = Reconciler::new(Box::new(store), gateway_and_dns(), TAG, false);

    let _ = reconciler.upsert(&Host::new("10.0.0.1", "Gateway")).await;

    let lines = log.lines();
    assert_eq!(lines.len(), 1, "{:?}", lines);
    assert!(lines[0].starts_with("failed: 10.0.0.1/32 create"));
}

#[tokio::test]
async fn garbage_collection_logs_one_line_per_deletion() {
    let (log, _guard) = capture();
    let store = CountingStore::new();
    for i in 7..10 {
        store
            .records()
            .insert(&format!("10.0.0.{}", i), "stale", [TAG])
            .await;
    }
    let reconciler = Reconciler::new(Box::new(store), gateway_and_dns(), TAG, true);

    let stats = reconciler.garbage_collect().await;
    assert_eq!(stats.deleted, 3);

    let mut lines = log.lines();
    lines.sort();
    assert_eq!(
        lines,
        vec![
            "deleted: 10.0.0.7/32",
            "deleted: 10.0.0.8/32",
            "deleted: 10.0.0.9/32",
        ]
    );
}

#[tokio::test]
async fn sync_brackets_host_lines_with_start_and_summary() {
    let (log, _guard) = capture();
    let store = CountingStore::new();
    let reconciler = Reconciler::new(Box::new(store), gateway_and_dns(), TAG, false);

    reconciler.sync().await.unwrap();

    let lines = log.lines();
    assert_eq!(lines.len(), 4, "{:?}", lines);
    assert_eq!(lines[0], "started: 2 hosts");
    assert!(lines[1].starts_with("created: 10.0.0.1/32"));
    assert!(lines[2].starts_with("created: 10.0.0.2/32"));
    assert_eq!(lines[3], "finished: .0 +2 ~0 -0 !0");
}
