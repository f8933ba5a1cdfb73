//! Gate saturation and event fan-out under load

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use axon_kernel::{ConcurrencyGate, EventBus, Subscriber};

/// Tracks the highest number of tasks inside the gate at once
#[derive(Default)]
struct Occupancy {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Occupancy {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_gate_bounds_concurrency_under_oversubscription() {
    const CAPACITY: usize = 2;
    const TASKS: usize = CAPACITY + 5;

    let gate = Arc::new(ConcurrencyGate::new(CAPACITY));
    let occupancy = Arc::new(Occupancy::default());
    let finished = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::with_capacity(TASKS);
    for _ in 0..TASKS {
        let gate = gate.clone();
        let occupancy = occupancy.clone();
        let finished = finished.clone();
        handles.push(tokio::spawn(async move {
            let _permit = gate.acquire().await.unwrap();
            occupancy.enter();
            tokio::time::sleep(Duration::from_millis(10)).await;
            occupancy.leave();
            finished.fetch_add(1, Ordering::SeqCst);
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    // Every task eventually ran, never more than CAPACITY at once.
    assert_eq!(finished.load(Ordering::SeqCst), TASKS);
    assert!(occupancy.peak.load(Ordering::SeqCst) <= CAPACITY);
    assert_eq!(gate.available(), CAPACITY);
}

struct RecordingSubscriber {
    name: &'static str,
    tx: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl Subscriber for RecordingSubscriber {
    fn name(&self) -> &str {
        self.name
    }

    async fn notify(&self, _topic: &str, data: &Value) -> Result<(), String> {
        let version = data["version"].to_string();
        let _ = self.tx.send(format!("{}:{}", self.name, version));
        Ok(())
    }
}

struct BrokenSubscriber;

#[async_trait]
impl Subscriber for BrokenSubscriber {
    fn name(&self) -> &str {
        "broken"
    }

    async fn notify(&self, _topic: &str, _data: &Value) -> Result<(), String> {
        Err("database connection refused".to_string())
    }
}

struct PanickingSubscriber;

#[async_trait]
impl Subscriber for PanickingSubscriber {
    fn name(&self) -> &str {
        "panicker"
    }

    async fn notify(&self, _topic: &str, _data: &Value) -> Result<(), String> {
        panic!("subscriber bug");
    }
}

#[tokio::test]
async fn test_failing_subscriber_does_not_affect_siblings() {
    let bus = EventBus::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    bus.subscribe("deploys", Arc::new(RecordingSubscriber { name: "first", tx: tx.clone() }))
        .await;
    bus.subscribe("deploys", Arc::new(BrokenSubscriber)).await;
    bus.subscribe("deploys", Arc::new(RecordingSubscriber { name: "third", tx }))
        .await;

    let delivered = bus.publish("deploys", json!({ "version": 9 })).await;
    assert_eq!(delivered, 2);

    let mut received = vec![rx.recv().await.unwrap(), rx.recv().await.unwrap()];
    received.sort();
    assert_eq!(received, vec!["first:9", "third:9"]);
}

#[tokio::test]
async fn test_panicking_subscriber_is_isolated() {
    let bus = EventBus::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    bus.subscribe("deploys", Arc::new(PanickingSubscriber)).await;
    bus.subscribe("deploys", Arc::new(RecordingSubscriber { name: "survivor", tx }))
        .await;

    let delivered = bus.publish("deploys", json!({ "version": 1 })).await;
    assert_eq!(delivered, 1);
    assert_eq!(rx.recv().await.unwrap(), "survivor:1");
}
