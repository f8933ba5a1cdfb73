//! Topic event bus
//!
//! Scatter/gather fan-out: publish runs every subscriber for a topic on its
//! own task and waits for all of them to settle. A subscriber failing or
//! panicking never touches its siblings or the publisher.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// A party interested in events on a topic
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Name used when logging delivery failures
    fn name(&self) -> &str;

    async fn notify(&self, topic: &str, data: &Value) -> std::result::Result<(), String>;
}

/// Append-only topic registry with isolated fan-out
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<String, Vec<Arc<dyn Subscriber>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self, topic: impl Into<String>, subscriber: Arc<dyn Subscriber>) {
        let topic = topic.into();
        debug!("subscriber '{}' joined topic '{}'", subscriber.name(), topic);
        self.subscribers
            .write()
            .await
            .entry(topic)
            .or_default()
            .push(subscriber);
    }

    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.subscribers
            .read()
            .await
            .get(topic)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Deliver to every subscriber of the topic; returns the number of
    /// successful deliveries. A topic nobody listens to delivers zero.
    pub async fn publish(&self, topic: &str, data: Value) -> usize {
        let subscribers = match self.subscribers.read().await.get(topic) {
            Some(subs) => subs.clone(),
            None => {
                debug!("event on '{}' had no subscribers", topic);
                return 0;
            }
        };

        let mut handles = Vec::with_capacity(subscribers.len());
        for subscriber in subscribers {
            let topic = topic.to_string();
            let data = data.clone();
            handles.push(tokio::spawn(async move {
                let name = subscriber.name().to_string();
                (name, subscriber.notify(&topic, &data).await)
            }));
        }

        let mut delivered = 0;
        for handle in handles {
            match handle.await {
                Ok((_, Ok(()))) => delivered += 1,
                Ok((name, Err(reason))) => {
                    warn!("subscriber '{}' failed on '{}': {}", name, topic, reason);
                }
                Err(e) => {
                    warn!("subscriber panicked on '{}': {}", topic, e);
                }
            }
        }

        debug!("event on '{}' delivered to {} subscribers", topic, delivered);
        delivered
    }
}
