use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};

use crate::error::AppError;

const TOPIC_CAPACITY: usize = 256;

/// In-process publish/subscribe keyed by topic name.
pub struct Hub {
    topics: RwLock<HashMap<String, broadcast::Sender<String>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribe to a topic, creating it on first use
    pub async fn subscribe(&self, topic: &str) -> broadcast::Receiver<String> {
        // First try to get existing
        {
            let topics = self.topics.read().await;
            if let Some(sender) = topics.get(topic) {
                return sender.subscribe();
            }
        }

        let mut topics = self.topics.write().await;
        // Double-check after acquiring write lock
        if let Some(sender) = topics.get(topic) {
            return sender.subscribe();
        }

        let (sender, receiver) = broadcast::channel(TOPIC_CAPACITY);
        topics.insert(topic.to_string(), sender);
        receiver
    }

    /// Deliver `payload` to current subscribers. Returns how many received it.
    pub async fn publish(&self, topic: &str, payload: String) -> usize {
        let delivered = {
            let topics = self.topics.read().await;
            match topics.get(topic) {
                Some(sender) => sender.send(payload).unwrap_or(0),
                None => return 0,
            }
        };

        if delivered == 0 {
            self.prune(topic).await;
        }
        delivered
    }

    pub async fn publish_json<T: Serialize>(&self, topic: &str, value: &T) -> Result<usize, AppError> {
        let payload = serde_json::to_string(value)?;
        Ok(self.publish(topic, payload).await)
    }

    /// Called once a subscriber has dropped its receiver. Removes the topic
    /// when that was the last one.
    pub async fn release(&self, topic: &str) {
        self.prune(topic).await;
    }

    /// Drop a topic nobody listens to any more
    async fn prune(&self, topic: &str) {
        let mut topics = self.topics.write().await;
        if topics
            .get(topic)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            topics.remove(topic);
        }
    }

    /// Get topic count
    pub async fn count(&self) -> usize {
        self.topics.read().await.len()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let hub = Hub::new();
        let mut first = hub.subscribe("chat/1").await;
        let mut second = hub.subscribe("chat/1").await;
        assert_eq!(hub.count().await, 1);

        assert_eq!(hub.publish("chat/1", "hello".to_string()).await, 2);
        assert_eq!(first.recv().await.unwrap(), "hello");
        assert_eq!(second.recv().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_not_an_error() {
        let hub = Hub::new();
        assert_eq!(hub.publish("notifications/users/x", "hi".to_string()).await, 0);
        assert_eq!(hub.count().await, 0);
    }

    #[tokio::test]
    async fn test_abandoned_topics_are_pruned() {
        let hub = Hub::new();
        let receiver = hub.subscribe("chat/2").await;
        drop(receiver);
        assert_eq!(hub.publish("chat/2", "gone".to_string()).await, 0);
        assert_eq!(hub.count().await, 0);
    }

    #[tokio::test]
    async fn test_release_drops_topics_without_receivers() {
        let hub = Hub::new();
        for i in 0..1000 {
            let topic = format!("notifications/users/{}", i);
            let receiver = hub.subscribe(&topic).await;
            drop(receiver);
            hub.release(&topic).await;
        }
        assert_eq!(hub.count().await, 0);
    }

    #[tokio::test]
    async fn test_release_keeps_topics_still_listened_to() {
        let hub = Hub::new();
        let first = hub.subscribe("chat/4").await;
        let mut second = hub.subscribe("chat/4").await;
        drop(first);
        hub.release("chat/4").await;
        assert_eq!(hub.count().await, 1);

        assert_eq!(hub.publish("chat/4", "still here".to_string()).await, 1);
        assert_eq!(second.recv().await.unwrap(), "still here");
    }

    #[tokio::test]
    async fn test_publish_json() {
        let hub = Hub::new();
        let mut receiver = hub.subscribe("chat/3").await;
        hub.publish_json("chat/3", &serde_json::json!({"type": "joined"}))
            .await
            .unwrap();
        assert_eq!(receiver.recv().await.unwrap(), r#"{"type":"joined"}"#);
    }
}
