//! Topic-keyed subscriber lists

use super::{ChannelEvent, Topic};
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

type Callback = Arc<dyn Fn(&ChannelEvent) + Send + Sync>;

/// Handle returned by [`Channel::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

struct Subscription {
    id: SubscriptionId,
    callback: Callback,
}

/// Publish/subscribe hub
///
/// Delivery is synchronous and in subscription order. The subscriber map is
/// only locked while it is read or changed, never while callbacks run, so a
/// callback may itself subscribe or unsubscribe.
#[derive(Default)]
pub struct Channel {
    subscribers: RwLock<HashMap<Topic, Vec<Subscription>>>,
}

impl Channel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a subscriber to `topic`
    pub fn subscribe<F>(&self, topic: Topic, callback: F) -> SubscriptionId
    where
        F: Fn(&ChannelEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(Uuid::new_v4());
        let mut subscribers = self.subscribers.write().unwrap_or_else(PoisonError::into_inner);
        subscribers.entry(topic).or_default().push(Subscription {
            id,
            callback: Arc::new(callback),
        });
        id
    }

    /// Remove a subscriber; false if it was already gone
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write().unwrap_or_else(PoisonError::into_inner);
        let mut removed = false;
        subscribers.retain(|_, list| {
            let before = list.len();
            list.retain(|s| s.id != id);
            removed |= list.len() != before;
            !list.is_empty()
        });
        removed
    }

    /// Deliver `payload` to every current subscriber of `topic`
    ///
    /// A panicking subscriber is logged and skipped; later subscribers still
    /// receive the event. Returns the number of subscribers that completed.
    pub fn publish(&self, topic: &Topic, payload: &Value) -> usize {
        let callbacks: Vec<Callback> = {
            let subscribers = self.subscribers.read().unwrap_or_else(PoisonError::into_inner);
            subscribers
                .get(topic)
                .map(|list| list.iter().map(|s| Arc::clone(&s.callback)).collect())
                .unwrap_or_default()
        };

        if callbacks.is_empty() {
            tracing::trace!(topic = %topic, "no subscribers");
            return 0;
        }

        let event = ChannelEvent::new(topic.clone(), payload.clone());
        let mut delivered = 0;
        for callback in callbacks {
            match catch_unwind(AssertUnwindSafe(|| callback(&event))) {
                Ok(()) => delivered += 1,
                Err(_) => tracing::warn!(topic = %topic, "subscriber panicked, continuing delivery"),
            }
        }
        delivered
    }

    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn topic(name: &str) -> Topic {
        Topic::from(name)
    }

    #[test]
    fn test_publish_in_subscription_order() {
        let channel = Channel::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            channel.subscribe(topic("user.login.confirmed"), move |event| {
                seen.lock().unwrap().push((label, event.payload.clone()));
            });
        }

        let delivered = channel.publish(&topic("user.login.confirmed"), &json!({"uid": 1}));

        assert_eq!(delivered, 3);
        let seen = seen.lock().unwrap();
        let labels: Vec<&str> = seen.iter().map(|(label, _)| *label).collect();
        assert_eq!(labels, vec!["first", "second", "third"]);
        assert_eq!(seen[0].1, json!({"uid": 1}));
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let channel = Channel::new();
        assert_eq!(channel.publish(&topic("views.retrieve.failed"), &json!(null)), 0);
    }

    #[test]
    fn test_topics_are_isolated() {
        let channel = Channel::new();
        let hits = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&hits);
        channel.subscribe(topic("system.connect.confirmed"), move |_| {
            *counter.lock().unwrap() += 1;
        });

        channel.publish(&topic("system.connect.failed"), &json!({}));
        assert_eq!(*hits.lock().unwrap(), 0);
    }

    #[test]
    fn test_panicking_subscriber_does_not_block_delivery() {
        let channel = Channel::new();
        let reached = Arc::new(Mutex::new(false));

        channel.subscribe(topic("system.connect.failed"), |_| panic!("subscriber bug"));
        let flag = Arc::clone(&reached);
        channel.subscribe(topic("system.connect.failed"), move |_| {
            *flag.lock().unwrap() = true;
        });

        let delivered = channel.publish(&topic("system.connect.failed"), &json!(["boom"]));

        assert_eq!(delivered, 1);
        assert!(*reached.lock().unwrap());
    }

    #[test]
    fn test_unsubscribe() {
        let channel = Channel::new();
        let id = channel.subscribe(topic("user.token.confirmed"), |_| {});
        assert_eq!(channel.subscriber_count(&topic("user.token.confirmed")), 1);

        assert!(channel.unsubscribe(id));
        assert!(!channel.unsubscribe(id));
        assert_eq!(channel.subscriber_count(&topic("user.token.confirmed")), 0);
    }

    #[test]
    fn test_subscriber_may_subscribe_during_publish() {
        let channel = Arc::new(Channel::new());
        let inner = Arc::clone(&channel);
        channel.subscribe(topic("views.retrieve.confirmed"), move |_| {
            inner.subscribe(topic("views.retrieve.failed"), |_| {});
        });

        channel.publish(&topic("views.retrieve.confirmed"), &json!([]));
        assert_eq!(channel.subscriber_count(&topic("views.retrieve.failed")), 1);
    }
}
