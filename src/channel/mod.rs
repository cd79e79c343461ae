//! Notification channels
//!
//! Every resource owns one [`ResourceChannel`]. Each of its actions has two
//! topics, `<resource>.<action>.confirmed` and `<resource>.<action>.failed`,
//! and every call publishes to exactly one of them.
//!
//! # Example
//!
//! ```ignore
//! use drupal_services::channel::Outcome;
//! use drupal_services::resources::UserAction;
//!
//! services.user.channel().subscribe(UserAction::Login, Outcome::Confirmed, |event| {
//!     println!("logged in: {}", event.payload["user"]["name"]);
//! });
//! ```

mod hub;

pub use hub::{Channel, SubscriptionId};

use crate::client::OutcomeSink;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Which of the two per-action topics an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Confirmed,
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        }
    }
}

/// Stable name of one (resource, action, outcome) stream
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic(String);

impl Topic {
    pub fn new(resource: &str, action: &str, outcome: Outcome) -> Self {
        Self(format!("{}.{}.{}", resource, action, outcome.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Topic {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What subscribers receive
#[derive(Debug, Clone)]
pub struct ChannelEvent {
    pub topic: Topic,
    /// Response body on success; error body or validation messages on failure
    pub payload: Value,
    pub emitted_at: DateTime<Utc>,
}

impl ChannelEvent {
    pub fn new(topic: Topic, payload: Value) -> Self {
        Self {
            topic,
            payload,
            emitted_at: Utc::now(),
        }
    }
}

/// An action a resource publishes outcomes for
pub trait ChannelAction: Copy + Send + Sync + 'static {
    /// Name used in topics, e.g. `get_variable`
    fn name(self) -> &'static str;

    fn all() -> &'static [Self];
}

/// Typed channel for one resource
pub struct ResourceChannel<A> {
    resource: &'static str,
    hub: Channel,
    _action: PhantomData<fn(A)>,
}

impl<A: ChannelAction> ResourceChannel<A> {
    pub fn new(resource: &'static str) -> Self {
        Self {
            resource,
            hub: Channel::new(),
            _action: PhantomData,
        }
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }

    pub fn topic(&self, action: A, outcome: Outcome) -> Topic {
        Topic::new(self.resource, action.name(), outcome)
    }

    pub fn publish(&self, action: A, outcome: Outcome, payload: &Value) -> usize {
        let topic = self.topic(action, outcome);
        tracing::debug!(topic = %topic, "publish");
        self.hub.publish(&topic, payload)
    }

    pub fn publish_confirmed(&self, action: A, payload: &Value) -> usize {
        self.publish(action, Outcome::Confirmed, payload)
    }

    pub fn publish_failed(&self, action: A, payload: &Value) -> usize {
        self.publish(action, Outcome::Failed, payload)
    }

    pub fn subscribe<F>(&self, action: A, outcome: Outcome, callback: F) -> SubscriptionId
    where
        F: Fn(&ChannelEvent) + Send + Sync + 'static,
    {
        self.hub.subscribe(self.topic(action, outcome), callback)
    }

    /// Subscribe one callback to both topics of every action
    pub fn subscribe_all<F>(&self, callback: F) -> Vec<SubscriptionId>
    where
        F: Fn(&ChannelEvent) + Send + Sync + 'static,
    {
        let callback = Arc::new(callback);
        let mut ids = Vec::new();
        for action in A::all() {
            for outcome in [Outcome::Confirmed, Outcome::Failed] {
                let callback = Arc::clone(&callback);
                ids.push(self.subscribe(*action, outcome, move |event| callback(event)));
            }
        }
        ids
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.hub.unsubscribe(id)
    }

    pub fn subscriber_count(&self, action: A, outcome: Outcome) -> usize {
        self.hub.subscriber_count(&self.topic(action, outcome))
    }
}

/// Outcome sink publishing to the two topics of one action
pub struct ActionPublisher<A> {
    channel: Arc<ResourceChannel<A>>,
    action: A,
}

impl<A: ChannelAction> ActionPublisher<A> {
    pub fn new(channel: Arc<ResourceChannel<A>>, action: A) -> Self {
        Self { channel, action }
    }
}

impl<A: ChannelAction> OutcomeSink for ActionPublisher<A> {
    fn confirmed(&self, payload: &Value) {
        self.channel.publish_confirmed(self.action, payload);
    }

    fn failed(&self, payload: &Value) {
        self.channel.publish_failed(self.action, payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum NodeAction {
        Retrieve,
        Index,
    }

    impl ChannelAction for NodeAction {
        fn name(self) -> &'static str {
            match self {
                Self::Retrieve => "retrieve",
                Self::Index => "index",
            }
        }

        fn all() -> &'static [Self] {
            &[Self::Retrieve, Self::Index]
        }
    }

    #[test]
    fn test_topic_names() {
        let channel = ResourceChannel::<NodeAction>::new("node");
        assert_eq!(
            channel.topic(NodeAction::Retrieve, Outcome::Confirmed).as_str(),
            "node.retrieve.confirmed"
        );
        assert_eq!(
            channel.topic(NodeAction::Index, Outcome::Failed).to_string(),
            "node.index.failed"
        );
    }

    #[test]
    fn test_publisher_routes_by_outcome() {
        let channel = Arc::new(ResourceChannel::<NodeAction>::new("node"));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&seen);
        channel.subscribe_all(move |event| {
            log.lock().unwrap().push(event.topic.to_string());
        });

        let publisher = ActionPublisher::new(Arc::clone(&channel), NodeAction::Index);
        publisher.confirmed(&json!([]));
        publisher.failed(&json!({"error": "x"}));

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["node.index.confirmed".to_string(), "node.index.failed".to_string()]
        );
    }

    #[test]
    fn test_subscribe_all_covers_every_topic() {
        let channel = ResourceChannel::<NodeAction>::new("node");
        let ids = channel.subscribe_all(|_| {});
        assert_eq!(ids.len(), 4);
        assert_eq!(channel.subscriber_count(NodeAction::Retrieve, Outcome::Failed), 1);
    }
}
