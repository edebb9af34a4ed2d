//! Realtime providers.

use std::collections::HashMap;

use futures::StreamExt;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, warn};

use crate::provider::{RealtimeProvider, ValueStream};

/// Default buffered messages per channel in [`BroadcastRealtimeProvider`].
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Realtime provider whose streams never emit.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRealtimeProvider;

impl RealtimeProvider for NoopRealtimeProvider {
    fn subscribe(&self, _channel: &str) -> ValueStream {
        Box::pin(futures::stream::pending())
    }
}

struct Channel {
    sender: broadcast::Sender<Value>,
    subscribers: usize,
}

/// In-process publish/subscribe hub keyed by channel name.
///
/// Subscribers that fall behind skip the messages they missed.
#[derive(Debug)]
pub struct BroadcastRealtimeProvider {
    channels: Mutex<HashMap<String, Channel>>,
    capacity: usize,
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("subscribers", &self.subscribers)
            .finish_non_exhaustive()
    }
}

impl Default for BroadcastRealtimeProvider {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl BroadcastRealtimeProvider {
    /// Create a hub with the default per-channel capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hub buffering up to `capacity` messages per channel.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Publish `value` on `channel`. Returns the number of receivers.
    pub fn publish(&self, channel: &str, value: Value) -> usize {
        let channels = self.channels.lock();
        match channels.get(channel) {
            Some(entry) => entry.sender.send(value).unwrap_or(0),
            None => {
                debug!(channel, "publish on channel without subscribers");
                0
            }
        }
    }

    /// Active subscriptions on `channel`.
    #[must_use]
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels.lock().get(channel).map_or(0, |c| c.subscribers)
    }

    /// Names of channels with at least one subscriber.
    #[must_use]
    pub fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

impl RealtimeProvider for BroadcastRealtimeProvider {
    fn subscribe(&self, channel: &str) -> ValueStream {
        let receiver = {
            let mut channels = self.channels.lock();
            let entry = channels.entry(channel.to_string()).or_insert_with(|| Channel {
                sender: broadcast::channel(self.capacity).0,
                subscribers: 0,
            });
            entry.subscribers += 1;
            entry.sender.subscribe()
        };
        debug!(channel, "realtime subscription opened");

        let name = channel.to_string();
        let stream = BroadcastStream::new(receiver).filter_map(move |message| {
            let value = match message {
                Ok(value) => Some(value),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(channel = %name, skipped, "realtime subscriber lagged");
                    None
                }
            };
            futures::future::ready(value)
        });
        Box::pin(stream)
    }

    fn unsubscribe(&self, channel: &str) {
        let mut channels = self.channels.lock();
        if let Some(entry) = channels.get_mut(channel) {
            entry.subscribers = entry.subscribers.saturating_sub(1);
            if entry.subscribers == 0 {
                channels.remove(channel);
                debug!(channel, "last realtime subscriber left");
            }
        }
    }

    fn is_connected(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_noop_never_emits() {
        let provider = NoopRealtimeProvider;
        let mut stream = provider.subscribe("orders");

        let next = tokio::time::timeout(Duration::from_millis(20), stream.next()).await;

        assert!(next.is_err());
        assert!(!provider.is_connected());
    }

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let hub = BroadcastRealtimeProvider::new();
        let mut a = hub.subscribe("orders");
        let mut b = hub.subscribe("orders");
        let mut other = hub.subscribe("alerts");

        assert_eq!(hub.publish("orders", json!({ "id": 1 })), 2);

        assert_eq!(a.next().await, Some(json!({ "id": 1 })));
        assert_eq!(b.next().await, Some(json!({ "id": 1 })));
        let nothing = tokio::time::timeout(Duration::from_millis(20), other.next()).await;
        assert!(nothing.is_err());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let hub = BroadcastRealtimeProvider::new();
        assert_eq!(hub.publish("nobody", json!(1)), 0);
    }

    #[test]
    fn test_unsubscribe_tracks_count() {
        let hub = BroadcastRealtimeProvider::new();
        let _a = hub.subscribe("orders");
        let _b = hub.subscribe("orders");
        assert_eq!(hub.subscriber_count("orders"), 2);
        assert_eq!(hub.channels(), ["orders"]);

        hub.unsubscribe("orders");
        assert_eq!(hub.subscriber_count("orders"), 1);
        hub.unsubscribe("orders");
        assert_eq!(hub.subscriber_count("orders"), 0);
        assert!(hub.channels().is_empty());

        // Extra unsubscribes are harmless.
        hub.unsubscribe("orders");
        assert!(hub.is_connected());
    }

    #[tokio::test]
    async fn test_lagged_subscriber_skips_missed() {
        let hub = BroadcastRealtimeProvider::with_capacity(2);
        let mut stream = hub.subscribe("ticks");

        for i in 0..5 {
            hub.publish("ticks", json!(i));
        }

        assert_eq!(stream.next().await, Some(json!(3)));
        assert_eq!(stream.next().await, Some(json!(4)));
    }
}
